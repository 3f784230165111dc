//! Saving the merged document: outline encoding, overwrite protection
//! and abort-before-write on encode failures.

use std::sync::Arc;

use lopdf::Document;
use tempfile::TempDir;

use pdfweave::io::DocumentWriter;
use pdfweave::outline::{read_outline, OutlineNode};
use pdfweave::pipeline::MergePipeline;
use pdfweave::sources::SourceList;
use pdfweave::state::SharedState;
use pdfweave::PdfWeaveError;

use crate::common::{fast_config, source, FakeEngine};

async fn merged_pipeline(sources: Vec<(&str, usize)>) -> (MergePipeline<FakeEngine>, SharedState) {
    let engine = Arc::new(FakeEngine::default());
    let state = SharedState::new();
    let pipeline = MergePipeline::with_config(engine, state.clone(), fast_config());

    let mut list = SourceList::new();
    for (id, pages) in sources {
        list.add(source(id, pages));
    }
    pipeline.notify_changed(&list).unwrap().await.unwrap();

    (pipeline, state)
}

#[tokio::test]
async fn saved_file_carries_the_current_outline() {
    let (pipeline, _state) = merged_pipeline(vec![("a", 2), ("b", 3)]).await;

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("merged.pdf");
    pipeline.save_to(&path, &DocumentWriter::new()).await.unwrap();

    let saved = Document::load_mem(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(saved.page_iter().count(), 5);

    let outline = read_outline(&saved);
    assert_eq!(outline.len(), 2);
    assert_eq!(outline[0].title, "a.pdf");
    assert_eq!(outline[1].title, "b.pdf");
    assert_eq!(outline[1].target_page, 2);
}

#[tokio::test]
async fn edited_outline_is_what_gets_saved() {
    let (pipeline, state) = merged_pipeline(vec![("a", 2)]).await;

    state.mutate(|s| {
        s.outline = vec![OutlineNode::new("Renamed by hand", 1)];
    });

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("merged.pdf");
    pipeline.save_to(&path, &DocumentWriter::new()).await.unwrap();

    let saved = Document::load_mem(&std::fs::read(&path).unwrap()).unwrap();
    let outline = read_outline(&saved);
    assert_eq!(outline, vec![OutlineNode::new("Renamed by hand", 1)]);
}

#[tokio::test]
async fn save_refuses_existing_output() {
    let (pipeline, _state) = merged_pipeline(vec![("a", 1)]).await;

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("merged.pdf");
    std::fs::write(&path, b"precious").unwrap();

    let result = pipeline.save_to(&path, &DocumentWriter::new()).await;
    assert!(matches!(result, Err(PdfWeaveError::OutputExists { .. })));
    assert_eq!(std::fs::read(&path).unwrap(), b"precious");

    pipeline
        .save_to(&path, &DocumentWriter::overwriting())
        .await
        .unwrap();
    assert_ne!(std::fs::read(&path).unwrap(), b"precious");
}

#[tokio::test]
async fn encode_failure_aborts_before_touching_the_filesystem() {
    let (pipeline, state) = merged_pipeline(vec![("a", 2)]).await;

    // An outline entry past the end of the document cannot be encoded.
    state.mutate(|s| {
        s.outline = vec![OutlineNode::new("Beyond", 99)];
    });

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("merged.pdf");

    let result = pipeline.save_to(&path, &DocumentWriter::new()).await;
    assert!(matches!(result, Err(PdfWeaveError::Encode { page: 99, .. })));
    assert!(!path.exists());

    // In-memory state is untouched by the failed save.
    assert!(state.lock().merged_bytes.is_some());
    assert_eq!(state.lock().outline[0].target_page, 99);
}

#[tokio::test]
async fn save_with_nothing_merged_is_an_error() {
    let engine = Arc::new(FakeEngine::default());
    let state = SharedState::new();
    let pipeline = MergePipeline::with_config(engine, state, fast_config());

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("merged.pdf");

    let result = pipeline.save_to(&path, &DocumentWriter::new()).await;
    assert!(matches!(result, Err(PdfWeaveError::NoSourcesSelected)));
    assert!(!path.exists());
}
