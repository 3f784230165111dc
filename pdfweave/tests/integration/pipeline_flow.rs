//! Pipeline behavior: debouncing, superseding, the signature gate and
//! sticky failure handling.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use pdfweave::merge::NamedSource;
use pdfweave::pipeline::MergePipeline;
use pdfweave::sources::SourceList;
use pdfweave::state::SharedState;

use crate::common::{fast_config, source, FakeEngine};

fn pipeline() -> (MergePipeline<FakeEngine>, Arc<FakeEngine>, SharedState) {
    let engine = Arc::new(FakeEngine::default());
    let state = SharedState::new();
    let pipeline = MergePipeline::with_config(Arc::clone(&engine), state.clone(), fast_config());
    (pipeline, engine, state)
}

fn list_of(sources: Vec<NamedSource>) -> SourceList {
    let mut list = SourceList::new();
    for s in sources {
        list.add(s);
    }
    list
}

#[tokio::test]
async fn pass_applies_document_outline_and_flags() {
    let (pipeline, engine, state) = pipeline();
    let list = list_of(vec![source("a", 3), source("b", 5)]);

    pipeline.notify_changed(&list).unwrap().await.unwrap();

    let state = state.lock();
    assert!(!state.updating);
    assert!(!state.loading_outline);
    assert!(!state.merge_failed);
    assert_eq!(state.outline.len(), 2);
    assert_eq!(state.outline[1].target_page, 3);
    assert_eq!(state.document.as_ref().unwrap().page_count(), 8);
    assert!(state.merged_bytes.is_some());
    assert_eq!(engine.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rapid_changes_collapse_into_one_pass() {
    let (pipeline, engine, _state) = pipeline();

    let mut list = list_of(vec![source("a", 2), source("b", 2)]);
    let first = pipeline.notify_changed(&list).unwrap();

    // Toggle before the quiet period elapses: the first pass must yield.
    list.toggle("b");
    let second = pipeline.notify_changed(&list).unwrap();

    first.await.unwrap();
    second.await.unwrap();

    assert_eq!(engine.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn toggle_back_within_debounce_supersedes_the_pending_pass() {
    let (pipeline, _engine, state) = pipeline();
    let mut list = list_of(vec![source("a", 2), source("b", 3)]);

    pipeline.notify_changed(&list).unwrap().await.unwrap();
    assert_eq!(state.lock().document.as_ref().unwrap().page_count(), 5);

    // Toggle off and back on before the quiet period elapses. The second
    // notify must schedule even though nothing fired in between, or the
    // pending single-source pass would win with a stale selection.
    list.toggle("b");
    let pending = pipeline.notify_changed(&list).unwrap();
    list.toggle("b");
    let restored = pipeline.notify_changed(&list).expect("toggle-back must schedule");

    pending.await.unwrap();
    restored.await.unwrap();

    assert_eq!(state.lock().document.as_ref().unwrap().page_count(), 5);
}

#[tokio::test]
async fn unchanged_signature_schedules_nothing() {
    let (pipeline, engine, _state) = pipeline();
    let list = list_of(vec![source("a", 2)]);

    pipeline.notify_changed(&list).unwrap().await.unwrap();
    assert!(pipeline.notify_changed(&list).is_none());
    assert_eq!(engine.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn toggle_round_trip_recomputes_back_to_original() {
    let (pipeline, engine, state) = pipeline();
    let mut list = list_of(vec![source("a", 2), source("b", 3)]);

    pipeline.notify_changed(&list).unwrap().await.unwrap();
    assert_eq!(state.lock().document.as_ref().unwrap().page_count(), 5);

    list.toggle("b");
    pipeline.notify_changed(&list).unwrap().await.unwrap();
    assert_eq!(state.lock().document.as_ref().unwrap().page_count(), 2);

    // Back to the original selection: the signature differs from the last
    // fired pass, so this recomputes rather than being skipped.
    list.toggle("b");
    pipeline.notify_changed(&list).unwrap().await.unwrap();
    assert_eq!(state.lock().document.as_ref().unwrap().page_count(), 5);
    assert_eq!(engine.loads.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn empty_selection_clears_everything() {
    let (pipeline, _engine, state) = pipeline();
    let mut list = list_of(vec![source("a", 2)]);

    pipeline.notify_changed(&list).unwrap().await.unwrap();
    assert!(state.lock().document.is_some());

    list.toggle("a");
    pipeline.notify_changed(&list).unwrap().await.unwrap();

    let state = state.lock();
    assert!(state.outline.is_empty());
    assert!(state.document.is_none());
    assert!(state.merged_bytes.is_none());
    assert!(!state.updating);
    assert!(!state.loading_outline);
    assert_eq!(state.current_page, 0);
}

#[tokio::test]
async fn parse_failure_is_sticky_until_a_pass_succeeds() {
    let (pipeline, _engine, state) = pipeline();

    let mut list = SourceList::new();
    list.add(NamedSource::new("bad", "bad.pdf", b"not a pdf".to_vec()));
    pipeline.notify_changed(&list).unwrap().await.unwrap();

    {
        let state = state.lock();
        assert!(state.merge_failed);
        assert!(!state.updating);
        assert!(state.document.is_none());
    }

    // A later good pass clears the sticky flag.
    list.add(source("good", 2));
    list.remove("bad");
    pipeline.notify_changed(&list).unwrap().await.unwrap();

    let state = state.lock();
    assert!(!state.merge_failed);
    assert!(state.document.is_some());
}

#[tokio::test]
async fn failed_pass_keeps_previous_document() {
    let (pipeline, _engine, state) = pipeline();

    let mut list = list_of(vec![source("a", 3)]);
    pipeline.notify_changed(&list).unwrap().await.unwrap();

    list.add(NamedSource::new("bad", "bad.pdf", b"garbage".to_vec()));
    pipeline.notify_changed(&list).unwrap().await.unwrap();

    let state = state.lock();
    assert!(state.merge_failed);
    // The last good document is still installed for the viewport.
    assert_eq!(state.document.as_ref().unwrap().page_count(), 3);
}

#[tokio::test]
async fn current_page_is_clamped_to_the_new_document() {
    let (pipeline, _engine, state) = pipeline();

    let mut list = list_of(vec![source("a", 10)]);
    pipeline.notify_changed(&list).unwrap().await.unwrap();
    state.mutate(|s| s.current_page = 9);

    list.toggle("a");
    list.add(source("b", 2));
    pipeline.notify_changed(&list).unwrap().await.unwrap();

    assert_eq!(state.lock().current_page, 1);
}
