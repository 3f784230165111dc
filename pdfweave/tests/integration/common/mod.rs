//! Shared helpers for integration tests.
//!
//! PDFs are built in memory with lopdf rather than loaded from fixture
//! files, so every test carries its own inputs. The fake engine parses
//! whatever bytes the pipeline hands it, which keeps the engine seam
//! honest without a real rasterizer.

use async_trait::async_trait;
use lopdf::{dictionary, Document, Object};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pdfweave::merge::{serialize_document, NamedSource};
use pdfweave::outline::{write_outline, OutlineNode};
use pdfweave::pipeline::{CancellationToken, PipelineConfig};
use pdfweave::raster::{RasterDocument, RasterEngine, RasterImage};
use pdfweave::{PdfWeaveError, Result};

/// Build a minimal valid document with the given number of pages.
pub fn document_with_pages(page_count: usize) -> Document {
    let mut doc = Document::with_version("1.4");

    let catalog_id = doc.new_object_id();
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for _ in 0..page_count {
        let page_id = doc.new_object_id();
        let page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(page_id, page.into());
        page_ids.push(page_id);
    }

    let catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => page_ids.into_iter().map(|id| id.into()).collect::<Vec<Object>>(),
        "Count" => page_count as i64,
    };

    doc.objects.insert(catalog_id, catalog.into());
    doc.objects.insert(pages_id, pages_dict.into());
    doc.trailer.set("Root", catalog_id);

    doc
}

/// Serialized bytes of a document with `page_count` pages.
pub fn pdf_bytes(page_count: usize) -> Vec<u8> {
    let mut doc = document_with_pages(page_count);
    serialize_document(&mut doc).unwrap()
}

/// Serialized bytes of a document carrying an outline.
pub fn pdf_bytes_with_outline(page_count: usize, outline: &[OutlineNode]) -> Vec<u8> {
    let mut doc = document_with_pages(page_count);
    write_outline(&mut doc, outline).unwrap();
    serialize_document(&mut doc).unwrap()
}

/// A source named `{id}.pdf` with `page_count` blank pages.
pub fn source(id: &str, page_count: usize) -> NamedSource {
    NamedSource::new(id, format!("{id}.pdf"), pdf_bytes(page_count))
}

/// Pipeline tuning with a debounce short enough for tests.
pub fn fast_config() -> PipelineConfig {
    PipelineConfig {
        debounce: Duration::from_millis(10),
        source_roots: true,
    }
}

/// Engine that parses the merged bytes with lopdf and renders solid
/// bitmaps. Counts loads so tests can assert how many passes completed.
#[derive(Default)]
pub struct FakeEngine {
    pub loads: AtomicUsize,
}

#[async_trait]
impl RasterEngine for FakeEngine {
    async fn load_document(&self, bytes: &[u8]) -> Result<Arc<dyn RasterDocument>> {
        let document = Document::load_mem(bytes)
            .map_err(|e| PdfWeaveError::parse("merged document", e.to_string()))?;
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeRasterDocument {
            page_count: document.page_iter().count(),
        }))
    }
}

pub struct FakeRasterDocument {
    page_count: usize,
}

#[async_trait]
impl RasterDocument for FakeRasterDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_size(&self, _index: usize) -> (f32, f32) {
        (612.0, 792.0)
    }

    async fn render(
        &self,
        _index: usize,
        scale: f32,
        cancel: CancellationToken,
    ) -> Result<RasterImage> {
        if cancel.is_cancelled() {
            return Err(PdfWeaveError::Cancelled);
        }
        let width = (612.0 * scale) as u32;
        let height = (792.0 * scale) as u32;
        Ok(RasterImage {
            width,
            height,
            pixels: vec![0xFF; (width * height * 4) as usize],
        })
    }
}
