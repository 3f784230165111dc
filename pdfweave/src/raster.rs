//! Rasterization seam.
//!
//! Rendering engines (pdfium, mupdf, a test fake) live behind these
//! traits. The pipeline loads merged bytes into a [`RasterDocument`] and
//! the viewport asks it for page bitmaps; nothing else in the crate knows
//! which engine is in use.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::pipeline::CancellationToken;

/// A rendered page bitmap, RGBA8, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Bitmap width in device pixels.
    pub width: u32,
    /// Bitmap height in device pixels.
    pub height: u32,
    /// RGBA8 pixel data, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

/// Factory for raster documents.
#[async_trait]
pub trait RasterEngine: Send + Sync {
    /// Parse serialized PDF bytes into a renderable document.
    async fn load_document(&self, bytes: &[u8]) -> Result<Arc<dyn RasterDocument>>;
}

/// A loaded document that can rasterize its pages.
///
/// Engine resources are released when the last `Arc` of a document drops,
/// so installing a new document is enough to retire the old one.
#[async_trait]
pub trait RasterDocument: Send + Sync {
    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Page dimensions in css pixels at scale 1.0.
    fn page_size(&self, index: usize) -> (f32, f32);

    /// Rasterize one page at the given scale.
    ///
    /// Implementations must poll `cancel` at convenient points and return
    /// [`crate::error::PdfWeaveError::Cancelled`] once it trips; callers
    /// treat that as a normal settled outcome, not a failure.
    async fn render(
        &self,
        index: usize,
        scale: f32,
        cancel: CancellationToken,
    ) -> Result<RasterImage>;
}
