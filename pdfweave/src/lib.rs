//! pdfweave - Merge PDF files with a live, navigable result.
//!
//! This library combines multiple PDF sources into a single document and
//! keeps a rendered view of the result up to date as the selection
//! changes. It provides:
//!
//! - PDF merging with per-source page offsets
//! - A bidirectional outline (bookmark) codec
//! - Combined outline resolution with synthetic per-source roots
//! - A debounced, cancellable recomputation pipeline
//! - An incremental viewport renderer over a pluggable raster engine
//!
//! # Examples
//!
//! ## One-shot merge
//!
//! ```no_run
//! use pdfweave::io::{DocumentWriter, SourceReader};
//! use pdfweave::merge::{merge_sources, resolve_outline, serialize_document};
//! use pdfweave::outline::write_outline;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = SourceReader::new();
//! let sources = reader
//!     .read_all(&[Path::new("a.pdf"), Path::new("b.pdf")])
//!     .await?;
//!
//! let mut merged = merge_sources(&sources)?;
//! let outline = resolve_outline(&merged, &sources, true);
//! write_outline(&mut merged.document, &outline)?;
//!
//! let bytes = serialize_document(&mut merged.document)?;
//! DocumentWriter::overwriting()
//!     .save(bytes, Path::new("merged.pdf"))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Live recomputation
//!
//! ```no_run
//! use pdfweave::pipeline::MergePipeline;
//! use pdfweave::sources::SourceList;
//! use pdfweave::state::SharedState;
//! use std::sync::Arc;
//!
//! # async fn example(engine: Arc<impl pdfweave::raster::RasterEngine + 'static>) {
//! let state = SharedState::new();
//! let pipeline = MergePipeline::new(engine, state.clone());
//!
//! let mut sources = SourceList::new();
//! sources.ingest("a.pdf", std::fs::read("a.pdf").unwrap());
//! pipeline.notify_changed(&sources);
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod io;
pub mod merge;
pub mod outline;
pub mod pipeline;
pub mod raster;
pub mod sources;
pub mod state;
pub mod viewport;

// Re-export commonly used types
pub use error::{PdfWeaveError, Result};
pub use merge::NamedSource;
pub use outline::OutlineNode;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
