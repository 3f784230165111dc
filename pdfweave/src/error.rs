//! Error types for pdfweave.
//!
//! One enum covers the whole crate. The taxonomy follows the failure
//! surfaces of the merge/preview flow:
//!
//! - **Parse errors**: a source cannot be read as a PDF (merge pass aborted,
//!   previous state retained by the pipeline).
//! - **Encode errors**: outline/page mismatch while writing bookmarks
//!   (save aborted, document left unmodified).
//! - **Cancellation**: never user-visible; filtered at the earliest
//!   session checkpoint.
//! - **Rasterization errors**: reported per page surface, other pages
//!   unaffected.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pdfweave operations.
pub type Result<T> = std::result::Result<T, PdfWeaveError>;

/// Main error type for pdfweave operations.
#[derive(Debug, Error)]
pub enum PdfWeaveError {
    /// A source could not be parsed as a PDF.
    #[error("Failed to parse PDF '{name}': {reason}")]
    Parse {
        /// Display name of the offending source.
        name: String,
        /// Reason reported by the document model library.
        reason: String,
    },

    /// A source is encrypted. Encrypted documents are not supported.
    #[error(
        "PDF '{name}' is encrypted and cannot be processed\n  \
         Hint: decrypt it first using 'qpdf --decrypt' or similar tools"
    )]
    Encrypted {
        /// Display name of the offending source.
        name: String,
    },

    /// No sources were selected for merging.
    #[error("No input documents selected for merging")]
    NoSourcesSelected,

    /// An outline entry points past the end of the document.
    ///
    /// Raised while encoding bookmarks; the caller must keep the outline
    /// tree and the page count in sync before saving.
    #[error(
        "Outline entry '{title}' targets page {page} but the document has \
         only {page_count} page(s)"
    )]
    Encode {
        /// Title of the offending outline entry.
        title: String,
        /// 0-based page index the entry points at.
        page: usize,
        /// Number of pages actually present.
        page_count: usize,
    },

    /// Page assembly failed.
    #[error("Merge operation failed: {reason}")]
    MergeFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// The rasterization engine failed to decode a page.
    #[error("Failed to rasterize page {page}: {reason}")]
    Raster {
        /// 0-based page index.
        page: usize,
        /// Reason reported by the engine.
        reason: String,
    },

    /// An asynchronous pass was superseded by a newer session.
    ///
    /// Not a user-visible error; callers discard it silently.
    #[error("Operation cancelled")]
    Cancelled,

    /// Failed to create the output file.
    #[error("Failed to create output file: {path}\n  Reason: {source}")]
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to write to the output file.
    #[error("Failed to write to output file: {path}\n  Reason: {source}")]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Output file already exists and overwrite is not allowed.
    #[error(
        "Output file already exists: {path}\n  \
         Use --force to overwrite or choose a different output path"
    )]
    OutputExists {
        /// Path of the existing file.
        path: PathBuf,
    },

    /// Low-level error from the PDF object graph.
    #[error("PDF object graph error: {0}")]
    Document(#[from] lopdf::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<anyhow::Error> for PdfWeaveError {
    fn from(err: anyhow::Error) -> Self {
        Self::merge_failed(err.to_string())
    }
}

impl PdfWeaveError {
    /// Create a Parse error.
    pub fn parse(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a MergeFailed error.
    pub fn merge_failed(reason: impl Into<String>) -> Self {
        Self::MergeFailed {
            reason: reason.into(),
        }
    }

    /// True for the cancellation signal, which callers filter out instead
    /// of surfacing.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Parse { .. } | Self::Encrypted { .. } | Self::Document(_) => 3,
            Self::NoSourcesSelected => 1,
            Self::Encode { .. } | Self::MergeFailed { .. } | Self::Raster { .. } => 6,
            Self::OutputExists { .. } => 4,
            Self::FailedToCreateOutput { .. } | Self::FailedToWrite { .. } | Self::Io(_) => 5,
            Self::Cancelled => 130,
        }
    }
}
