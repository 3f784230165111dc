//! Saving merged output to disk.
//!
//! Writes are atomic by default: bytes go to a sibling temp file that is
//! renamed over the destination, so a crash mid-write never leaves a
//! truncated PDF behind.

use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::info;

use crate::error::{PdfWeaveError, Result};

/// Options for writing output files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Write via a temp file and rename into place.
    pub atomic: bool,

    /// Replace an existing file at the destination.
    pub overwrite: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            overwrite: false,
        }
    }
}

/// Writer for merged PDF bytes.
#[derive(Debug, Clone, Default)]
pub struct DocumentWriter {
    options: WriteOptions,
}

impl DocumentWriter {
    /// Create a writer with default options.
    pub fn new() -> Self {
        Self {
            options: WriteOptions::default(),
        }
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Create a writer that replaces existing files.
    pub fn overwriting() -> Self {
        Self {
            options: WriteOptions {
                overwrite: true,
                ..Default::default()
            },
        }
    }

    /// Save bytes to a file.
    ///
    /// # Errors
    ///
    /// Returns [`PdfWeaveError::OutputExists`] when the destination exists
    /// and overwriting is off, or an IO error wrapped with the path.
    pub async fn save(&self, bytes: Vec<u8>, path: &Path) -> Result<PathBuf> {
        if !self.options.overwrite && tokio::fs::metadata(path).await.is_ok() {
            return Err(PdfWeaveError::OutputExists {
                path: path.to_path_buf(),
            });
        }

        let path_buf = path.to_path_buf();
        let options = self.options.clone();
        let size = bytes.len();

        let written = task::spawn_blocking(move || {
            let write_path = if options.atomic {
                path_buf.with_extension("pdf.tmp")
            } else {
                path_buf.clone()
            };

            let file = std::fs::File::create(&write_path).map_err(|e| {
                PdfWeaveError::FailedToCreateOutput {
                    path: write_path.clone(),
                    source: e,
                }
            })?;

            let mut writer = std::io::BufWriter::new(file);
            writer
                .write_all(&bytes)
                .and_then(|_| writer.flush())
                .map_err(|e| PdfWeaveError::FailedToWrite {
                    path: write_path.clone(),
                    source: e,
                })?;

            if options.atomic {
                std::fs::rename(&write_path, &path_buf).map_err(|e| {
                    PdfWeaveError::FailedToWrite {
                        path: path_buf.clone(),
                        source: e,
                    }
                })?;
            }

            Ok::<_, PdfWeaveError>(path_buf)
        })
        .await
        .map_err(|e| PdfWeaveError::merge_failed(format!("write task failed: {e}")))??;

        info!(path = %written.display(), size, "saved merged document");

        Ok(written)
    }
}
