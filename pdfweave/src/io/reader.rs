//! Loading PDF sources from disk.
//!
//! Sources are held as raw bytes and parsed on every merge pass, so
//! reading is just an async file read plus naming. Parse and encryption
//! failures surface later, from the merge itself.

use std::path::Path;
use tracing::debug;

use crate::error::{PdfWeaveError, Result};
use crate::merge::NamedSource;

/// Reader that turns file paths into in-memory sources.
#[derive(Debug, Clone, Default)]
pub struct SourceReader;

impl SourceReader {
    /// Create a reader.
    pub fn new() -> Self {
        Self
    }

    /// Read a single file into a source.
    ///
    /// The source id is the full path, the display name its file name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn read_source(&self, path: &Path) -> Result<NamedSource> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            PdfWeaveError::parse(
                path.display().to_string(),
                format!("failed to read file: {}", e),
            )
        })?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unnamed.pdf")
            .to_string();

        debug!(path = %path.display(), size = bytes.len(), "read source");

        Ok(NamedSource::new(path.display().to_string(), name, bytes))
    }

    /// Read several files concurrently, failing on the first error.
    ///
    /// Results come back in argument order regardless of which read
    /// finishes first.
    pub async fn read_all(&self, paths: &[impl AsRef<Path>]) -> Result<Vec<NamedSource>> {
        futures::future::try_join_all(paths.iter().map(|path| self.read_source(path.as_ref())))
            .await
    }
}
