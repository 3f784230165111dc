//! Debounced recomputation pipeline.
//!
//! Every change to the source list funnels through
//! [`MergePipeline::notify_changed`]. A pass sleeps through a quiet
//! period, then merges, loads the result into the raster engine, resolves
//! the combined outline and applies everything to shared state in one
//! step. Bumping the session counter is the only control signal: it both
//! supersedes passes still sleeping and cancels running ones at their
//! next checkpoint, so rapid-fire changes collapse into a single pass for
//! the final configuration.

pub mod cancel;

pub use cancel::{CancellationToken, SessionCounter, SessionToken};

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::{self, JoinHandle};
use tracing::{debug, warn};

use crate::error::{PdfWeaveError, Result};
use crate::merge::{merge_sources, resolve_outline, serialize_document, NamedSource};
use crate::raster::{RasterDocument, RasterEngine};
use crate::sources::SourceList;
use crate::state::SharedState;

/// Tuning for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Quiet period before a pass starts working.
    pub debounce: Duration,
    /// Wrap each source's outline under a synthetic bold root.
    pub source_roots: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(250),
            source_roots: true,
        }
    }
}

/// Orchestrates merge recomputation for a shared state.
pub struct MergePipeline<E> {
    engine: Arc<E>,
    state: SharedState,
    sessions: SessionCounter,
    last_signature: Arc<Mutex<Option<String>>>,
    config: PipelineConfig,
}

impl<E: RasterEngine + 'static> MergePipeline<E> {
    /// Create a pipeline with default tuning.
    pub fn new(engine: Arc<E>, state: SharedState) -> Self {
        Self::with_config(engine, state, PipelineConfig::default())
    }

    /// Create a pipeline with custom tuning.
    pub fn with_config(engine: Arc<E>, state: SharedState, config: PipelineConfig) -> Self {
        Self {
            engine,
            state,
            sessions: SessionCounter::new(),
            last_signature: Arc::new(Mutex::new(None)),
            config,
        }
    }

    /// The shared state this pipeline applies results to.
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// React to a source list change.
    ///
    /// Skips entirely when the selection signature matches the last pass
    /// scheduled; that pass is still current, whether it is sleeping,
    /// running or already applied. Otherwise supersedes any pending or
    /// running pass and schedules a fresh one; the returned handle settles
    /// when that pass has finished, been superseded, or failed.
    pub fn notify_changed(&self, sources: &SourceList) -> Option<JoinHandle<()>> {
        let signature = sources.signature();
        {
            let mut last = self.last_signature.lock();
            if last.as_deref() == Some(signature.as_str()) {
                debug!(signature, "selection unchanged, skipping pass");
                return None;
            }
            *last = Some(signature);
        }

        let token = self.sessions.next_token();
        let included = sources.included();
        let engine = Arc::clone(&self.engine);
        let state = self.state.clone();
        let config = self.config.clone();

        Some(tokio::spawn(run_pass(engine, state, token, included, config)))
    }

    /// Save the current merged document to disk.
    ///
    /// Encodes the current outline tree into the merged bytes and hands
    /// them to the writer. An encode failure aborts before anything
    /// touches the filesystem, leaving both the file and the in-memory
    /// state as they were.
    pub async fn save_to(
        &self,
        path: &std::path::Path,
        writer: &crate::io::DocumentWriter,
    ) -> Result<std::path::PathBuf> {
        let (outline, bytes) = {
            let state = self.state.lock();
            let bytes = state
                .merged_bytes
                .clone()
                .ok_or(PdfWeaveError::NoSourcesSelected)?;
            (state.outline.clone(), bytes)
        };

        let encoded = task::spawn_blocking(move || apply_outline(&bytes, &outline))
            .await
            .map_err(|e| PdfWeaveError::merge_failed(format!("encode task failed: {e}")))??;

        writer.save(encoded, path).await
    }
}

/// Write an outline tree into serialized PDF bytes.
pub fn apply_outline(bytes: &[u8], outline: &[crate::outline::OutlineNode]) -> Result<Vec<u8>> {
    let mut document = lopdf::Document::load_mem(bytes)
        .map_err(|e| PdfWeaveError::parse("merged document", e.to_string()))?;
    crate::outline::write_outline(&mut document, outline)?;
    serialize_document(&mut document)
}

async fn run_pass(
    engine: Arc<dyn RasterEngine>,
    state: SharedState,
    token: SessionToken,
    included: Vec<NamedSource>,
    config: PipelineConfig,
) {
    tokio::time::sleep(config.debounce).await;
    if !token.is_current() {
        debug!(generation = token.value(), "pass superseded during debounce");
        return;
    }

    state.mutate(|s| {
        if token.is_current() {
            s.loading_outline = true;
            s.updating = true;
        }
    });

    if included.is_empty() {
        if token.is_current() {
            state.mutate(|s| {
                s.outline.clear();
                s.merged_bytes = None;
                s.document = None;
                s.loading_outline = false;
                s.updating = false;
                s.merge_failed = false;
                s.current_page = 0;
            });
        }
        return;
    }

    match run_stages(&engine, &state, &token, included, &config).await {
        Ok(()) => {}
        Err(e) if e.is_cancellation() => {
            debug!(generation = token.value(), "pass cancelled");
        }
        Err(e) => {
            warn!(error = %e, "merge pass failed");
            if token.is_current() {
                state.mutate(|s| {
                    s.merge_failed = true;
                    s.loading_outline = false;
                    s.updating = false;
                });
            }
        }
    }
}

async fn run_stages(
    engine: &Arc<dyn RasterEngine>,
    state: &SharedState,
    token: &SessionToken,
    included: Vec<NamedSource>,
    config: &PipelineConfig,
) -> Result<()> {
    debug!(sources = included.len(), "stage: merging");
    let sources = included.clone();
    let (merged, bytes) = task::spawn_blocking(move || {
        let mut merged = merge_sources(&sources)?;
        let bytes = serialize_document(&mut merged.document)?;
        Ok::<_, PdfWeaveError>((merged, bytes))
    })
    .await
    .map_err(|e| PdfWeaveError::merge_failed(format!("merge task failed: {e}")))??;
    checkpoint(token)?;

    debug!(size = bytes.len(), "stage: rasterizing primary");
    let document: Arc<dyn RasterDocument> = engine.load_document(&bytes).await?;
    checkpoint(token)?;

    debug!("stage: extracting outlines");
    let outline = resolve_outline(&merged, &included, config.source_roots);
    checkpoint(token)?;

    debug!(total_pages = merged.total_pages, "stage: applying");
    state.mutate(|s| {
        if !token.is_current() {
            return;
        }
        s.outline = outline;
        s.merged_bytes = Some(Arc::from(bytes.into_boxed_slice()));
        // Installing the new handle drops the old document's last Arc.
        s.document = Some(document);
        s.current_page = s.current_page.min(merged.total_pages.saturating_sub(1));
        s.loading_outline = false;
        s.updating = false;
        s.merge_failed = false;
    });
    checkpoint(token)?;

    Ok(())
}

fn checkpoint(token: &SessionToken) -> Result<()> {
    if token.is_current() {
        Ok(())
    } else {
        Err(PdfWeaveError::Cancelled)
    }
}
