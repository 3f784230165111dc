//! Shared application state.
//!
//! [`DocState`] is the single rendered-state struct: what the merged
//! document currently is, what the outline looks like, which page is
//! centred, and the in-progress flags the pipeline maintains. It lives
//! behind a mutex inside [`SharedState`]; observers watch a revision
//! channel instead of polling the lock.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tokio::sync::watch;

use crate::outline::OutlineNode;
use crate::raster::RasterDocument;

/// A one-shot request to jump the viewport to a page.
///
/// Consumed exactly once; `seq` distinguishes a fresh request for the
/// same page from one that was already honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavRequest {
    /// Target page, zero-based.
    pub page: usize,
    /// Monotonic request number.
    pub seq: u64,
}

/// The rendered state of the application.
#[derive(Default)]
pub struct DocState {
    /// Combined outline of the current merge.
    pub outline: Vec<OutlineNode>,
    /// Serialized merged document, ready to save.
    pub merged_bytes: Option<Arc<[u8]>>,
    /// Engine handle for the merged document.
    pub document: Option<Arc<dyn RasterDocument>>,
    /// A pass is recomputing the outline.
    pub loading_outline: bool,
    /// A pass is rebuilding the document.
    pub updating: bool,
    /// The last completed pass failed. Sticky until a pass succeeds.
    pub merge_failed: bool,
    /// Page currently closest to the viewport centre.
    pub current_page: usize,
    /// Pending jump, if any.
    pub nav_request: Option<NavRequest>,
    nav_seq: u64,
}

impl DocState {
    /// Queue a jump to `page`, replacing any pending one.
    pub fn request_nav(&mut self, page: usize) {
        self.nav_seq += 1;
        self.nav_request = Some(NavRequest {
            page,
            seq: self.nav_seq,
        });
    }

    /// Take the pending jump, leaving none behind.
    pub fn take_nav_request(&mut self) -> Option<NavRequest> {
        self.nav_request.take()
    }
}

/// Mutex-wrapped [`DocState`] plus a revision channel for observers.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<Mutex<DocState>>,
    revision: watch::Sender<u64>,
}

impl SharedState {
    /// Create a fresh state with no document.
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Mutex::new(DocState::default())),
            revision,
        }
    }

    /// Lock the state for reading. Mutations made through this guard do
    /// not notify observers; use [`SharedState::mutate`] for those.
    pub fn lock(&self) -> MutexGuard<'_, DocState> {
        self.inner.lock()
    }

    /// Mutate the state and bump the revision.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut DocState) -> R) -> R {
        let result = f(&mut self.inner.lock());
        self.revision.send_modify(|rev| *rev += 1);
        result
    }

    /// Subscribe to revision bumps.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
