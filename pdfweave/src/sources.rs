//! The ordered source list.
//!
//! Holds every loaded source together with its inclusion flag. The list
//! is pure bookkeeping: the pipeline reads it, computes a selection
//! signature from it, and decides whether anything actually changed.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::merge::NamedSource;

static INGEST_SEQ: AtomicU64 = AtomicU64::new(0);

/// A source plus whether it participates in the merge.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    /// The source itself.
    pub source: NamedSource,
    /// Whether it participates in the next merge.
    pub included: bool,
}

/// Ordered collection of sources.
///
/// Order is merge order. Ids are stable across reorders and toggles, so
/// the signature changes exactly when the merged output would.
#[derive(Debug, Clone, Default)]
pub struct SourceList {
    entries: Vec<SourceEntry>,
}

impl SourceList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source, included by default. Returns its id.
    pub fn add(&mut self, source: NamedSource) -> String {
        let id = source.id.clone();
        self.entries.push(SourceEntry {
            source,
            included: true,
        });
        id
    }

    /// Build a source from raw bytes and append it.
    ///
    /// The generated id combines the name, the byte length and an
    /// ingestion sequence number, so two uploads of the same file get
    /// distinct ids.
    pub fn ingest(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> String {
        let name = name.into();
        let seq = INGEST_SEQ.fetch_add(1, Ordering::Relaxed);
        let id = format!("{}-{}-{}", name, bytes.len(), seq);
        self.add(NamedSource::new(id, name, bytes))
    }

    /// Remove a source by id. Returns whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.source.id != id);
        self.entries.len() != before
    }

    /// Flip a source's inclusion flag. Returns the new flag, or `None`
    /// for an unknown id.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let entry = self.entries.iter_mut().find(|e| e.source.id == id)?;
        entry.included = !entry.included;
        Some(entry.included)
    }

    /// Move the entry at `from` to position `to`, shifting the rest.
    pub fn reorder(&mut self, from: usize, to: usize) {
        if from >= self.entries.len() || to >= self.entries.len() || from == to {
            return;
        }
        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
    }

    /// Drop every source.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Selection signature: `"id:flag|id:flag|…"`.
    ///
    /// Two lists produce the same signature exactly when they would merge
    /// the same documents in the same order.
    pub fn signature(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}:{}", e.source.id, e.included as u8))
            .collect::<Vec<_>>()
            .join("|")
    }

    /// The included sources, in order.
    pub fn included(&self) -> Vec<NamedSource> {
        self.entries
            .iter()
            .filter(|e| e.included)
            .map(|e| e.source.clone())
            .collect()
    }

    /// Iterate entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &SourceEntry> {
        self.entries.iter()
    }

    /// Number of sources, included or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list holds no sources at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
