//! Document assembly.
//!
//! [`merger`] combines parsed sources into a single document and records
//! where each source's pages landed; [`resolve`] rebuilds a combined
//! outline tree from the per-source outlines and those page offsets.

pub mod merger;
pub mod resolve;

pub use merger::{merge_sources, serialize_document, MergedDocument, NamedSource};
pub use resolve::resolve_outline;
