//! Core PDF merging implementation.
//!
//! Combines multiple in-memory PDF sources into one document by cloning
//! the first as a base and splicing the others' object graphs into it.
//! Per-source outlines and page offsets are captured along the way so the
//! combined outline can be rebuilt afterwards.

use lopdf::{Document, Object, ObjectId};
use std::sync::Arc;
use tracing::debug;

use crate::error::{PdfWeaveError, Result};
use crate::outline::{read_outline, OutlineNode};

/// One input to a merge: parsed lazily from bytes held in memory.
///
/// `id` identifies the source across recomputations (selection signatures
/// are built from it); `name` is the human-readable label used for
/// synthetic outline roots and error messages.
#[derive(Debug, Clone)]
pub struct NamedSource {
    /// Stable identity of this source.
    pub id: String,
    /// Display name, typically the original file name.
    pub name: String,
    /// Raw PDF bytes.
    pub bytes: Arc<[u8]>,
}

impl NamedSource {
    /// Create a source from identity and raw bytes.
    pub fn new(id: impl Into<String>, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Result of merging sources, before the outline is written back.
pub struct MergedDocument {
    /// The combined document. Its catalog carries no outline yet.
    pub document: Document,
    /// Zero-based index of each source's first page in the combined
    /// document, in source order.
    pub page_offsets: Vec<usize>,
    /// Total page count of the combined document.
    pub total_pages: usize,
    /// Each source's own outline, indexed per source with pages still
    /// relative to that source.
    pub source_outlines: Vec<Vec<OutlineNode>>,
}

/// Merge sources in order into a single document.
///
/// Page order follows source order. Each source's outline is decoded
/// before its objects are renumbered, so the recorded trees keep their
/// original per-source page indices.
///
/// # Errors
///
/// Returns [`PdfWeaveError::NoSourcesSelected`] for an empty slice,
/// [`PdfWeaveError::Parse`] when a source fails to parse and
/// [`PdfWeaveError::Encrypted`] for password-protected sources.
pub fn merge_sources(sources: &[NamedSource]) -> Result<MergedDocument> {
    if sources.is_empty() {
        return Err(PdfWeaveError::NoSourcesSelected);
    }

    let mut documents = Vec::with_capacity(sources.len());
    for source in sources {
        documents.push(parse_source(source)?);
    }

    let mut page_offsets = Vec::with_capacity(documents.len());
    let mut source_outlines = Vec::with_capacity(documents.len());
    let mut next_offset = 0usize;
    for doc in &documents {
        page_offsets.push(next_offset);
        next_offset += doc.page_iter().count();
        source_outlines.push(read_outline(doc));
    }
    let total_pages = next_offset;

    // First document is the base; the rest are renumbered past its ids
    // and spliced in.
    let mut iter = documents.into_iter();
    let mut merged = match iter.next() {
        Some(doc) => doc,
        None => return Err(PdfWeaveError::NoSourcesSelected),
    };
    let mut max_id = merged.max_id;

    for mut doc in iter {
        doc.renumber_objects_with(max_id + 1);
        max_id = doc.max_id;

        let doc_pages: Vec<ObjectId> = doc.page_iter().collect();
        merged.objects.extend(doc.objects);
        add_pages_to_tree(&mut merged, &doc_pages)?;
    }

    // The base's own outline is stale once pages from other sources are
    // appended; the combined outline is written separately.
    if let Ok(catalog) = merged.catalog_mut() {
        catalog.remove(b"Outlines");
    }

    merged.renumber_objects();

    debug!(
        sources = sources.len(),
        total_pages, "merged sources into combined document"
    );

    Ok(MergedDocument {
        document: merged,
        page_offsets,
        total_pages,
        source_outlines,
    })
}

/// Serialize a document to bytes.
pub fn serialize_document(document: &mut Document) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    document.save_to(&mut bytes)?;
    Ok(bytes)
}

fn parse_source(source: &NamedSource) -> Result<Document> {
    let document = Document::load_mem(&source.bytes).map_err(|e| {
        // Some protected documents fail outright at load time.
        let msg = e.to_string().to_lowercase();
        if msg.contains("crypt") || msg.contains("password") {
            PdfWeaveError::Encrypted {
                name: source.name.clone(),
            }
        } else {
            PdfWeaveError::parse(&source.name, e.to_string())
        }
    })?;

    if document.is_encrypted() {
        return Err(PdfWeaveError::Encrypted {
            name: source.name.clone(),
        });
    }

    Ok(document)
}

/// Add pages to the merged document's page tree.
fn add_pages_to_tree(merged: &mut Document, page_ids: &[ObjectId]) -> Result<()> {
    let catalog = merged
        .catalog_mut()
        .map_err(|e| PdfWeaveError::merge_failed(format!("failed to get catalog: {}", e)))?;

    let pages_id = catalog
        .get(b"Pages")
        .and_then(|p| p.as_reference())
        .map_err(|e| PdfWeaveError::merge_failed(format!("failed to get pages reference: {}", e)))?;

    let pages_dict = merged
        .get_object_mut(pages_id)
        .map_err(|e| PdfWeaveError::merge_failed(format!("failed to get pages object: {}", e)))?;

    if let Object::Dictionary(dict) = pages_dict {
        let kids = dict
            .get_mut(b"Kids")
            .map_err(|_| PdfWeaveError::merge_failed("pages dictionary missing Kids array"))?;

        if let Object::Array(kids_array) = kids {
            for &page_id in page_ids {
                kids_array.push(Object::Reference(page_id));
            }
        } else {
            return Err(PdfWeaveError::merge_failed("Kids is not an array"));
        }

        let current_count = dict.get(b"Count").and_then(|c| c.as_i64()).unwrap_or(0);
        dict.set("Count", Object::Integer(current_count + page_ids.len() as i64));
    } else {
        return Err(PdfWeaveError::merge_failed("pages object is not a dictionary"));
    }

    Ok(())
}
