//! Bidirectional codec between [`OutlineNode`] trees and the PDF outline
//! object graph.
//!
//! Writing replaces whatever outline the document carries with a fresh
//! graph built from the tree: one dictionary per node, doubly linked via
//! `Prev`/`Next`, nested via `First`/`Last`/`Parent`, with `Count` holding
//! the total number of descendants. Reading walks that graph back into a
//! tree, tolerating the linkage defects found in real documents (cycles,
//! dangling references, indirect destination arrays).

use crate::error::{PdfWeaveError, Result};
use crate::outline::title::{decode_title, encode_title};
use crate::outline::{node_count, OutlineNode};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use std::collections::HashSet;

/// Replace the document's outline with the given tree.
///
/// An empty tree removes the `Outlines` entry from the catalog entirely.
/// Destinations are written as `[page /XYZ null null null]` arrays; style
/// is stored in the `F` bitmask (bit 0 italic, bit 1 bold) and omitted
/// when both are off.
///
/// # Errors
///
/// Returns [`PdfWeaveError::Encode`] if any node targets a page index at
/// or beyond the document's page count.
pub fn write_outline(doc: &mut Document, nodes: &[OutlineNode]) -> Result<()> {
    let pages: Vec<ObjectId> = doc.page_iter().collect();

    if nodes.is_empty() {
        if let Ok(catalog) = doc.catalog_mut() {
            catalog.remove(b"Outlines");
        }
        return Ok(());
    }

    let root_id = doc.new_object_id();
    let (first, last, total) = write_level(doc, root_id, nodes, &pages)?;

    let mut root_dict = Dictionary::new();
    root_dict.set("Type", Object::Name(b"Outlines".to_vec()));
    root_dict.set("First", Object::Reference(first));
    root_dict.set("Last", Object::Reference(last));
    root_dict.set("Count", Object::Integer(total));
    doc.objects.insert(root_id, Object::Dictionary(root_dict));

    let catalog = doc.catalog_mut()?;
    catalog.set("Outlines", Object::Reference(root_id));

    Ok(())
}

/// Write one sibling level, returning (first id, last id, entries written
/// at this level and below).
fn write_level(
    doc: &mut Document,
    parent: ObjectId,
    nodes: &[OutlineNode],
    pages: &[ObjectId],
) -> Result<(ObjectId, ObjectId, i64)> {
    if nodes.is_empty() {
        return Err(PdfWeaveError::merge_failed(
            "outline level written with no entries",
        ));
    }

    // Allocate every sibling id up front so Prev/Next can be set in one pass.
    let ids: Vec<ObjectId> = nodes.iter().map(|_| doc.new_object_id()).collect();
    let mut total = ids.len() as i64;

    for (i, node) in nodes.iter().enumerate() {
        let page_ref = *pages.get(node.target_page).ok_or_else(|| PdfWeaveError::Encode {
            title: node.title.clone(),
            page: node.target_page,
            page_count: pages.len(),
        })?;

        let mut dict = Dictionary::new();
        dict.set("Title", title_object(&node.title));
        dict.set("Parent", Object::Reference(parent));
        dict.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(page_ref),
                Object::Name(b"XYZ".to_vec()),
                Object::Null,
                Object::Null,
                Object::Null,
            ]),
        );
        if i > 0 {
            dict.set("Prev", Object::Reference(ids[i - 1]));
        }
        if i + 1 < ids.len() {
            dict.set("Next", Object::Reference(ids[i + 1]));
        }

        let flags = node.italic as i64 | (node.bold as i64) << 1;
        if flags != 0 {
            dict.set("F", Object::Integer(flags));
        }

        if !node.children.is_empty() {
            let (first, last, below) = write_level(doc, ids[i], &node.children, pages)?;
            dict.set("First", Object::Reference(first));
            dict.set("Last", Object::Reference(last));
            dict.set("Count", Object::Integer(below));
            total += below;
        }

        doc.objects.insert(ids[i], Object::Dictionary(dict));
    }

    Ok((ids[0], ids[ids.len() - 1], total))
}

fn title_object(title: &str) -> Object {
    let bytes = encode_title(title);
    if title.is_ascii() {
        Object::String(bytes, StringFormat::Literal)
    } else {
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

/// Read the document's outline into a tree.
///
/// A missing or empty outline yields an empty vec rather than an error.
/// Entries whose destination cannot be resolved fall back to page 0, and
/// sibling cycles are broken by tracking visited ids.
pub fn read_outline(doc: &Document) -> Vec<OutlineNode> {
    let pages: Vec<ObjectId> = doc.page_iter().collect();

    let first = doc
        .catalog()
        .ok()
        .and_then(|catalog| catalog.get(b"Outlines").ok())
        .and_then(|obj| obj.as_reference().ok())
        .and_then(|root_id| doc.get_dictionary(root_id).ok())
        .and_then(|root| root.get(b"First").ok())
        .and_then(|obj| obj.as_reference().ok());

    let mut visited = HashSet::new();
    match first {
        Some(id) => read_siblings(doc, id, &pages, &mut visited),
        None => Vec::new(),
    }
}

fn read_siblings(
    doc: &Document,
    first: ObjectId,
    pages: &[ObjectId],
    visited: &mut HashSet<ObjectId>,
) -> Vec<OutlineNode> {
    let mut nodes = Vec::new();
    let mut cursor = Some(first);

    while let Some(id) = cursor {
        if !visited.insert(id) {
            break;
        }
        let Ok(dict) = doc.get_dictionary(id) else {
            break;
        };

        let title = match resolve(doc, dict.get(b"Title").ok()) {
            Some(Object::String(bytes, _)) => decode_title(bytes),
            _ => String::new(),
        };

        let target_page = destination_page(doc, dict, pages);

        let flags = match resolve(doc, dict.get(b"F").ok()) {
            Some(Object::Integer(f)) => *f,
            _ => 0,
        };

        let children = dict
            .get(b"First")
            .ok()
            .and_then(|obj| obj.as_reference().ok())
            .map(|child| read_siblings(doc, child, pages, visited))
            .unwrap_or_default();

        nodes.push(OutlineNode {
            title,
            target_page,
            italic: flags & 1 != 0,
            bold: flags & 2 != 0,
            children,
        });

        cursor = dict
            .get(b"Next")
            .ok()
            .and_then(|obj| obj.as_reference().ok());
    }

    nodes
}

/// Resolve an entry's destination to a zero-based page index.
///
/// Looks at `Dest` directly or through one level of indirection; an entry
/// without a resolvable destination maps to page 0.
fn destination_page(doc: &Document, dict: &Dictionary, pages: &[ObjectId]) -> usize {
    let dest = match resolve(doc, dict.get(b"Dest").ok()) {
        Some(Object::Array(items)) => Some(items.as_slice()),
        _ => None,
    };

    dest.and_then(|items| items.first())
        .and_then(|obj| obj.as_reference().ok())
        .and_then(|page_ref| pages.iter().position(|id| *id == page_ref))
        .unwrap_or(0)
}

/// Follow at most one reference hop.
fn resolve<'a>(doc: &'a Document, obj: Option<&'a Object>) -> Option<&'a Object> {
    match obj {
        Some(Object::Reference(id)) => doc.get_object(*id).ok(),
        other => other,
    }
}
