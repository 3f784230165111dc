//! Combined outline resolution.
//!
//! After a merge, each source's outline still targets its own page
//! numbering. Resolution shifts every tree by its source's page offset
//! and, by default, nests it under a synthetic bold root titled with the
//! source name and pointing at the source's first page.

use crate::merge::merger::{MergedDocument, NamedSource};
use crate::outline::OutlineNode;

/// Build the combined outline for a merged document.
///
/// `source_roots` controls whether each source gets a synthetic root
/// entry; when false the offset trees are concatenated directly, which
/// loses the grouping for sources that had no outline of their own.
pub fn resolve_outline(
    merged: &MergedDocument,
    sources: &[NamedSource],
    source_roots: bool,
) -> Vec<OutlineNode> {
    let mut combined = Vec::new();

    for (i, source) in sources.iter().enumerate() {
        let offset = merged.page_offsets[i];
        let mut tree = merged.source_outlines[i].clone();
        for node in &mut tree {
            node.offset_pages(offset);
        }

        if source_roots {
            combined.push(OutlineNode {
                title: source.name.clone(),
                target_page: offset,
                bold: true,
                italic: false,
                children: tree,
            });
        } else {
            combined.extend(tree);
        }
    }

    combined
}
