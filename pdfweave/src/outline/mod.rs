//! Outline (bookmark) tree model and codec.
//!
//! An outline tree is an ordered forest of titled nodes, each pointing at
//! a target page and carrying style flags. The same type serves as the
//! editable application state and as the interchange format with a PDF's
//! native outline graph (see [`codec`]).

pub mod codec;
pub mod title;

pub use codec::{read_outline, write_outline};

use serde::{Deserialize, Serialize};

/// One entry in an outline tree.
///
/// Children order is significant: it defines bookmark navigation order and
/// sibling linkage in the encoded graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineNode {
    /// Human-readable entry title.
    pub title: String,

    /// 0-based index of the page this entry jumps to.
    ///
    /// Must be a valid index into the document the tree is attached to at
    /// the time of use; readers clamp out-of-range values to 0.
    pub target_page: usize,

    /// Bold style flag (bit 1 of the PDF `F` bitmask).
    #[serde(default)]
    pub bold: bool,

    /// Italic style flag (bit 0 of the PDF `F` bitmask).
    #[serde(default)]
    pub italic: bool,

    /// Ordered child entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    /// Create a plain (non-bold, non-italic) leaf entry.
    pub fn new(title: impl Into<String>, target_page: usize) -> Self {
        Self {
            title: title.into(),
            target_page,
            bold: false,
            italic: false,
            children: Vec::new(),
        }
    }

    /// Exact number of descendant nodes, self excluded.
    ///
    /// This is the value the codec writes into a container's `Count` field.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }

    /// Shift this node's and every descendant's target page by `offset`.
    pub fn offset_pages(&mut self, offset: usize) {
        self.target_page += offset;
        for child in &mut self.children {
            child.offset_pages(offset);
        }
    }
}

/// Total number of nodes across a forest, containers included.
pub fn node_count(nodes: &[OutlineNode]) -> usize {
    nodes.iter().map(|n| 1 + n.descendant_count()).sum()
}
