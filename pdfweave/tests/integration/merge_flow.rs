//! End-to-end merge and outline resolution.

use lopdf::Document;
use rstest::rstest;

use pdfweave::merge::{merge_sources, resolve_outline, serialize_document, NamedSource};
use pdfweave::outline::{node_count, read_outline, write_outline, OutlineNode};

use crate::common::{pdf_bytes_with_outline, source};

#[rstest]
#[case(vec![3, 5, 2], vec![0, 3, 8])]
#[case(vec![1, 1, 1, 1], vec![0, 1, 2, 3])]
#[case(vec![10], vec![0])]
fn source_roots_land_on_first_pages(#[case] page_counts: Vec<usize>, #[case] expected: Vec<usize>) {
    let sources: Vec<NamedSource> = page_counts
        .iter()
        .enumerate()
        .map(|(i, &n)| source(&format!("doc{i}"), n))
        .collect();

    let merged = merge_sources(&sources).unwrap();
    assert_eq!(merged.page_offsets, expected);

    let outline = resolve_outline(&merged, &sources, true);
    let targets: Vec<usize> = outline.iter().map(|n| n.target_page).collect();
    assert_eq!(targets, expected);
    assert!(outline.iter().all(|n| n.bold));
}

#[test]
fn outline_survives_merge_and_reload() {
    let chapter_tree = vec![OutlineNode {
        title: "Chapter 1".into(),
        target_page: 0,
        bold: false,
        italic: false,
        children: vec![
            OutlineNode::new("Section 1.1", 1),
            OutlineNode::new("Section 1.2", 2),
        ],
    }];

    let sources = vec![
        source("cover", 2),
        NamedSource::new(
            "body",
            "body.pdf",
            pdf_bytes_with_outline(4, &chapter_tree),
        ),
    ];

    let mut merged = merge_sources(&sources).unwrap();
    let outline = resolve_outline(&merged, &sources, true);
    write_outline(&mut merged.document, &outline).unwrap();

    // Full round trip through serialized bytes.
    let bytes = serialize_document(&mut merged.document).unwrap();
    let reloaded = Document::load_mem(&bytes).unwrap();
    let back = read_outline(&reloaded);

    assert_eq!(back, outline);
    assert_eq!(back.len(), 2);
    assert_eq!(back[0].title, "cover.pdf");
    assert_eq!(back[1].title, "body.pdf");

    // The body's chapter got shifted past the cover's pages.
    let chapter = &back[1].children[0];
    assert_eq!(chapter.target_page, 2);
    assert_eq!(chapter.children[0].target_page, 3);
    assert_eq!(chapter.children[1].target_page, 4);

    // 2 roots + 1 chapter + 2 sections.
    assert_eq!(node_count(&back), 5);
}

#[test]
fn counts_match_descendants_in_encoded_graph() {
    let sources = vec![
        NamedSource::new(
            "a",
            "a.pdf",
            pdf_bytes_with_outline(
                3,
                &[OutlineNode {
                    title: "Top".into(),
                    target_page: 0,
                    bold: false,
                    italic: false,
                    children: vec![OutlineNode::new("Leaf", 1), OutlineNode::new("Leaf 2", 2)],
                }],
            ),
        ),
        source("b", 2),
    ];

    let mut merged = merge_sources(&sources).unwrap();
    let outline = resolve_outline(&merged, &sources, true);
    write_outline(&mut merged.document, &outline).unwrap();

    let doc = &merged.document;
    let root_id = doc
        .catalog()
        .unwrap()
        .get(b"Outlines")
        .unwrap()
        .as_reference()
        .unwrap();
    let root = doc.get_dictionary(root_id).unwrap();

    // Root count covers every entry: 2 roots + 1 container + 2 leaves.
    assert_eq!(root.get(b"Count").unwrap().as_i64().unwrap(), 5);

    // The first synthetic root holds the container and its two leaves.
    let first_id = root.get(b"First").unwrap().as_reference().unwrap();
    let first = doc.get_dictionary(first_id).unwrap();
    assert_eq!(first.get(b"Count").unwrap().as_i64().unwrap(), 3);
}

#[test]
fn merge_without_source_roots_concatenates_trees() {
    let sources = vec![
        NamedSource::new(
            "a",
            "a.pdf",
            pdf_bytes_with_outline(2, &[OutlineNode::new("From A", 1)]),
        ),
        NamedSource::new(
            "b",
            "b.pdf",
            pdf_bytes_with_outline(3, &[OutlineNode::new("From B", 0)]),
        ),
    ];

    let merged = merge_sources(&sources).unwrap();
    let outline = resolve_outline(&merged, &sources, false);

    assert_eq!(outline.len(), 2);
    assert_eq!(outline[0].title, "From A");
    assert_eq!(outline[0].target_page, 1);
    assert_eq!(outline[1].title, "From B");
    assert_eq!(outline[1].target_page, 2);
    assert!(!outline[0].bold);
}

#[test]
fn styled_and_non_ascii_entries_survive_the_full_flow() {
    let fancy = vec![OutlineNode {
        title: "Résumé — Überblick".into(),
        target_page: 0,
        bold: true,
        italic: true,
        children: Vec::new(),
    }];

    let sources = vec![NamedSource::new(
        "styled",
        "styled.pdf",
        pdf_bytes_with_outline(1, &fancy),
    )];

    let mut merged = merge_sources(&sources).unwrap();
    let outline = resolve_outline(&merged, &sources, true);
    write_outline(&mut merged.document, &outline).unwrap();

    let bytes = serialize_document(&mut merged.document).unwrap();
    let back = read_outline(&Document::load_mem(&bytes).unwrap());

    let entry = &back[0].children[0];
    assert_eq!(entry.title, "Résumé — Überblick");
    assert!(entry.bold);
    assert!(entry.italic);
}
