use pretty_assertions::assert_eq;
use sam_ir::InputEdit;

use super::{ReuseCursor, ReuseStats};
use crate::tests::{parse, sums};

fn kind(tree: &sam_ir::Tree, subtree: &sam_ir::Subtree) -> String {
    tree.language().symbol_name(subtree.symbol()).to_string()
}

#[test]
fn offers_the_largest_subtree_at_a_position() {
    let language = sums();
    let tree = parse(&language, "1+2");
    let mut cursor = ReuseCursor::new(&tree);

    let (root, start) = cursor.candidate(0).unwrap();
    assert_eq!(kind(&tree, &root), "source");
    assert_eq!(start.bytes, 0);

    let (plus, start) = cursor.candidate(1).unwrap();
    assert_eq!(kind(&tree, &plus), "+");
    assert_eq!(start.bytes, 1);
}

#[test]
fn descend_moves_to_the_first_child() {
    let language = sums();
    let tree = parse(&language, "1+2");
    let mut cursor = ReuseCursor::new(&tree);
    let mut kinds = vec![kind(&tree, &cursor.candidate(0).unwrap().0)];
    while cursor.descend() {
        kinds.push(kind(&tree, &cursor.candidate(0).unwrap().0));
    }
    assert_eq!(kinds, ["source", "_expression", "sum", "_expression", "number"]);
}

#[test]
fn nothing_is_offered_past_the_end() {
    let language = sums();
    let tree = parse(&language, "1+2");
    let mut cursor = ReuseCursor::new(&tree);
    assert!(cursor.candidate(3).is_none());
    assert!(cursor.candidate(0).is_none());
}

#[test]
fn edits_flag_touched_subtrees() {
    let language = sums();
    let tree = parse(&language, "1 + 2 + 3");
    let edited = tree.edit(&InputEdit::replace("1 + 2 + 3", 8, 9, "4"));
    let mut cursor = ReuseCursor::new(&edited);
    let (root, _) = cursor.candidate(0).unwrap();
    assert!(root.has_changes());
    let (plus, _) = cursor.candidate(2).unwrap();
    assert!(!plus.has_changes());
}

#[test]
fn reuse_rate_is_a_percentage() {
    let stats = ReuseStats {
        reused_nodes: 3,
        reused_bytes: 30,
        total_bytes: 40,
        fallback: false,
    };
    assert!((stats.reuse_rate() - 75.0).abs() < f64::EPSILON);
    assert!(ReuseStats::default().reuse_rate().abs() < f64::EPSILON);
}
