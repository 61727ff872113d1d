//! Ordering helpers for a user's selection of rows.

use crate::model::row::RowId;
use crate::model::tree::RowTree;

fn display_key(tree: &RowTree, id: RowId) -> i64 {
    tree.get(id)
        .and_then(|r| r.shadow_table_index)
        .map_or(-1, |i| i as i64)
}

/// Sort by shadow table position. Hidden or unknown rows sort first.
pub fn sorted_by_display_order(tree: &RowTree, ids: &[RowId]) -> Vec<RowId> {
    let mut sorted = ids.to_vec();
    sorted.sort_by_key(|id| display_key(tree, *id));
    sorted
}

/// Sort by shadow table position, last row first.
pub fn sorted_by_reverse_display_order(tree: &RowTree, ids: &[RowId]) -> Vec<RowId> {
    let mut sorted = sorted_by_display_order(tree, ids);
    sorted.reverse();
    sorted
}

/// Sort by display order and drop any row whose ancestor is also selected,
/// so an operation on the result touches each subtree once.
pub fn sorted_with_descendants_filtered(tree: &RowTree, ids: &[RowId]) -> Vec<RowId> {
    let sorted = sorted_by_display_order(tree, ids);
    sorted
        .iter()
        .filter(|id| !sorted.iter().any(|other| tree.is_descendant(**id, *other)))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::row::Row;
    use pretty_assertions::assert_eq;

    fn indexed(tree: &mut RowTree, topic: &str, parent: Option<RowId>, index: Option<usize>) -> RowId {
        let id = tree.append(Row::with_topic(topic), parent).unwrap();
        tree.get_mut(id).unwrap().shadow_table_index = index;
        id
    }

    #[test]
    fn test_sorted_by_display_order() {
        let mut tree = RowTree::default();
        let a = indexed(&mut tree, "a", None, Some(0));
        let b = indexed(&mut tree, "b", None, Some(1));
        let hidden = indexed(&mut tree, "hidden", None, None);

        assert_eq!(sorted_by_display_order(&tree, &[b, a, hidden]), vec![hidden, a, b]);
        assert_eq!(sorted_by_reverse_display_order(&tree, &[a, b]), vec![b, a]);
    }

    #[test]
    fn test_descendants_filtered() {
        let mut tree = RowTree::default();
        let parent = indexed(&mut tree, "parent", None, Some(0));
        let child = indexed(&mut tree, "child", Some(parent), Some(1));
        let other = indexed(&mut tree, "other", None, Some(2));

        assert_eq!(sorted_with_descendants_filtered(&tree, &[child, parent]), vec![parent]);
        assert_eq!(
            sorted_with_descendants_filtered(&tree, &[other, child, parent]),
            vec![parent, other]
        );
    }
}
