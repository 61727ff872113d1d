use std::collections::BTreeSet;

use crate::model::outline::SearchState;
use crate::model::row::RowId;
use crate::model::tree::RowTree;
use crate::visit::RowVisitorMut;

/// Rebuilds the shadow table: the rows currently visible, in display order.
///
/// Every visited row gets a fresh `shadow_table_index`, `None` when hidden.
/// A row is hidden when an ancestor is collapsed (outside of search), when
/// the completed filter hides it or an ancestor, or when a search is running
/// and it is not part of a result.
pub struct TransientDataVisitor {
    is_completed_filter_on: bool,
    search_state: SearchState,
    reload_moved_rows: bool,
    pub shadow_table: Vec<RowId>,
    /// New indices of rows whose index changed, when `reload_moved_rows` is set
    pub reloads: BTreeSet<usize>,
    adding: bool,
}

impl TransientDataVisitor {
    pub fn new(is_completed_filter_on: bool, search_state: SearchState, reload_moved_rows: bool) -> Self {
        TransientDataVisitor {
            is_completed_filter_on,
            search_state,
            reload_moved_rows,
            shadow_table: Vec::new(),
            reloads: BTreeSet::new(),
            adding: true,
        }
    }
}

impl RowVisitorMut for TransientDataVisitor {
    fn visit_row_mut(&mut self, tree: &mut RowTree, id: RowId) {
        let Some(row) = tree.get_mut(id) else {
            return;
        };

        let mut suspended_here = false;

        if self.adding {
            let should_filter = (self.is_completed_filter_on && row.is_complete)
                || (self.search_state == SearchState::Searching && !row.is_part_of_search_result);

            if should_filter {
                row.shadow_table_index = None;
            } else {
                let index = self.shadow_table.len();
                if self.reload_moved_rows && row.shadow_table_index != Some(index) {
                    self.reloads.insert(index);
                }
                row.shadow_table_index = Some(index);
                self.shadow_table.push(id);
            }

            if should_filter || (!row.is_expanded && self.search_state == SearchState::NotSearching) {
                self.adding = false;
                suspended_here = true;
            }
        } else {
            row.shadow_table_index = None;
        }

        let children = row.children.clone();
        for child in children {
            if let Some(child_row) = tree.get_mut(child) {
                child_row.parent = Some(id);
            }
            self.visit_row_mut(tree, child);
        }

        if suspended_here {
            self.adding = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::row::Row;
    use pretty_assertions::assert_eq;

    /// a
    ///   a1
    ///   a2
    /// b
    fn sample() -> (RowTree, [RowId; 4]) {
        let mut tree = RowTree::default();
        let a = tree.append(Row::with_topic("a"), None).unwrap();
        let a1 = tree.append(Row::with_topic("a1"), Some(a)).unwrap();
        let a2 = tree.append(Row::with_topic("a2"), Some(a)).unwrap();
        let b = tree.append(Row::with_topic("b"), None).unwrap();
        (tree, [a, a1, a2, b])
    }

    fn project(tree: &mut RowTree, completed_filter: bool, state: SearchState) -> Vec<RowId> {
        let mut visitor = TransientDataVisitor::new(completed_filter, state, false);
        for root in tree.roots().to_vec() {
            visitor.visit_row_mut(tree, root);
        }
        visitor.shadow_table
    }

    #[test]
    fn test_all_expanded_rows_visible() {
        let (mut tree, [a, a1, a2, b]) = sample();
        assert_eq!(project(&mut tree, false, SearchState::NotSearching), vec![a, a1, a2, b]);
        assert_eq!(tree.get(b).unwrap().shadow_table_index, Some(3));
    }

    #[test]
    fn test_collapsed_row_hides_children_but_not_next_sibling() {
        let (mut tree, [a, a1, a2, b]) = sample();
        tree.get_mut(a).unwrap().set_expanded(false);
        assert_eq!(project(&mut tree, false, SearchState::NotSearching), vec![a, b]);
        assert_eq!(tree.get(a1).unwrap().shadow_table_index, None);
        assert_eq!(tree.get(a2).unwrap().shadow_table_index, None);
        assert_eq!(tree.get(b).unwrap().shadow_table_index, Some(1));
    }

    #[test]
    fn test_completed_filter_hides_subtree() {
        let (mut tree, [a, a1, a2, b]) = sample();
        tree.get_mut(a).unwrap().set_complete(true);
        assert_eq!(project(&mut tree, true, SearchState::NotSearching), vec![b]);
        assert_eq!(tree.get(a).unwrap().shadow_table_index, None);
        assert_eq!(tree.get(a1).unwrap().shadow_table_index, None);
        assert_eq!(tree.get(a2).unwrap().shadow_table_index, None);
        // Filter off shows it again
        assert_eq!(project(&mut tree, false, SearchState::NotSearching).len(), 4);
    }

    #[test]
    fn test_searching_ignores_collapse_and_keeps_results() {
        let (mut tree, [a, _a1, a2, _b]) = sample();
        tree.get_mut(a).unwrap().set_expanded(false);
        tree.get_mut(a).unwrap().is_part_of_search_result = true;
        tree.get_mut(a2).unwrap().is_part_of_search_result = true;
        assert_eq!(project(&mut tree, false, SearchState::Searching), vec![a, a2]);
    }

    #[test]
    fn test_begin_search_shows_collapsed_children() {
        let (mut tree, [a, a1, a2, b]) = sample();
        tree.get_mut(a).unwrap().set_expanded(false);
        assert_eq!(project(&mut tree, false, SearchState::BeginSearch), vec![a, a1, a2, b]);
    }

    #[test]
    fn test_reloads_track_changed_indices() {
        let (mut tree, [a, _, _, _]) = sample();
        project(&mut tree, false, SearchState::NotSearching);
        tree.get_mut(a).unwrap().set_expanded(false);

        let mut visitor = TransientDataVisitor::new(false, SearchState::NotSearching, true);
        for root in tree.roots().to_vec() {
            visitor.visit_row_mut(&mut tree, root);
        }
        // `b` moved from 3 to 1; `a` kept 0
        assert_eq!(visitor.reloads.into_iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_indices_are_contiguous() {
        let (mut tree, [a, ..]) = sample();
        let c = tree.append(Row::with_topic("c"), Some(a)).unwrap();
        tree.get_mut(c).unwrap().set_complete(true);
        let table = project(&mut tree, true, SearchState::NotSearching);
        for (i, id) in table.iter().enumerate() {
            assert_eq!(tree.get(*id).unwrap().shadow_table_index, Some(i));
        }
    }
}
