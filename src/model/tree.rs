use indexmap::IndexMap;

use crate::model::row::{Row, RowId};
use crate::util::fractional_index::{self, DEFAULT_REBALANCE_THRESHOLD};
use crate::visit::RowVisitor;

/// Error type for structural row operations
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("row not found: {0}")]
    NotFound(RowId),
    #[error("cannot move row {row} under its own descendant {parent}")]
    WouldCreateCycle { row: RowId, parent: RowId },
}

/// Arena owning every row of one outline.
///
/// Rows are looked up by id. Structure lives in each row's ordered child
/// list plus `roots` for the top level; `parent` links are handles back into
/// the arena.
#[derive(Debug, Clone)]
pub struct RowTree {
    rows: IndexMap<RowId, Row>,
    roots: Vec<RowId>,
    rebalance_threshold: usize,
}

impl Default for RowTree {
    fn default() -> Self {
        RowTree::new(DEFAULT_REBALANCE_THRESHOLD)
    }
}

impl RowTree {
    pub fn new(rebalance_threshold: usize) -> Self {
        RowTree {
            rows: IndexMap::new(),
            roots: Vec::new(),
            rebalance_threshold,
        }
    }

    pub fn rebalance_threshold(&self) -> usize {
        self.rebalance_threshold
    }

    pub fn set_rebalance_threshold(&mut self, threshold: usize) {
        self.rebalance_threshold = threshold;
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, id: RowId) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn get(&self, id: RowId) -> Option<&Row> {
        self.rows.get(&id)
    }

    pub fn get_mut(&mut self, id: RowId) -> Option<&mut Row> {
        self.rows.get_mut(&id)
    }

    pub(crate) fn try_get(&self, id: RowId) -> Result<&Row, RowError> {
        self.rows.get(&id).ok_or(RowError::NotFound(id))
    }

    pub(crate) fn try_get_mut(&mut self, id: RowId) -> Result<&mut Row, RowError> {
        self.rows.get_mut(&id).ok_or(RowError::NotFound(id))
    }

    pub fn roots(&self) -> &[RowId] {
        &self.roots
    }

    /// Read-only view of a row with access to the rest of the tree
    pub fn row_ref(&self, id: RowId) -> Option<RowRef<'_>> {
        self.rows.get(&id).map(|row| RowRef { tree: self, row })
    }

    /// Top-level rows in order
    pub fn root_refs(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.roots.iter().filter_map(|id| self.row_ref(*id))
    }

    /// Rows in arena order (not display order)
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Row> {
        self.rows.values_mut()
    }

    /// Child list of `parent`, or the top level for `None`. Unknown parents
    /// have no children.
    pub fn children_of(&self, parent: Option<RowId>) -> &[RowId] {
        match parent {
            None => &self.roots,
            Some(id) => self.rows.get(&id).map(|row| row.children.as_slice()).unwrap_or(&[]),
        }
    }

    fn children_of_mut(&mut self, parent: Option<RowId>) -> Result<&mut Vec<RowId>, RowError> {
        match parent {
            None => Ok(&mut self.roots),
            Some(id) => Ok(&mut self.try_get_mut(id)?.children),
        }
    }

    pub fn parent_of(&self, id: RowId) -> Option<RowId> {
        self.rows.get(&id).and_then(|row| row.parent)
    }

    pub fn index_in_parent(&self, id: RowId) -> Option<usize> {
        let parent = self.rows.get(&id)?.parent;
        self.children_of(parent).iter().position(|c| *c == id)
    }

    pub fn previous_sibling(&self, id: RowId) -> Option<RowId> {
        let index = self.index_in_parent(id)?;
        let siblings = self.children_of(self.parent_of(id));
        index.checked_sub(1).map(|i| siblings[i])
    }

    pub fn next_sibling(&self, id: RowId) -> Option<RowId> {
        let index = self.index_in_parent(id)?;
        self.children_of(self.parent_of(id)).get(index + 1).copied()
    }

    /// Number of ancestors; top-level rows are level 0.
    pub fn level(&self, id: RowId) -> usize {
        self.ancestors(id).count()
    }

    /// Ancestors from the parent upward
    pub fn ancestors(&self, id: RowId) -> impl Iterator<Item = RowId> + '_ {
        let mut next = self.parent_of(id);
        std::iter::from_fn(move || {
            let current = next?;
            next = self.parent_of(current);
            Some(current)
        })
    }

    /// True when `of` appears on the parent chain of `id`.
    pub fn is_descendant(&self, id: RowId, of: RowId) -> bool {
        self.ancestors(id).any(|a| a == of)
    }

    pub fn is_any_parent_complete(&self, id: RowId) -> bool {
        self.ancestors(id)
            .any(|a| self.rows.get(&a).is_some_and(|row| row.is_complete))
    }

    /// Every row below `id`, pre-order, not including `id` itself.
    pub fn descendants(&self, id: RowId) -> Vec<RowId> {
        let mut out = Vec::new();
        self.collect_preorder(self.children_of(Some(id)), &mut out);
        out
    }

    /// Every row in display order, ignoring expansion.
    pub fn preorder(&self) -> Vec<RowId> {
        let mut out = Vec::with_capacity(self.rows.len());
        self.collect_preorder(&self.roots, &mut out);
        out
    }

    fn collect_preorder(&self, ids: &[RowId], out: &mut Vec<RowId>) {
        for id in ids {
            out.push(*id);
            self.collect_preorder(self.children_of(Some(*id)), out);
        }
    }

    // -----------------------------------------------------------------------
    // Structural edits
    // -----------------------------------------------------------------------

    /// Insert a new row under `parent` at `index` (clamped), keying it between
    /// its new neighbors.
    pub fn insert(&mut self, mut row: Row, parent: Option<RowId>, index: usize) -> Result<RowId, RowError> {
        let id = row.id;
        let siblings = self.children_of_mut(parent)?;
        let index = index.min(siblings.len());
        siblings.insert(index, id);
        row.parent = parent;
        self.rows.insert(id, row);
        self.assign_order(id, parent, index);
        tracing::trace!(row = %id, index, "inserted row");
        Ok(id)
    }

    /// Insert a new row as the last child of `parent`
    pub fn append(&mut self, row: Row, parent: Option<RowId>) -> Result<RowId, RowError> {
        let index = self.children_of(parent).len();
        self.insert(row, parent, index)
    }

    /// Add a row that already carries its order key, placing it by that key
    /// without rekeying. Used when building a tree from persisted or imported
    /// rows; the parent must already be present.
    pub(crate) fn insert_keyed(&mut self, mut row: Row, parent: Option<RowId>) -> Result<RowId, RowError> {
        let id = row.id;
        let siblings = self.children_of(parent);
        let index = siblings.partition_point(|sibling| {
            self.rows
                .get(sibling)
                .is_some_and(|s| (s.order.as_str(), s.id) < (row.order.as_str(), id))
        });
        self.children_of_mut(parent)?.insert(index, id);
        row.parent = parent;
        self.rows.insert(id, row);
        Ok(id)
    }

    /// Take `id` out of its parent's child list. The row and its subtree stay
    /// in the arena. Returns the old parent and position.
    pub fn detach(&mut self, id: RowId) -> Result<(Option<RowId>, usize), RowError> {
        let parent = self.try_get(id)?.parent;
        let index = match parent {
            None => {
                let index = self.roots.iter().position(|r| *r == id);
                if let Some(i) = index {
                    self.roots.remove(i);
                }
                index
            }
            Some(p) => self.try_get_mut(p)?.detach_child(id),
        };
        Ok((parent, index.unwrap_or(0)))
    }

    /// Place a detached row under `parent` at `index` (clamped) with a fresh
    /// order key. The row keeps its subtree.
    pub fn attach(&mut self, id: RowId, parent: Option<RowId>, index: usize) -> Result<(), RowError> {
        self.try_get(id)?;
        if let Some(p) = parent {
            self.try_get(p)?;
            if p == id || self.is_descendant(p, id) {
                return Err(RowError::WouldCreateCycle { row: id, parent: p });
            }
        }
        let siblings = self.children_of_mut(parent)?;
        let index = index.min(siblings.len());
        siblings.insert(index, id);
        self.try_get_mut(id)?.parent = parent;
        self.assign_order(id, parent, index);
        Ok(())
    }

    /// Move `id` under `parent` at `index`, where `index` counts positions in
    /// the destination list with `id` already removed from it.
    pub fn move_row(&mut self, id: RowId, parent: Option<RowId>, index: usize) -> Result<(), RowError> {
        if let Some(p) = parent {
            if p == id || self.is_descendant(p, id) {
                return Err(RowError::WouldCreateCycle { row: id, parent: p });
            }
        }
        self.detach(id)?;
        self.attach(id, parent, index)?;
        tracing::trace!(row = %id, index, "moved row");
        Ok(())
    }

    /// Delete `id` and its whole subtree. Returns the removed ids, pre-order.
    pub fn remove(&mut self, id: RowId) -> Result<Vec<RowId>, RowError> {
        self.detach(id)?;
        let mut removed = vec![id];
        removed.extend(self.descendants(id));
        for gone in &removed {
            self.rows.shift_remove(gone);
        }
        tracing::trace!(row = %id, count = removed.len(), "removed rows");
        Ok(removed)
    }

    /// Reorder the child list of `parent` and rekey it in that order.
    pub(crate) fn reorder_children(&mut self, parent: Option<RowId>, order: Vec<RowId>) -> Result<(), RowError> {
        *self.children_of_mut(parent)? = order;
        self.rebalance_children(parent)
    }

    /// Replace the order keys of every child of `parent` with evenly spaced
    /// short keys, keeping their current sequence.
    pub fn rebalance_children(&mut self, parent: Option<RowId>) -> Result<(), RowError> {
        let children = self.children_of(parent).to_vec();
        let keys = fractional_index::rebalance(children.len());
        for (child, key) in children.iter().zip(keys) {
            self.try_get_mut(*child)?.order = key;
        }
        tracing::debug!(parent = ?parent, count = children.len(), "rebalanced sibling order keys");
        Ok(())
    }

    fn assign_order(&mut self, id: RowId, parent: Option<RowId>, index: usize) {
        let siblings = self.children_of(parent);
        let order_of = |sibling: &RowId| self.rows.get(sibling).map(|r| r.order.clone());
        let before = index.checked_sub(1).and_then(|i| siblings.get(i)).and_then(order_of);
        let after = siblings.get(index + 1).and_then(order_of);
        let key = fractional_index::between(before.as_deref(), after.as_deref());
        let needs_rebalance = fractional_index::needs_rebalancing(&key, self.rebalance_threshold);

        if let Some(row) = self.rows.get_mut(&id) {
            row.order = key;
        }
        if needs_rebalance {
            if let Err(e) = self.rebalance_children(parent) {
                tracing::warn!(parent = ?parent, error = %e, "could not rekey siblings after insert");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Point every row's parent handle at the row whose child list holds it.
    pub fn reestablish_parents(&mut self) {
        let mut links = Vec::with_capacity(self.rows.len());
        for root in &self.roots {
            links.push((*root, None));
        }
        for row in self.rows.values() {
            for child in &row.children {
                links.push((*child, Some(row.id)));
            }
        }
        for (child, parent) in links {
            if let Some(row) = self.rows.get_mut(&child) {
                row.parent = parent;
            }
        }
    }

    /// Sort every sibling list by order key, breaking ties by id. Sibling
    /// lists that held duplicate or malformed keys are rekeyed.
    pub fn sort_children_by_order(&mut self) {
        let mut parents: Vec<Option<RowId>> = vec![None];
        parents.extend(self.rows.keys().map(|id| Some(*id)));

        for parent in parents {
            let mut children = self.children_of(parent).to_vec();
            if children.is_empty() {
                continue;
            }
            children.sort_by(|a, b| {
                let ka = self.rows.get(a).map(|r| r.order.as_str()).unwrap_or_default();
                let kb = self.rows.get(b).map(|r| r.order.as_str()).unwrap_or_default();
                ka.cmp(kb).then(a.cmp(b))
            });
            let damaged = children.windows(2).any(|w| {
                self.rows.get(&w[0]).map(|r| &r.order) == self.rows.get(&w[1]).map(|r| &r.order)
            }) || children.iter().any(|c| {
                self.rows
                    .get(c)
                    .is_some_and(|r| !fractional_index::is_valid(&r.order))
            });
            if let Ok(list) = self.children_of_mut(parent) {
                *list = children;
            }
            if damaged {
                tracing::warn!(parent = ?parent, "duplicate or malformed order keys, rekeying siblings");
                if let Err(e) = self.rebalance_children(parent) {
                    tracing::warn!(parent = ?parent, error = %e, "could not rekey siblings");
                }
            }
        }
    }
}

/// A row borrowed together with its tree, so visitors can walk children and
/// ancestry without holding owning links.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    tree: &'a RowTree,
    row: &'a Row,
}

impl<'a> RowRef<'a> {
    pub fn row(&self) -> &'a Row {
        self.row
    }

    pub fn tree(&self) -> &'a RowTree {
        self.tree
    }

    /// Children in order-key sequence
    pub fn children(&self) -> impl Iterator<Item = RowRef<'a>> + 'a {
        let tree = self.tree;
        self.row.children.iter().filter_map(move |id| tree.row_ref(*id))
    }

    pub fn level(&self) -> usize {
        self.tree.level(self.row.id)
    }

    pub fn is_any_parent_complete(&self) -> bool {
        self.tree.is_any_parent_complete(self.row.id)
    }

    /// Hand this row to `visitor`, which decides whether to descend.
    pub fn visit<V: RowVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_row(*self);
    }
}

impl std::ops::Deref for RowRef<'_> {
    type Target = Row;

    fn deref(&self) -> &Row {
        self.row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn topics(tree: &RowTree, parent: Option<RowId>) -> Vec<String> {
        tree.children_of(parent)
            .iter()
            .map(|id| tree.get(*id).unwrap().topic_text().to_string())
            .collect()
    }

    fn keys_ascending(tree: &RowTree, parent: Option<RowId>) -> bool {
        let keys: Vec<&str> = tree
            .children_of(parent)
            .iter()
            .map(|id| tree.get(*id).unwrap().order.as_str())
            .collect();
        keys.windows(2).all(|w| w[0] < w[1])
    }

    #[test]
    fn test_insert_assigns_ordered_keys() {
        let mut tree = RowTree::default();
        let a = tree.append(Row::with_topic("a"), None).unwrap();
        let c = tree.append(Row::with_topic("c"), None).unwrap();
        tree.insert(Row::with_topic("b"), None, 1).unwrap();
        tree.insert(Row::with_topic("first"), None, 0).unwrap();

        assert_eq!(topics(&tree, None), vec!["first", "a", "b", "c"]);
        assert!(keys_ascending(&tree, None));
        assert_eq!(tree.get(a).unwrap().order, "V");
        assert!(tree.get(c).unwrap().order.as_str() > "V");
    }

    #[test]
    fn test_children_and_levels() {
        let mut tree = RowTree::default();
        let parent = tree.append(Row::with_topic("p"), None).unwrap();
        let child = tree.append(Row::with_topic("c"), Some(parent)).unwrap();
        let grandchild = tree.append(Row::with_topic("g"), Some(child)).unwrap();

        assert_eq!(tree.level(parent), 0);
        assert_eq!(tree.level(grandchild), 2);
        assert!(tree.is_descendant(grandchild, parent));
        assert!(!tree.is_descendant(parent, grandchild));
        assert_eq!(tree.descendants(parent), vec![child, grandchild]);
        assert_eq!(tree.parent_of(child), Some(parent));
    }

    #[test]
    fn test_insert_under_unknown_parent() {
        let mut tree = RowTree::default();
        let ghost = RowId::new();
        assert_eq!(
            tree.append(Row::new(), Some(ghost)),
            Err(RowError::NotFound(ghost))
        );
    }

    #[test]
    fn test_move_under_descendant_is_rejected() {
        let mut tree = RowTree::default();
        let parent = tree.append(Row::with_topic("p"), None).unwrap();
        let child = tree.append(Row::with_topic("c"), Some(parent)).unwrap();
        let err = tree.move_row(parent, Some(child), 0).unwrap_err();
        assert_eq!(err, RowError::WouldCreateCycle { row: parent, parent: child });
        // Nothing moved
        assert_eq!(tree.roots(), &[parent]);
        assert_eq!(tree.parent_of(child), Some(parent));
    }

    #[test]
    fn test_move_keeps_subtree() {
        let mut tree = RowTree::default();
        let a = tree.append(Row::with_topic("a"), None).unwrap();
        let b = tree.append(Row::with_topic("b"), None).unwrap();
        let a1 = tree.append(Row::with_topic("a1"), Some(a)).unwrap();

        tree.move_row(a, Some(b), 0).unwrap();
        assert_eq!(tree.roots(), &[b]);
        assert_eq!(tree.children_of(Some(b)), &[a]);
        assert_eq!(tree.children_of(Some(a)), &[a1]);
        assert_eq!(tree.level(a1), 2);
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut tree = RowTree::default();
        let a = tree.append(Row::with_topic("a"), None).unwrap();
        let a1 = tree.append(Row::with_topic("a1"), Some(a)).unwrap();
        let b = tree.append(Row::with_topic("b"), None).unwrap();

        let removed = tree.remove(a).unwrap();
        assert_eq!(removed, vec![a, a1]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.roots(), &[b]);
    }

    #[test]
    fn test_repeated_front_inserts_trigger_rebalance() {
        let mut tree = RowTree::new(3);
        for i in 0..30 {
            tree.insert(Row::with_topic(&i.to_string()), None, 0).unwrap();
        }
        assert!(keys_ascending(&tree, None));
        let longest = tree.iter().map(|r| r.order.len()).max().unwrap();
        assert!(longest <= 3, "longest key {longest}");
        assert_eq!(topics(&tree, None).first().map(String::as_str), Some("29"));
    }

    #[test]
    fn test_sort_children_by_order_repairs_duplicates() {
        let mut tree = RowTree::default();
        let mut a = Row::with_topic("a");
        a.order = "V".into();
        let mut b = Row::with_topic("b");
        b.order = "V".into();
        let mut c = Row::with_topic("c");
        c.order = "E".into();
        tree.insert_keyed(a, None).unwrap();
        tree.insert_keyed(b, None).unwrap();
        tree.insert_keyed(c, None).unwrap();

        tree.sort_children_by_order();
        assert_eq!(topics(&tree, None)[0], "c");
        assert!(keys_ascending(&tree, None));
    }

    #[test]
    fn test_row_ref_children() {
        let mut tree = RowTree::default();
        let p = tree.append(Row::with_topic("p"), None).unwrap();
        tree.append(Row::with_topic("x"), Some(p)).unwrap();
        tree.append(Row::with_topic("y"), Some(p)).unwrap();
        let r = tree.row_ref(p).unwrap();
        let names: Vec<&str> = r.children().map(|c| c.row().topic_text()).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(r.topic_text(), "p");
    }
}
