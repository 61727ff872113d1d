use crate::model::changes::ShadowTableChanges;
use crate::model::outline::Outline;
use crate::model::row::{Row, RowId};
use crate::model::tree::{RowError, RowTree};
use crate::ops::reproject;

/// Rows that are visible and carry a note
fn rows_with_notes(outline: &Outline) -> Vec<RowId> {
    outline
        .shadow_table()
        .unwrap_or_default()
        .iter()
        .filter(|id| outline.find_row(**id).is_some_and(|r| !r.is_note_empty()))
        .copied()
        .collect()
}

/// The rows a container covers: a row and its descendants, or every row for
/// the outline itself (`None`)
fn container_rows(tree: &RowTree, container: Option<RowId>) -> Vec<RowId> {
    match container {
        None => tree.preorder(),
        Some(id) if tree.contains(id) => {
            let mut rows = vec![id];
            rows.extend(tree.descendants(id));
            rows
        }
        Some(_) => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Expand and collapse
// ---------------------------------------------------------------------------

pub fn expand(outline: &mut Outline, ids: &[RowId]) -> ShadowTableChanges {
    set_expanded(outline, ids, true)
}

pub fn collapse(outline: &mut Outline, ids: &[RowId]) -> ShadowTableChanges {
    set_expanded(outline, ids, false)
}

fn set_expanded(outline: &mut Outline, ids: &[RowId], expanded: bool) -> ShadowTableChanges {
    let tree = outline.tree_mut();
    let mut impacted = Vec::new();
    for id in ids {
        if let Some(row) = tree.get_mut(*id) {
            if row.has_children() && row.is_expanded != expanded {
                row.set_expanded(expanded);
                impacted.push(*id);
            }
        }
    }
    reproject(outline, &impacted)
}

pub fn is_expand_all_unavailable(outline: &Outline, containers: &[Option<RowId>]) -> bool {
    let tree = outline.tree();
    !containers
        .iter()
        .flat_map(|c| container_rows(tree, *c))
        .any(|id| tree.get(id).is_some_and(Row::is_expandable))
}

pub fn is_collapse_all_unavailable(outline: &Outline, containers: &[Option<RowId>]) -> bool {
    let tree = outline.tree();
    !containers
        .iter()
        .flat_map(|c| container_rows(tree, *c))
        .any(|id| tree.get(id).is_some_and(Row::is_collapsable))
}

/// Expand every collapsed row in each container. `None` is the whole outline.
pub fn expand_all(outline: &mut Outline, containers: &[Option<RowId>]) -> ShadowTableChanges {
    let impacted = set_all_expanded(outline, containers, true);
    reproject(outline, &impacted)
}

/// Collapse every expanded row in each container. `None` is the whole
/// outline.
pub fn collapse_all(outline: &mut Outline, containers: &[Option<RowId>]) -> ShadowTableChanges {
    let impacted = set_all_expanded(outline, containers, false);
    reproject(outline, &impacted)
}

fn set_all_expanded(outline: &mut Outline, containers: &[Option<RowId>], expanded: bool) -> Vec<RowId> {
    let tree = outline.tree_mut();
    let mut impacted = Vec::new();
    for container in containers {
        for id in container_rows(tree, *container) {
            if let Some(row) = tree.get_mut(id) {
                if row.has_children() && row.is_expanded != expanded {
                    row.set_expanded(expanded);
                    impacted.push(id);
                }
            }
        }
    }
    tracing::debug!(count = impacted.len(), expanded, "changed expansion of rows");
    impacted
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Turn filtering on or off. Rows with notes are redrawn since the notes
/// filter may have changed whether their note shows.
pub fn toggle_filter_on(outline: &mut Outline) -> ShadowTableChanges {
    outline.is_filter_on = !outline.is_filter_on;
    let mut changes = outline.rebuild_shadow_table();
    changes.merge(ShadowTableChanges::reloading(outline.shadow_indices(&rows_with_notes(outline))));
    changes
}

pub fn toggle_completed_filter(outline: &mut Outline) -> ShadowTableChanges {
    outline.is_completed_filtered = !outline.is_completed_filtered;
    outline.rebuild_shadow_table()
}

/// Notes never change visibility, only how rows draw.
pub fn toggle_notes_filter(outline: &mut Outline) -> ShadowTableChanges {
    outline.is_notes_filtered = !outline.is_notes_filtered;
    ShadowTableChanges::reloading(outline.shadow_indices(&rows_with_notes(outline)))
}

// ---------------------------------------------------------------------------
// Focus
// ---------------------------------------------------------------------------

/// Show only `id` and its subtree.
pub fn focus_in(outline: &mut Outline, id: RowId) -> Result<ShadowTableChanges, RowError> {
    outline.tree().try_get(id)?;
    outline.focus_row = Some(id);
    let mut changes = outline.rebuild_shadow_table();
    changes.merge(ShadowTableChanges::reloading(outline.subtree_shadow_indices(id)));
    tracing::debug!(row = %id, "focused in");
    Ok(changes)
}

pub fn is_focus_out_unavailable(outline: &Outline) -> bool {
    outline.focus_row.is_none()
}

/// Show the whole outline again.
pub fn focus_out(outline: &mut Outline) -> ShadowTableChanges {
    let Some(previous) = outline.focus_row.take() else {
        return ShadowTableChanges::default();
    };
    let mut changes = outline.rebuild_shadow_table();
    changes.merge(ShadowTableChanges::reloading(outline.subtree_shadow_indices(previous)));
    changes
}

/// Shadow indices of the rows shown under the row at `index`, walking only
/// through expanded rows.
pub fn children_indexes(outline: &Outline, index: usize) -> Vec<usize> {
    let Some(row) = outline.row_at(index) else {
        return Vec::new();
    };
    let mut indexes = Vec::new();
    if row.is_expanded {
        collect_expanded_indexes(outline.tree(), row.children(), &mut indexes);
    }
    indexes
}

fn collect_expanded_indexes(tree: &RowTree, ids: &[RowId], out: &mut Vec<usize>) {
    for row in ids.iter().filter_map(|id| tree.get(*id)) {
        out.extend(row.shadow_table_index);
        if row.is_expanded {
            collect_expanded_indexes(tree, row.children(), out);
        }
    }
}

// ---------------------------------------------------------------------------
// Expansion state
// ---------------------------------------------------------------------------

/// Pre-order positions of the expanded rows that have children, comma
/// separated, as stored in an OPML head.
pub fn expansion_state(outline: &Outline) -> String {
    let tree = outline.tree();
    tree.preorder()
        .iter()
        .enumerate()
        .filter(|(_, id)| tree.get(**id).is_some_and(Row::is_collapsable))
        .map(|(i, _)| i.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Expand exactly the rows whose pre-order position is listed. Rows without
/// children keep their flag. Unreadable entries are skipped.
pub fn set_expansion_state(outline: &mut Outline, state: &str) -> ShadowTableChanges {
    let expanded: Vec<usize> = state
        .split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect();

    let tree = outline.tree_mut();
    for (i, id) in tree.preorder().into_iter().enumerate() {
        if let Some(row) = tree.get_mut(id) {
            if row.has_children() {
                row.set_expanded(expanded.contains(&i));
            }
        }
    }
    outline.rebuild_shadow_table()
}
