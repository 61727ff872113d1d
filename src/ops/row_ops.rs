use std::collections::{HashMap, HashSet};

use crate::model::changes::ShadowTableChanges;
use crate::model::outline::Outline;
use crate::model::rich_text::RichText;
use crate::model::row::{Row, RowId};
use crate::model::selection::{sorted_by_display_order, sorted_by_reverse_display_order, sorted_with_descendants_filtered};
use crate::model::tree::{RowError, RowTree};
use crate::ops::rebuild_with_reloads;
use crate::util::unicode::fold_case;

/// Rows added by a create or duplicate operation, and the resulting change
/// to the shadow table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedRows {
    pub ids: Vec<RowId>,
    pub changes: ShadowTableChanges,
}

/// One row's destination in a batch move. `to_parent` is `None` for the top
/// level. `to_index` is clamped to the end of the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowMove {
    pub row: RowId,
    pub to_parent: Option<RowId>,
    pub to_index: usize,
}

fn check_all(tree: &RowTree, ids: &[RowId]) -> Result<(), RowError> {
    for id in ids {
        tree.try_get(*id)?;
    }
    Ok(())
}

fn created(outline: &mut Outline, ids: Vec<RowId>, reload: &[RowId]) -> CreatedRows {
    let changes = rebuild_with_reloads(outline, reload);
    CreatedRows { ids, changes }
}

// ---------------------------------------------------------------------------
// Creating rows
// ---------------------------------------------------------------------------

/// Insert `row` directly above `before`, as its sibling.
pub fn create_row_before(outline: &mut Outline, row: Row, before: RowId) -> Result<CreatedRows, RowError> {
    let tree = outline.tree_mut();
    tree.try_get(before)?;
    let parent = tree.parent_of(before);
    let index = tree.index_in_parent(before).unwrap_or(0);
    let id = tree.insert(row, parent, index)?;
    let reload: Vec<RowId> = parent.into_iter().collect();
    Ok(created(outline, vec![id], &reload))
}

/// Insert `row` where a new row goes after pressing return on `after`.
///
/// With no anchor the row becomes the first top-level row. An expanded
/// anchor with children gets it as its first child. Otherwise it becomes
/// the anchor's next sibling.
pub fn create_row_after(outline: &mut Outline, row: Row, after: Option<RowId>) -> Result<CreatedRows, RowError> {
    let tree = outline.tree_mut();
    let id = match after {
        None => tree.insert(row, None, 0)?,
        Some(after) => {
            let anchor = tree.try_get(after)?;
            if anchor.is_expanded && anchor.has_children() {
                tree.insert(row, Some(after), 0)?
            } else {
                let parent = tree.parent_of(after);
                let index = tree.index_in_parent(after).map_or(0, |i| i + 1);
                tree.insert(row, parent, index)?
            }
        }
    };
    let reload: Vec<RowId> = after.into_iter().collect();
    Ok(created(outline, vec![id], &reload))
}

/// Insert `rows` in order as the first children of `parent`.
pub fn create_rows_inside_at_start(
    outline: &mut Outline,
    rows: Vec<Row>,
    parent: RowId,
) -> Result<CreatedRows, RowError> {
    let tree = outline.tree_mut();
    tree.try_get(parent)?;
    let mut ids = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        ids.push(tree.insert(row, Some(parent), i)?);
    }
    Ok(created(outline, ids, &[parent]))
}

/// Append `rows` in order after the existing children of `parent`.
pub fn create_rows_inside_at_end(
    outline: &mut Outline,
    rows: Vec<Row>,
    parent: RowId,
) -> Result<CreatedRows, RowError> {
    let tree = outline.tree_mut();
    tree.try_get(parent)?;
    let mut ids = Vec::with_capacity(rows.len());
    for row in rows {
        ids.push(tree.append(row, Some(parent))?);
    }
    Ok(created(outline, ids, &[parent]))
}

/// Insert `rows` in order as the siblings directly following `after`.
pub fn create_rows_directly_after(
    outline: &mut Outline,
    rows: Vec<Row>,
    after: RowId,
) -> Result<CreatedRows, RowError> {
    let tree = outline.tree_mut();
    tree.try_get(after)?;
    let parent = tree.parent_of(after);
    let start = tree.index_in_parent(after).map_or(0, |i| i + 1);
    let mut ids = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        ids.push(tree.insert(row, parent, start + i)?);
    }
    Ok(created(outline, ids, &[]))
}

/// Insert `rows` one level out from `after`: as siblings following
/// `after`'s parent. Nothing happens when `after` is at the top level.
pub fn create_rows_outside(outline: &mut Outline, rows: Vec<Row>, after: RowId) -> Result<CreatedRows, RowError> {
    let tree = outline.tree_mut();
    tree.try_get(after)?;
    let Some(parent) = tree.parent_of(after) else {
        return Ok(CreatedRows::default());
    };
    let grandparent = tree.parent_of(parent);
    let start = tree.index_in_parent(parent).map_or(0, |i| i + 1);
    let mut ids = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        ids.push(tree.insert(row, grandparent, start + i)?);
    }
    Ok(created(outline, ids, &[parent]))
}

pub fn is_create_rows_outside_unavailable(outline: &Outline, ids: &[RowId]) -> bool {
    is_move_rows_left_unavailable(outline, ids)
}

/// Deep copy each selected subtree, placing each copy directly after its
/// original. Selected rows under another selected row are copied once, as
/// part of their ancestor.
pub fn duplicate_rows(outline: &mut Outline, ids: &[RowId]) -> Result<CreatedRows, RowError> {
    let tree = outline.tree_mut();
    check_all(tree, ids)?;
    let mut created_ids = Vec::new();
    for id in sorted_with_descendants_filtered(tree, ids) {
        let parent = tree.parent_of(id);
        let index = tree.index_in_parent(id).map_or(0, |i| i + 1);
        copy_subtree(tree, id, parent, index, &mut created_ids)?;
    }
    Ok(created(outline, created_ids, &[]))
}

fn copy_subtree(
    tree: &mut RowTree,
    source: RowId,
    parent: Option<RowId>,
    index: usize,
    created_ids: &mut Vec<RowId>,
) -> Result<(), RowError> {
    let original = tree.try_get(source)?;
    let mut copy = Row::new();
    copy.topic = original.topic.clone();
    copy.note = original.note.clone();
    copy.is_complete = original.is_complete;
    copy.is_expanded = original.is_expanded;
    let children = original.children.clone();

    let id = tree.insert(copy, parent, index)?;
    created_ids.push(id);
    for (i, child) in children.into_iter().enumerate() {
        copy_subtree(tree, child, Some(id), i, created_ids)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Deleting rows
// ---------------------------------------------------------------------------

/// Delete the selected rows with their subtrees.
pub fn delete_rows(outline: &mut Outline, ids: &[RowId]) -> Result<ShadowTableChanges, RowError> {
    let tree = outline.tree_mut();
    check_all(tree, ids)?;
    let mut parents = Vec::new();
    for id in sorted_with_descendants_filtered(tree, ids) {
        if let Some(parent) = tree.parent_of(id) {
            parents.push(parent);
        }
        tree.remove(id)?;
    }
    parents.retain(|p| tree.contains(*p));
    Ok(rebuild_with_reloads(outline, &parents))
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

pub fn is_complete_unavailable(outline: &Outline, ids: &[RowId]) -> bool {
    !ids.iter().any(|id| outline.find_row(*id).is_some_and(|r| !r.is_complete))
}

pub fn is_uncomplete_unavailable(outline: &Outline, ids: &[RowId]) -> bool {
    !ids.iter().any(|id| outline.find_row(*id).is_some_and(|r| r.is_complete))
}

pub fn complete_rows(outline: &mut Outline, ids: &[RowId]) -> Result<ShadowTableChanges, RowError> {
    set_rows_complete(outline, ids, true)
}

pub fn uncomplete_rows(outline: &mut Outline, ids: &[RowId]) -> Result<ShadowTableChanges, RowError> {
    set_rows_complete(outline, ids, false)
}

/// Changed rows are redrawn along with everything below them, since
/// descendants of a completed row render dimmed.
fn set_rows_complete(outline: &mut Outline, ids: &[RowId], complete: bool) -> Result<ShadowTableChanges, RowError> {
    let tree = outline.tree_mut();
    check_all(tree, ids)?;
    let mut impacted = Vec::new();
    for id in ids {
        let row = tree.try_get_mut(*id)?;
        if row.is_complete != complete {
            row.set_complete(complete);
            impacted.push(*id);
        }
    }
    let mut reload = impacted.clone();
    for id in &impacted {
        reload.extend(outline.tree().descendants(*id));
    }
    Ok(rebuild_with_reloads(outline, &reload))
}

/// Replace a row's topic and note. Empty text clears the field.
pub fn update_row(
    outline: &mut Outline,
    id: RowId,
    topic: Option<RichText>,
    note: Option<RichText>,
) -> Result<ShadowTableChanges, RowError> {
    let row = outline.tree_mut().try_get_mut(id)?;
    row.update_topic(topic);
    row.update_note(note);
    outline.touch();
    Ok(ShadowTableChanges::reloading(outline.shadow_indices(&[id])))
}

pub fn is_create_notes_unavailable(outline: &Outline, ids: &[RowId]) -> bool {
    !ids.iter().any(|id| outline.find_row(*id).is_some_and(Row::is_note_empty))
}

pub fn is_delete_notes_unavailable(outline: &Outline, ids: &[RowId]) -> bool {
    ids.iter().all(|id| outline.find_row(*id).is_none_or(Row::is_note_empty))
}

/// Give every selected row without a note an empty one to type into.
pub fn create_notes(outline: &mut Outline, ids: &[RowId]) -> Result<ShadowTableChanges, RowError> {
    let tree = outline.tree_mut();
    check_all(tree, ids)?;
    let mut impacted = Vec::new();
    for id in ids {
        let row = tree.try_get_mut(*id)?;
        if row.note.is_none() {
            row.note = Some(RichText::default());
            impacted.push(*id);
        }
    }
    outline.touch();
    Ok(ShadowTableChanges::reloading(outline.shadow_indices(&impacted)))
}

pub fn delete_notes(outline: &mut Outline, ids: &[RowId]) -> Result<ShadowTableChanges, RowError> {
    let tree = outline.tree_mut();
    check_all(tree, ids)?;
    let mut impacted = Vec::new();
    for id in ids {
        let row = tree.try_get_mut(*id)?;
        if row.note.take().is_some() {
            impacted.push(*id);
        }
    }
    outline.touch();
    Ok(ShadowTableChanges::reloading(outline.shadow_indices(&impacted)))
}

// ---------------------------------------------------------------------------
// Indent and outdent
// ---------------------------------------------------------------------------

pub fn is_move_rows_right_unavailable(outline: &Outline, ids: &[RowId]) -> bool {
    !ids.iter().any(|id| outline.tree().index_in_parent(*id).is_some_and(|i| i > 0))
}

/// Indent each row under its previous sibling, appending it to that
/// sibling's children and expanding it. First children stay put.
pub fn move_rows_right(outline: &mut Outline, ids: &[RowId]) -> Result<ShadowTableChanges, RowError> {
    let tree = outline.tree_mut();
    check_all(tree, ids)?;
    let mut reload = Vec::new();
    for id in sorted_by_display_order(tree, ids) {
        let Some(new_parent) = tree.previous_sibling(id) else {
            continue;
        };
        tree.try_get_mut(new_parent)?.set_expanded(true);
        let end = tree.children_of(Some(new_parent)).len();
        tree.move_row(id, Some(new_parent), end)?;
        reload.push(new_parent);
        reload.push(id);
        reload.extend(tree.descendants(id));
    }
    Ok(rebuild_with_reloads(outline, &reload))
}

pub fn is_move_rows_left_unavailable(outline: &Outline, ids: &[RowId]) -> bool {
    !ids.iter().any(|id| outline.tree().contains(*id) && outline.tree().level(*id) > 0)
}

/// Outdent each row to sit directly after its old parent. Later siblings
/// stay with the old parent.
pub fn move_rows_left(outline: &mut Outline, ids: &[RowId]) -> Result<ShadowTableChanges, RowError> {
    let tree = outline.tree_mut();
    check_all(tree, ids)?;
    let mut reload = Vec::new();
    let mut selection = sorted_with_descendants_filtered(tree, ids);
    selection.reverse();
    for id in selection {
        let Some(old_parent) = tree.parent_of(id) else {
            continue;
        };
        let grandparent = tree.parent_of(old_parent);
        let index = tree.index_in_parent(old_parent).map_or(0, |i| i + 1);
        tree.move_row(id, grandparent, index)?;
        reload.push(old_parent);
        reload.push(id);
        reload.extend(tree.descendants(id));
    }
    Ok(rebuild_with_reloads(outline, &reload))
}

// ---------------------------------------------------------------------------
// Reordering
// ---------------------------------------------------------------------------

fn share_parent(tree: &RowTree, first: RowId, ids: &[RowId]) -> bool {
    let parent = tree.parent_of(first);
    ids.iter().all(|id| tree.parent_of(*id) == parent)
}

pub fn is_move_rows_up_unavailable(outline: &Outline, ids: &[RowId]) -> bool {
    let tree = outline.tree();
    let Some(first) = sorted_by_display_order(tree, ids).first().copied() else {
        return true;
    };
    if !share_parent(tree, first, ids) {
        return true;
    }
    tree.index_in_parent(first).is_none_or(|i| i == 0)
}

pub fn is_move_rows_down_unavailable(outline: &Outline, ids: &[RowId]) -> bool {
    let tree = outline.tree();
    let Some(last) = sorted_by_display_order(tree, ids).last().copied() else {
        return true;
    };
    if !share_parent(tree, last, ids) {
        return true;
    }
    let siblings = tree.children_of(tree.parent_of(last)).len();
    tree.index_in_parent(last).is_none_or(|i| i + 1 == siblings)
}

/// Swap each row with its previous sibling.
pub fn move_rows_up(outline: &mut Outline, ids: &[RowId]) -> Result<ShadowTableChanges, RowError> {
    let tree = outline.tree_mut();
    check_all(tree, ids)?;
    for id in sorted_by_display_order(tree, ids) {
        if let Some(index) = tree.index_in_parent(id).filter(|i| *i > 0) {
            let parent = tree.parent_of(id);
            tree.move_row(id, parent, index - 1)?;
        }
    }
    Ok(rebuild_with_reloads(outline, &[]))
}

/// Swap each row with its next sibling.
pub fn move_rows_down(outline: &mut Outline, ids: &[RowId]) -> Result<ShadowTableChanges, RowError> {
    let tree = outline.tree_mut();
    check_all(tree, ids)?;
    for id in sorted_by_reverse_display_order(tree, ids) {
        let parent = tree.parent_of(id);
        let siblings = tree.children_of(parent).len();
        if let Some(index) = tree.index_in_parent(id).filter(|i| i + 1 < siblings) {
            tree.move_row(id, parent, index + 1)?;
        }
    }
    Ok(rebuild_with_reloads(outline, &[]))
}

/// Apply a batch of moves.
///
/// Moves into rows are applied before moves to the top level, each group in
/// destination order, so earlier inserts do not shift later targets. The
/// whole batch is checked against the parent links it would produce before
/// any row is touched, so an error leaves the tree unchanged.
pub fn move_rows(outline: &mut Outline, moves: &[RowMove]) -> Result<ShadowTableChanges, RowError> {
    let tree = outline.tree_mut();
    let mut sorted = moves.to_vec();
    sorted.sort_by_key(|m| {
        let parent_key = m.to_parent.map(|p| {
            tree.get(p)
                .and_then(|r| r.shadow_table_index)
                .map_or(-1, |i| i as i64)
        });
        // Row destinations sort before the top level
        (parent_key.is_none(), parent_key, m.to_index)
    });
    check_batch(tree, &sorted)?;

    let mut reload = Vec::new();
    for m in &sorted {
        if let Some(old_parent) = tree.parent_of(m.row) {
            reload.push(old_parent);
        }
        tree.move_row(m.row, m.to_parent, m.to_index)?;
        reload.extend(m.to_parent);
        reload.push(m.row);
        reload.extend(tree.descendants(m.row));
    }
    reload.retain(|id| tree.contains(*id));
    Ok(rebuild_with_reloads(outline, &reload))
}

/// Replay `moves` in order on parent links alone. Fails when a move names an
/// unknown row or would put a row under itself at the point it is applied.
fn check_batch(tree: &RowTree, moves: &[RowMove]) -> Result<(), RowError> {
    let mut parents: HashMap<RowId, Option<RowId>> = HashMap::new();
    for m in moves {
        tree.try_get(m.row)?;
        if let Some(parent) = m.to_parent {
            tree.try_get(parent)?;
            let mut current = Some(parent);
            while let Some(id) = current {
                if id == m.row {
                    return Err(RowError::WouldCreateCycle { row: m.row, parent });
                }
                current = parents.get(&id).copied().unwrap_or_else(|| tree.parent_of(id));
            }
        }
        parents.insert(m.row, m.to_parent);
    }
    Ok(())
}

/// Move `ids`, in order, to the start of `parent`'s children.
pub fn move_rows_inside_at_start(
    outline: &mut Outline,
    ids: &[RowId],
    parent: RowId,
) -> Result<ShadowTableChanges, RowError> {
    let moves: Vec<RowMove> = ids
        .iter()
        .enumerate()
        .map(|(i, row)| RowMove {
            row: *row,
            to_parent: Some(parent),
            to_index: i,
        })
        .collect();
    move_rows(outline, &moves)
}

/// Move `ids`, in order, after the existing children of `parent`.
pub fn move_rows_inside_at_end(
    outline: &mut Outline,
    ids: &[RowId],
    parent: RowId,
) -> Result<ShadowTableChanges, RowError> {
    let end = outline.tree().try_get(parent)?.children.len();
    let moves: Vec<RowMove> = ids
        .iter()
        .enumerate()
        .map(|(i, row)| RowMove {
            row: *row,
            to_parent: Some(parent),
            to_index: end + i,
        })
        .collect();
    move_rows(outline, &moves)
}

/// Move `ids` to follow `after`'s parent. Nothing happens when `after` is at
/// the top level.
pub fn move_rows_outside(outline: &mut Outline, ids: &[RowId], after: RowId) -> Result<ShadowTableChanges, RowError> {
    let tree = outline.tree();
    tree.try_get(after)?;
    let Some(parent) = tree.parent_of(after) else {
        return Ok(ShadowTableChanges::default());
    };
    let grandparent = tree.parent_of(parent);
    let start = tree.index_in_parent(parent).map_or(0, |i| i + 1);
    let moves: Vec<RowMove> = ids
        .iter()
        .enumerate()
        .map(|(i, row)| RowMove {
            row: *row,
            to_parent: grandparent,
            to_index: start + i,
        })
        .collect();
    move_rows(outline, &moves)
}

/// Move `ids` to be the siblings directly following `after`.
pub fn move_rows_directly_after(
    outline: &mut Outline,
    ids: &[RowId],
    after: RowId,
) -> Result<ShadowTableChanges, RowError> {
    let tree = outline.tree();
    tree.try_get(after)?;
    let parent = tree.parent_of(after);
    let start = tree.index_in_parent(after).map_or(0, |i| i + 1);
    let moves: Vec<RowMove> = ids
        .iter()
        .enumerate()
        .map(|(i, row)| RowMove {
            row: *row,
            to_parent: parent,
            to_index: start + i,
        })
        .collect();
    move_rows(outline, &moves)
}

/// Sort the selected rows by topic, ignoring case. Each sibling set is
/// sorted separately and the selected rows take over the positions they
/// already held, so unselected siblings do not move.
pub fn sort_rows(outline: &mut Outline, ids: &[RowId]) -> Result<ShadowTableChanges, RowError> {
    let tree = outline.tree_mut();
    check_all(tree, ids)?;
    let selected: HashSet<RowId> = ids.iter().copied().collect();

    let mut parents: Vec<Option<RowId>> = Vec::new();
    for id in ids {
        let parent = tree.parent_of(*id);
        if !parents.contains(&parent) {
            parents.push(parent);
        }
    }

    for parent in parents {
        let mut children = tree.children_of(parent).to_vec();
        let slots: Vec<usize> = (0..children.len()).filter(|i| selected.contains(&children[*i])).collect();
        let mut sorted: Vec<RowId> = slots.iter().map(|i| children[*i]).collect();
        sorted.sort_by_cached_key(|id| tree.get(*id).map(|r| fold_case(r.topic_text())).unwrap_or_default());
        for (slot, id) in slots.into_iter().zip(sorted) {
            children[slot] = id;
        }
        tree.reorder_children(parent, children)?;
    }
    Ok(rebuild_with_reloads(outline, &[]))
}
