//! JSON persistence for a whole outline.
//!
//! Rows are stored flat, each with its parent id and order key, so the tree
//! is rebuilt from keys on load. Keys are kept byte for byte.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::model::config::OutlinerConfig;
use crate::model::outline::Outline;
use crate::model::row::{Row, RowId};
use crate::model::tree::{RowError, RowTree};

/// Error type for saving and loading outlines
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("invalid outline JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("row error: {0}")]
    Row(#[from] RowError),
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredOutline {
    id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vertical_scroll_state: Option<usize>,
    #[serde(default)]
    is_filter_on: bool,
    #[serde(default = "default_true")]
    is_completed_filtered: bool,
    #[serde(default = "default_true")]
    is_notes_filtered: bool,
    /// Pre-order, so every parent precedes its children
    #[serde(default)]
    rows: Vec<Row>,
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Atomic file write
// ---------------------------------------------------------------------------

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

pub fn to_json(outline: &Outline) -> Result<String, StoreError> {
    let tree = outline.tree();
    let stored = StoredOutline {
        id: outline.id,
        title: outline.title.clone(),
        created: outline.created,
        updated: outline.updated,
        owner_name: outline.owner_name.clone(),
        owner_email: outline.owner_email.clone(),
        owner_url: outline.owner_url.clone(),
        vertical_scroll_state: outline.vertical_scroll_state,
        is_filter_on: outline.is_filter_on(),
        is_completed_filtered: outline.is_completed_filtered(),
        is_notes_filtered: outline.is_notes_filtered(),
        rows: tree.preorder().iter().filter_map(|id| tree.get(*id)).cloned().collect(),
    };
    Ok(serde_json::to_string_pretty(&stored)?)
}

/// Rebuild an outline from its JSON form.
///
/// Rows whose parent is missing, or that sit on a parent cycle, are moved
/// to the top level rather than dropped. Sibling sets with duplicate or
/// malformed keys are rekeyed.
pub fn from_json(json: &str, config: &OutlinerConfig) -> Result<Outline, StoreError> {
    let stored: StoredOutline = serde_json::from_str(json)?;

    let mut outline = Outline::with_config(stored.title, config);
    outline.id = stored.id;
    outline.created = stored.created;
    outline.updated = stored.updated;
    outline.owner_name = stored.owner_name;
    outline.owner_email = stored.owner_email;
    outline.owner_url = stored.owner_url;
    outline.vertical_scroll_state = stored.vertical_scroll_state;
    outline.is_filter_on = stored.is_filter_on;
    outline.is_completed_filtered = stored.is_completed_filtered;
    outline.is_notes_filtered = stored.is_notes_filtered;

    build_tree(outline.tree_mut(), stored.rows)?;
    outline.tree_mut().sort_children_by_order();
    Ok(outline)
}

fn build_tree(tree: &mut RowTree, rows: Vec<Row>) -> Result<(), RowError> {
    let ids: HashSet<RowId> = rows.iter().map(|r| r.id).collect();
    let mut by_parent: HashMap<Option<RowId>, Vec<Row>> = HashMap::new();
    let mut order: Vec<RowId> = Vec::with_capacity(rows.len());
    for mut row in rows {
        if let Some(parent) = row.parent() {
            if !ids.contains(&parent) || parent == row.id {
                tracing::warn!(row = %row.id, parent = %parent, "dangling parent reference, moving row to top level");
                row.parent = None;
            }
        }
        order.push(row.id);
        by_parent.entry(row.parent()).or_default().push(row);
    }

    let mut pending: Vec<Option<RowId>> = vec![None];
    while let Some(parent) = pending.pop() {
        for row in by_parent.remove(&parent).unwrap_or_default() {
            let id = tree.insert_keyed(row, parent)?;
            pending.push(Some(id));
        }
    }

    // Anything left is on a parent cycle; break it at the first row seen
    for id in order {
        if tree.contains(id) {
            continue;
        }
        let Some(mut row) = by_parent.values_mut().find_map(|siblings| {
            siblings.iter().position(|r| r.id == id).map(|i| siblings.remove(i))
        }) else {
            continue;
        };
        tracing::warn!(row = %id, "parent cycle, moving row to top level");
        row.parent = None;
        let id = tree.insert_keyed(row, None)?;
        let mut pending = vec![Some(id)];
        while let Some(parent) = pending.pop() {
            for row in by_parent.remove(&parent).unwrap_or_default() {
                let id = tree.insert_keyed(row, parent)?;
                pending.push(Some(id));
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

pub fn save_outline(path: &Path, outline: &Outline) -> Result<(), StoreError> {
    let json = to_json(outline)?;
    atomic_write(path, json.as_bytes()).map_err(|e| StoreError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), rows = outline.row_count(), "saved outline");
    Ok(())
}

pub fn load_outline(path: &Path, config: &OutlinerConfig) -> Result<Outline, StoreError> {
    let json = fs::read_to_string(path).map_err(|e| StoreError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let outline = from_json(&json, config)?;
    tracing::debug!(path = %path.display(), rows = outline.row_count(), "loaded outline");
    Ok(outline)
}
