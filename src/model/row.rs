use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::rich_text::RichText;

/// Stable identity of a row, unique within an outline and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(Uuid);

impl RowId {
    pub fn new() -> Self {
        RowId(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        RowId(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RowId {
    fn default() -> Self {
        RowId::new()
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where one search match sits inside a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResultCoordinates {
    pub row: RowId,
    /// Match is in the note rather than the topic
    pub is_in_notes: bool,
    /// Byte range into the plain topic or note text
    pub range: Range<usize>,
    pub is_current: bool,
}

/// A single node of an outline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    /// Headline text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<RichText>,
    /// Body text shown under the topic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<RichText>,
    #[serde(default)]
    pub is_complete: bool,
    /// Rows start out expanded; persisted rows missing the field load expanded.
    #[serde(default = "default_true")]
    pub is_expanded: bool,
    /// Fractional order key among siblings
    pub order: String,
    /// Parent row, `None` at the top level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) parent: Option<RowId>,

    // --- Structure, rebuilt from parent links and order keys ---
    /// Child ids sorted by ascending order key
    #[serde(skip)]
    pub(crate) children: Vec<RowId>,

    // --- Transient ---
    /// Position in the shadow table from the last projection pass
    #[serde(skip)]
    pub shadow_table_index: Option<usize>,
    #[serde(skip)]
    pub is_part_of_search_result: bool,
    #[serde(skip)]
    pub search_results: Vec<SearchResultCoordinates>,
}

fn default_true() -> bool {
    true
}

impl Row {
    /// Create an empty, expanded, incomplete row with a fresh id. The order
    /// key is assigned when the row is inserted into a tree.
    pub fn new() -> Self {
        Row::with_id(RowId::new())
    }

    pub fn with_id(id: RowId) -> Self {
        Row {
            id,
            topic: None,
            note: None,
            is_complete: false,
            is_expanded: true,
            order: String::new(),
            parent: None,
            children: Vec::new(),
            shadow_table_index: None,
            is_part_of_search_result: false,
            search_results: Vec::new(),
        }
    }

    /// Create a row whose topic is parsed from inline markdown
    pub fn with_topic(markdown: &str) -> Self {
        let mut row = Row::new();
        row.topic = Some(RichText::from_markdown(markdown));
        row
    }

    pub fn parent(&self) -> Option<RowId> {
        self.parent
    }

    pub fn children(&self) -> &[RowId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Plain topic text, empty when there is no topic
    pub fn topic_text(&self) -> &str {
        self.topic.as_ref().map_or("", RichText::as_str)
    }

    /// Plain note text, empty when there is no note
    pub fn note_text(&self) -> &str {
        self.note.as_ref().map_or("", RichText::as_str)
    }

    pub fn is_note_empty(&self) -> bool {
        self.note.as_ref().is_none_or(RichText::is_empty)
    }

    /// Collapsed with children to reveal
    pub fn is_expandable(&self) -> bool {
        !self.is_expanded && self.has_children()
    }

    /// Expanded with children to hide
    pub fn is_collapsable(&self) -> bool {
        self.is_expanded && self.has_children()
    }

    // -----------------------------------------------------------------------
    // Mutators. None of these touch `shadow_table_index`; the next projection
    // pass recomputes it.
    // -----------------------------------------------------------------------

    pub fn set_complete(&mut self, complete: bool) {
        self.is_complete = complete;
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        self.is_expanded = expanded;
    }

    /// Replace the topic. Empty text clears it.
    pub fn update_topic(&mut self, topic: Option<RichText>) {
        self.topic = topic.filter(|t| !t.is_empty());
    }

    /// Replace the note. Empty text clears it.
    pub fn update_note(&mut self, note: Option<RichText>) {
        self.note = note.filter(|n| !n.is_empty());
    }

    /// Insert `child` into the child list at `at` (clamped to the end).
    pub fn attach_child(&mut self, child: RowId, at: usize) {
        let at = at.min(self.children.len());
        self.children.insert(at, child);
    }

    /// Remove `child` from the child list, returning where it was.
    pub fn detach_child(&mut self, child: RowId) -> Option<usize> {
        let index = self.children.iter().position(|c| *c == child)?;
        self.children.remove(index);
        Some(index)
    }

    pub(crate) fn clear_search_results(&mut self) {
        self.is_part_of_search_result = false;
        self.search_results.clear();
    }
}

impl Default for Row {
    fn default() -> Self {
        Row::new()
    }
}
