use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::changes::ShadowTableChanges;
use crate::model::config::OutlinerConfig;
use crate::model::row::{Row, RowId, SearchResultCoordinates};
use crate::model::tree::{RowRef, RowTree};
use crate::visit::{RowVisitor, RowVisitorMut, SearchOptions, TransientDataVisitor};

/// Where the outline is in a search session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchState {
    #[default]
    NotSearching,
    /// Search UI is open but no text has been entered. Collapsed rows are
    /// shown expanded.
    BeginSearch,
    /// Only rows on a path to a match are shown.
    Searching,
}

/// A whole outline document: metadata, the row tree, and the view state that
/// decides which rows are visible.
///
/// Between [`load`](Outline::load) and [`unload`](Outline::unload) the outline
/// maintains a shadow table, the flat list of visible rows a list view
/// displays. Operations that change visibility rebuild it and report the
/// difference as [`ShadowTableChanges`]. While unloaded, the same operations
/// still edit the tree but report no changes.
#[derive(Debug, Clone)]
pub struct Outline {
    pub id: Uuid,
    pub title: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub owner_url: Option<String>,
    pub vertical_scroll_state: Option<usize>,

    pub(crate) tree: RowTree,
    pub(crate) shadow_table: Option<Vec<RowId>>,

    // --- View state ---
    pub(crate) search_state: SearchState,
    pub(crate) is_filter_on: bool,
    pub(crate) is_completed_filtered: bool,
    pub(crate) is_notes_filtered: bool,
    pub(crate) focus_row: Option<RowId>,

    // --- Search ---
    pub(crate) search_text: String,
    pub(crate) search_options: SearchOptions,
    pub(crate) search_results: Vec<SearchResultCoordinates>,
    pub(crate) current_search_result: usize,
}

impl Default for Outline {
    fn default() -> Self {
        Outline::with_config(None, &OutlinerConfig::default())
    }
}

impl Outline {
    pub fn new(title: impl Into<String>) -> Self {
        Outline::with_config(Some(title.into()), &OutlinerConfig::default())
    }

    pub fn with_config(title: Option<String>, config: &OutlinerConfig) -> Self {
        let now = Utc::now();
        Outline {
            id: Uuid::new_v4(),
            title,
            created: Some(now),
            updated: Some(now),
            owner_name: None,
            owner_email: None,
            owner_url: None,
            vertical_scroll_state: None,
            tree: RowTree::new(config.ordering.rebalance_threshold),
            shadow_table: None,
            search_state: SearchState::NotSearching,
            is_filter_on: false,
            is_completed_filtered: true,
            is_notes_filtered: true,
            focus_row: None,
            search_text: String::new(),
            search_options: SearchOptions {
                case_insensitive: config.search.case_insensitive,
                whole_words: config.search.whole_words,
            },
            search_results: Vec::new(),
            current_search_result: 0,
        }
    }

    /// Stamp the document as modified now
    pub fn touch(&mut self) {
        self.updated = Some(Utc::now());
    }

    // -----------------------------------------------------------------------
    // Rows
    // -----------------------------------------------------------------------

    pub fn tree(&self) -> &RowTree {
        &self.tree
    }

    /// Direct tree access for bulk construction. Callers that change
    /// structure while loaded should follow up with
    /// [`rebuild_shadow_table`](Outline::rebuild_shadow_table).
    pub fn tree_mut(&mut self) -> &mut RowTree {
        &mut self.tree
    }

    /// Top-level row ids in order
    pub fn rows(&self) -> &[RowId] {
        self.tree.roots()
    }

    pub fn row_count(&self) -> usize {
        self.tree.len()
    }

    pub fn find_row(&self, id: RowId) -> Option<&Row> {
        self.tree.get(id)
    }

    pub fn row_ref(&self, id: RowId) -> Option<RowRef<'_>> {
        self.tree.row_ref(id)
    }

    pub fn is_any_row_completed(&self) -> bool {
        self.tree.iter().any(|row| row.is_complete)
    }

    /// Run `visitor` over every top-level row in order
    pub fn visit_rows<V: RowVisitor>(&self, visitor: &mut V) {
        for root in self.tree.root_refs() {
            root.visit(visitor);
        }
    }

    // -----------------------------------------------------------------------
    // View state
    // -----------------------------------------------------------------------

    pub fn search_state(&self) -> SearchState {
        self.search_state
    }

    pub fn is_searching(&self) -> bool {
        self.search_state != SearchState::NotSearching
    }

    pub fn is_filter_on(&self) -> bool {
        self.is_filter_on
    }

    pub fn is_completed_filtered(&self) -> bool {
        self.is_completed_filtered
    }

    pub fn is_notes_filtered(&self) -> bool {
        self.is_notes_filtered
    }

    /// Completed rows are hidden
    pub fn is_completed_filter_on(&self) -> bool {
        self.is_filter_on && self.is_completed_filtered
    }

    /// Notes are hidden
    pub fn is_notes_filter_on(&self) -> bool {
        self.is_filter_on && self.is_notes_filtered
    }

    pub fn focus_row(&self) -> Option<RowId> {
        self.focus_row
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn search_options(&self) -> SearchOptions {
        self.search_options
    }

    pub fn search_results(&self) -> &[SearchResultCoordinates] {
        &self.search_results
    }

    // -----------------------------------------------------------------------
    // Shadow table
    // -----------------------------------------------------------------------

    pub fn is_loaded(&self) -> bool {
        self.shadow_table.is_some()
    }

    /// Start maintaining the shadow table.
    pub fn load(&mut self) {
        if self.is_loaded() {
            return;
        }
        self.tree.reestablish_parents();
        self.shadow_table = Some(Vec::new());
        self.rebuild_shadow_table();
        tracing::debug!(outline = %self.id, rows = self.tree.len(), "loaded outline");
    }

    /// Stop maintaining the shadow table and forget every row's index.
    pub fn unload(&mut self) {
        self.shadow_table = None;
        for row in self.tree.iter_mut() {
            row.shadow_table_index = None;
        }
        tracing::debug!(outline = %self.id, "unloaded outline");
    }

    /// Visible rows in display order, `None` while unloaded
    pub fn shadow_table(&self) -> Option<&[RowId]> {
        self.shadow_table.as_deref()
    }

    /// The visible row at `index`
    pub fn row_at(&self, index: usize) -> Option<&Row> {
        let id = self.shadow_table.as_ref()?.get(index)?;
        self.tree.get(*id)
    }

    /// Recompute visibility and report how the table changed. Returns no
    /// changes while unloaded.
    pub fn rebuild_shadow_table(&mut self) -> ShadowTableChanges {
        let Some(old) = self.shadow_table.take() else {
            return ShadowTableChanges::default();
        };

        let visitor = self.rebuild_transient_data();
        let mut changes = ShadowTableChanges::diff(&old, &visitor.shadow_table);
        changes.reloads.extend(visitor.reloads);
        tracing::debug!(
            visible = visitor.shadow_table.len(),
            deletes = changes.deletes.len(),
            inserts = changes.inserts.len(),
            moves = changes.moves.len(),
            "rebuilt shadow table"
        );
        self.shadow_table = Some(visitor.shadow_table);
        changes
    }

    fn rebuild_transient_data(&mut self) -> TransientDataVisitor {
        let mut visitor = TransientDataVisitor::new(self.is_completed_filter_on(), self.search_state, false);

        if self.focus_row.is_some_and(|f| !self.tree.contains(f)) {
            self.focus_row = None;
        }

        match self.focus_row {
            Some(focus) => {
                // Rows outside the focused subtree are never visited
                for row in self.tree.iter_mut() {
                    row.shadow_table_index = None;
                }
                visitor.visit_row_mut(&mut self.tree, focus);
            }
            None => {
                for root in self.tree.roots().to_vec() {
                    if let Some(row) = self.tree.get_mut(root) {
                        row.parent = None;
                    }
                    visitor.visit_row_mut(&mut self.tree, root);
                }
            }
        }
        visitor
    }

    /// Shadow indices of `ids` that are currently visible
    pub fn shadow_indices(&self, ids: &[RowId]) -> Vec<usize> {
        ids.iter()
            .filter_map(|id| self.tree.get(*id).and_then(|r| r.shadow_table_index))
            .collect()
    }

    /// Indices of `id` and every visible row below it
    pub(crate) fn subtree_shadow_indices(&self, id: RowId) -> Vec<usize> {
        let mut ids = vec![id];
        ids.extend(self.tree.descendants(id));
        self.shadow_indices(&ids)
    }
}
