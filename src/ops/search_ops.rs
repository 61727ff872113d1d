use crate::model::changes::ShadowTableChanges;
use crate::model::outline::{Outline, SearchState};
use crate::model::row::{RowId, SearchResultCoordinates};
use crate::visit::{RowVisitorMut, SearchOptions, SearchResultVisitor};

pub use crate::visit::search::SearchError;

/// Open a search with no text yet. Every row shows expanded until text is
/// entered.
pub fn begin_searching(outline: &mut Outline) -> ShadowTableChanges {
    outline.search_state = SearchState::BeginSearch;
    let mut changes = outline.rebuild_shadow_table();

    // Parents of newly revealed rows redraw their disclosure state
    let parents: Vec<RowId> = changes
        .inserts
        .iter()
        .filter_map(|i| outline.shadow_table().and_then(|t| t.get(*i)).copied())
        .filter_map(|id| outline.tree().parent_of(id))
        .collect();
    changes.merge(ShadowTableChanges::reloading(outline.shadow_indices(&parents)));
    changes
}

/// Search topics and notes for `text`. Empty text returns to the
/// [`BeginSearch`](SearchState::BeginSearch) state with no results; otherwise
/// only rows on a path to a match remain visible.
pub fn search(outline: &mut Outline, text: &str, options: SearchOptions) -> Result<ShadowTableChanges, SearchError> {
    // Compile first so a bad pattern leaves the previous search in place
    let visitor = if text.is_empty() {
        None
    } else {
        Some(SearchResultVisitor::new(
            text,
            options,
            outline.is_completed_filter_on(),
            outline.is_notes_filter_on(),
        )?)
    };

    let previous = clear_search_results(outline);
    outline.search_text = text.to_string();
    outline.search_options = options;

    match visitor {
        None => outline.search_state = SearchState::BeginSearch,
        Some(mut visitor) => {
            outline.search_state = SearchState::Searching;
            for root in outline.tree().roots().to_vec() {
                visitor.visit_row_mut(outline.tree_mut(), root);
            }
            outline.search_results = visitor.search_results;
        }
    }
    tracing::debug!(results = outline.search_results.len(), "searched outline");

    let mut changes = outline.rebuild_shadow_table();
    let mut reload = previous;
    reload.extend(outline.search_results.iter().map(|r| r.row));
    changes.merge(ShadowTableChanges::reloading(outline.shadow_indices(&reload)));
    Ok(changes)
}

/// Make the next match current, wrapping to the first.
pub fn next_search_result(outline: &mut Outline) -> ShadowTableChanges {
    let count = outline.search_results.len();
    if count == 0 {
        return ShadowTableChanges::default();
    }
    let next = (outline.current_search_result + 1) % count;
    change_search_result(outline, next)
}

/// Make the previous match current, wrapping to the last.
pub fn previous_search_result(outline: &mut Outline) -> ShadowTableChanges {
    let count = outline.search_results.len();
    if count == 0 {
        return ShadowTableChanges::default();
    }
    let previous = outline.current_search_result.checked_sub(1).unwrap_or(count - 1);
    change_search_result(outline, previous)
}

/// Close the search and restore the normal projection.
pub fn end_searching(outline: &mut Outline) -> ShadowTableChanges {
    clear_search_results(outline);
    outline.search_state = SearchState::NotSearching;
    outline.search_text.clear();
    let mut changes = outline.rebuild_shadow_table();

    // Collapsed rows redraw their disclosure state
    let collapsed: Vec<RowId> = outline
        .shadow_table()
        .unwrap_or_default()
        .iter()
        .filter(|id| outline.find_row(**id).is_some_and(|r| !r.is_expanded))
        .copied()
        .collect();
    changes.merge(ShadowTableChanges::reloading(outline.shadow_indices(&collapsed)));
    changes
}

pub fn current_search_result(outline: &Outline) -> Option<&SearchResultCoordinates> {
    outline.search_results.get(outline.current_search_result)
}

/// Row holding the current match
pub fn current_search_result_row(outline: &Outline) -> Option<RowId> {
    current_search_result(outline).map(|r| r.row)
}

pub fn search_result_count(outline: &Outline) -> usize {
    outline.search_results.len()
}

fn change_search_result(outline: &mut Outline, to: usize) -> ShadowTableChanges {
    let from = outline.current_search_result;
    let mut reload = Vec::new();
    for (index, current) in [(from, false), (to, true)] {
        let Some(result) = outline.search_results.get_mut(index) else {
            continue;
        };
        result.is_current = current;
        let result = result.clone();
        if let Some(row) = outline.tree_mut().get_mut(result.row) {
            for coordinates in &mut row.search_results {
                if coordinates.range == result.range && coordinates.is_in_notes == result.is_in_notes {
                    coordinates.is_current = current;
                }
            }
        }
        reload.push(result.row);
    }
    outline.current_search_result = to;
    ShadowTableChanges::reloading(outline.shadow_indices(&reload))
}

/// Forget every match. Returns the rows that held one.
fn clear_search_results(outline: &mut Outline) -> Vec<RowId> {
    let previous: Vec<RowId> = outline.search_results.drain(..).map(|r| r.row).collect();
    outline.current_search_result = 0;
    for row in outline.tree.iter_mut() {
        row.clear_search_results();
    }
    previous
}
