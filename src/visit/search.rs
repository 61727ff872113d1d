use regex::{Regex, RegexBuilder};

use crate::model::row::{RowId, SearchResultCoordinates};
use crate::model::tree::RowTree;
use crate::visit::RowVisitorMut;

/// Error type for search operations
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// How search text is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub case_insensitive: bool,
    /// Only match at word boundaries
    pub whole_words: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            case_insensitive: true,
            whole_words: false,
        }
    }
}

/// Build the matcher for literal `text` under `options`.
pub fn search_regex(text: &str, options: SearchOptions) -> Result<Regex, SearchError> {
    let escaped = regex::escape(text);
    let pattern = if options.whole_words {
        format!(r"\b{escaped}\b")
    } else {
        escaped
    };
    Ok(RegexBuilder::new(&pattern)
        .case_insensitive(options.case_insensitive)
        .build()?)
}

/// Finds every match of the search text in topics and notes.
///
/// Visits rows whether or not they are visible. Completed rows and their
/// subtrees are skipped while the completed filter is on, and notes are not
/// searched while the notes filter is on. A row with a match is flagged as
/// part of the search result together with all of its ancestors, so the
/// projection can keep the path to it visible.
pub struct SearchResultVisitor {
    regex: Regex,
    is_completed_filter_on: bool,
    is_notes_filter_on: bool,
    pub search_results: Vec<SearchResultCoordinates>,
}

impl SearchResultVisitor {
    pub fn new(
        text: &str,
        options: SearchOptions,
        is_completed_filter_on: bool,
        is_notes_filter_on: bool,
    ) -> Result<Self, SearchError> {
        Ok(SearchResultVisitor {
            regex: search_regex(text, options)?,
            is_completed_filter_on,
            is_notes_filter_on,
            search_results: Vec::new(),
        })
    }

    fn matches(&self, id: RowId, text: &str, is_in_notes: bool) -> Vec<SearchResultCoordinates> {
        self.regex
            .find_iter(text)
            .map(|m| SearchResultCoordinates {
                row: id,
                is_in_notes,
                range: m.start()..m.end(),
                is_current: false,
            })
            .collect()
    }
}

impl RowVisitorMut for SearchResultVisitor {
    fn visit_row_mut(&mut self, tree: &mut RowTree, id: RowId) {
        let Some(row) = tree.get(id) else {
            return;
        };
        if self.is_completed_filter_on && row.is_complete {
            return;
        }

        let mut found = self.matches(id, row.topic_text(), false);
        if !self.is_notes_filter_on {
            found.extend(self.matches(id, row.note_text(), true));
        }
        let children = row.children.clone();

        if !found.is_empty() {
            if self.search_results.is_empty() {
                found[0].is_current = true;
            }
            let ancestors: Vec<RowId> = tree.ancestors(id).collect();
            for ancestor in ancestors {
                if let Some(a) = tree.get_mut(ancestor) {
                    a.is_part_of_search_result = true;
                }
            }
            if let Some(row) = tree.get_mut(id) {
                row.is_part_of_search_result = true;
                row.search_results.extend(found.iter().cloned());
            }
            self.search_results.extend(found);
        }

        for child in children {
            self.visit_row_mut(tree, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::row::Row;
    use pretty_assertions::assert_eq;

    fn run(tree: &mut RowTree, text: &str, options: SearchOptions, completed: bool, notes: bool) -> SearchResultVisitor {
        let mut visitor = SearchResultVisitor::new(text, options, completed, notes).unwrap();
        for root in tree.roots().to_vec() {
            visitor.visit_row_mut(tree, root);
        }
        visitor
    }

    #[test]
    fn test_matches_topics_and_notes() {
        let mut tree = RowTree::default();
        let mut row = Row::with_topic("Buy apples");
        row.note = Some("apple pie recipe".into());
        let id = tree.append(row, None).unwrap();

        let visitor = run(&mut tree, "apple", SearchOptions::default(), false, false);
        assert_eq!(visitor.search_results.len(), 2);
        assert_eq!(visitor.search_results[0].range, 4..9);
        assert!(visitor.search_results[0].is_current);
        assert!(!visitor.search_results[1].is_current);
        assert!(visitor.search_results[1].is_in_notes);
        assert!(tree.get(id).unwrap().is_part_of_search_result);
    }

    #[test]
    fn test_notes_filter_skips_notes() {
        let mut tree = RowTree::default();
        let mut row = Row::with_topic("topic");
        row.note = Some("needle".into());
        tree.append(row, None).unwrap();
        let visitor = run(&mut tree, "needle", SearchOptions::default(), false, true);
        assert!(visitor.search_results.is_empty());
    }

    #[test]
    fn test_ancestors_are_marked() {
        let mut tree = RowTree::default();
        let p = tree.append(Row::with_topic("parent"), None).unwrap();
        let c = tree.append(Row::with_topic("child"), Some(p)).unwrap();
        let g = tree.append(Row::with_topic("needle"), Some(c)).unwrap();
        let other = tree.append(Row::with_topic("other"), None).unwrap();

        run(&mut tree, "needle", SearchOptions::default(), false, false);
        for id in [p, c, g] {
            assert!(tree.get(id).unwrap().is_part_of_search_result);
        }
        assert!(!tree.get(other).unwrap().is_part_of_search_result);
    }

    #[test]
    fn test_completed_filter_skips_subtree() {
        let mut tree = RowTree::default();
        let mut done = Row::with_topic("needle done");
        done.is_complete = true;
        let d = tree.append(done, None).unwrap();
        tree.append(Row::with_topic("needle below"), Some(d)).unwrap();

        assert!(run(&mut tree, "needle", SearchOptions::default(), true, false).search_results.is_empty());
        assert_eq!(run(&mut tree, "needle", SearchOptions::default(), false, false).search_results.len(), 2);
    }

    #[test]
    fn test_case_and_whole_word_options() {
        let mut tree = RowTree::default();
        tree.append(Row::with_topic("Cat catalog cat"), None).unwrap();

        let sensitive = SearchOptions { case_insensitive: false, whole_words: false };
        assert_eq!(run(&mut tree, "cat", sensitive, false, false).search_results.len(), 2);

        let words = SearchOptions { case_insensitive: true, whole_words: true };
        let ranges: Vec<_> = run(&mut tree, "cat", words, false, false)
            .search_results
            .into_iter()
            .map(|r| r.range)
            .collect();
        assert_eq!(ranges, vec![0..3, 12..15]);
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let mut tree = RowTree::default();
        tree.append(Row::with_topic("cost (approx.) 3+4"), None).unwrap();
        assert_eq!(run(&mut tree, "(approx.)", SearchOptions::default(), false, false).search_results.len(), 1);
        assert_eq!(run(&mut tree, "3+4", SearchOptions::default(), false, false).search_results.len(), 1);
    }
}
