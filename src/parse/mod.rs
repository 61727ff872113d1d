pub mod markdown_list_parser;
pub mod opml_parser;

pub use markdown_list_parser::{parse_markdown_list, MarkdownListDocument};
pub use opml_parser::{parse_opml, OpmlDocument, OpmlError, OpmlHead};

/// A row read from an interchange format, before it joins an outline.
/// Topic and note hold inline markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRow {
    pub topic: Option<String>,
    pub note: Option<String>,
    pub is_complete: bool,
    pub children: Vec<ParsedRow>,
}

impl ParsedRow {
    /// Number of rows in this subtree, including this one
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ParsedRow::count).sum::<usize>()
    }
}
