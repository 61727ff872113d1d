//! Depth-first traversals over an outline's rows.
//!
//! Each traversal is its own visitor type. A visitor receives one row and
//! decides for itself whether and how to descend into the children, which is
//! what lets the markdown document visitor hand a whole subtree to the list
//! visitor.

pub mod markdown_doc;
pub mod markdown_list;
pub mod opml;
pub mod plain_text;
pub mod print;
pub mod search;
pub mod transient;
pub mod word_count;

use crate::model::row::RowId;
use crate::model::tree::{RowRef, RowTree};

/// A read-only traversal
pub trait RowVisitor {
    fn visit_row(&mut self, row: RowRef<'_>);
}

/// A traversal that writes transient state back into the rows
pub trait RowVisitorMut {
    fn visit_row_mut(&mut self, tree: &mut RowTree, id: RowId);
}

pub use markdown_doc::MarkdownDocVisitor;
pub use markdown_list::MarkdownListVisitor;
pub use opml::{escape_xml, OpmlVisitor};
pub use plain_text::PlainTextVisitor;
pub use print::{PrintBuffer, PrintDocVisitor, PrintListVisitor, PrintSpan};
pub use search::{SearchOptions, SearchResultVisitor};
pub use transient::TransientDataVisitor;
pub use word_count::WordCountVisitor;
