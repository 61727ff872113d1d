//! Print layout as styled spans.
//!
//! The buffer stays renderer-neutral: each span carries a font size, serif
//! flag, indents in points and the strike/dim state a printer should apply.

use crate::model::tree::RowRef;
use crate::visit::RowVisitor;

const BODY_FONT_SIZE: u16 = 11;
const TITLE_FONT_SIZE: u16 = 18;
const INDENT_STEP: u16 = 20;
const TEXT_INSET: u16 = 10;
const BULLET: &str = "\u{2022}\t";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintSpan {
    pub text: String,
    pub font_size: u16,
    pub serif: bool,
    pub strikethrough: bool,
    /// Drawn in the secondary text color
    pub dimmed: bool,
    pub first_line_indent: u16,
    pub head_indent: u16,
}

impl PrintSpan {
    fn plain(text: &str) -> Self {
        PrintSpan {
            text: text.to_string(),
            font_size: BODY_FONT_SIZE,
            serif: false,
            strikethrough: false,
            dimmed: false,
            first_line_indent: 0,
            head_indent: 0,
        }
    }

    /// Document title above the rows
    pub fn title(text: &str) -> Self {
        PrintSpan {
            font_size: TITLE_FONT_SIZE,
            ..PrintSpan::plain(text)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrintBuffer {
    pub spans: Vec<PrintSpan>,
}

impl PrintBuffer {
    pub fn push(&mut self, span: PrintSpan) {
        self.spans.push(span);
    }

    pub fn push_plain(&mut self, text: &str) {
        self.spans.push(PrintSpan::plain(text));
    }

    pub fn append(&mut self, other: PrintBuffer) {
        self.spans.extend(other.spans);
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Concatenated text of every span
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

fn topic_font_size(level: usize) -> u16 {
    if level < 3 {
        18 - ((level as u16 + 1) * 2)
    } else {
        12
    }
}

fn non_empty(text: &str) -> Option<&str> {
    (!text.is_empty()).then_some(text)
}

// ---------------------------------------------------------------------------
// Document layout
// ---------------------------------------------------------------------------

/// Lays rows out like [`MarkdownDocVisitor`](crate::visit::MarkdownDocVisitor):
/// headings with serif paragraphs, topic-only subtrees as bullet lists.
#[derive(Debug, Default)]
pub struct PrintDocVisitor {
    pub indent_level: usize,
    pub print: PrintBuffer,
    previous_row_was_paragraph: bool,
}

impl PrintDocVisitor {
    pub fn new() -> Self {
        PrintDocVisitor::default()
    }

    fn visit_children(&mut self, row: RowRef<'_>) {
        self.indent_level += 1;
        for child in row.children() {
            child.visit(self);
        }
        self.indent_level -= 1;
    }

    fn print_topic(&mut self, topic: &str, row: RowRef<'_>) {
        self.print.push_plain("\n\n");
        self.print.push(PrintSpan {
            text: topic.to_string(),
            font_size: topic_font_size(self.indent_level),
            serif: true,
            strikethrough: row.is_complete,
            dimmed: row.is_complete || row.is_any_parent_complete(),
            first_line_indent: 0,
            head_indent: 0,
        });
    }

    fn print_note(&mut self, note: &str) {
        self.print.push(PrintSpan {
            text: format!("\n{note}"),
            font_size: BODY_FONT_SIZE,
            serif: true,
            strikethrough: false,
            dimmed: true,
            first_line_indent: 0,
            head_indent: 0,
        });
    }
}

impl RowVisitor for PrintDocVisitor {
    fn visit_row(&mut self, row: RowRef<'_>) {
        let topic = non_empty(row.topic_text());
        let note = non_empty(row.note_text());

        match (topic, note) {
            (Some(topic), Some(note)) => {
                self.print_topic(topic, row);
                self.print_note(note);
                self.previous_row_was_paragraph = true;
                self.visit_children(row);
            }
            (Some(_), None) => {
                if self.previous_row_was_paragraph {
                    self.print.push_plain("\n");
                }
                let mut list = PrintListVisitor::new();
                list.indent_level = 1;
                row.visit(&mut list);
                self.print.append(list.print);
                self.previous_row_was_paragraph = false;
            }
            (None, note) => {
                match note {
                    Some(note) => {
                        self.print_note(note);
                        self.previous_row_was_paragraph = true;
                    }
                    None => self.previous_row_was_paragraph = false,
                }
                self.visit_children(row);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// List layout
// ---------------------------------------------------------------------------

/// Lays a row and its subtree out as an indented bullet list.
#[derive(Debug, Default)]
pub struct PrintListVisitor {
    pub indent_level: usize,
    pub print: PrintBuffer,
}

impl PrintListVisitor {
    pub fn new() -> Self {
        PrintListVisitor::default()
    }
}

impl RowVisitor for PrintListVisitor {
    fn visit_row(&mut self, row: RowRef<'_>) {
        let indent = self.indent_level as u16 * INDENT_STEP;

        if let Some(topic) = non_empty(row.topic_text()) {
            self.print.push_plain("\n");
            self.print.push(PrintSpan {
                text: format!("{BULLET}{topic}"),
                font_size: BODY_FONT_SIZE,
                serif: false,
                strikethrough: row.is_complete,
                dimmed: row.is_complete || row.is_any_parent_complete(),
                first_line_indent: indent,
                head_indent: indent + TEXT_INSET,
            });
        }

        if let Some(note) = non_empty(row.note_text()) {
            self.print.push(PrintSpan {
                text: format!("\n{note}"),
                font_size: BODY_FONT_SIZE,
                serif: true,
                strikethrough: false,
                dimmed: true,
                first_line_indent: indent + TEXT_INSET,
                head_indent: indent + TEXT_INSET,
            });
        }

        self.indent_level += 1;
        for child in row.children() {
            child.visit(self);
        }
        self.indent_level -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::row::Row;
    use crate::model::tree::RowTree;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_topic_font_sizes() {
        assert_eq!(topic_font_size(0), 16);
        assert_eq!(topic_font_size(1), 14);
        assert_eq!(topic_font_size(2), 12);
        assert_eq!(topic_font_size(5), 12);
    }

    #[test]
    fn test_list_layout() {
        let mut tree = RowTree::default();
        let mut parent = Row::with_topic("parent");
        parent.is_complete = true;
        let p = tree.append(parent, None).unwrap();
        let mut child = Row::with_topic("child");
        child.note = Some("note".into());
        tree.append(child, Some(p)).unwrap();

        let mut visitor = PrintListVisitor::new();
        tree.row_ref(p).unwrap().visit(&mut visitor);
        let spans = &visitor.print.spans;

        assert_eq!(visitor.print.text(), "\n\u{2022}\tparent\n\u{2022}\tchild\nnote");
        assert!(spans[1].strikethrough && spans[1].dimmed);
        // Child is dimmed by its completed parent but not struck through
        assert!(!spans[3].strikethrough && spans[3].dimmed);
        assert_eq!(spans[3].first_line_indent, 20);
        assert_eq!(spans[3].head_indent, 30);
        assert_eq!(spans[4].first_line_indent, 30);
        assert!(spans[4].serif);
    }

    #[test]
    fn test_doc_layout() {
        let mut tree = RowTree::default();
        let mut section = Row::with_topic("Heading");
        section.note = Some("Body".into());
        let s = tree.append(section, None).unwrap();
        tree.append(Row::with_topic("item"), Some(s)).unwrap();

        let mut visitor = PrintDocVisitor::new();
        for root in tree.root_refs() {
            root.visit(&mut visitor);
        }
        assert_eq!(visitor.print.text(), "\n\nHeading\nBody\n\n\u{2022}\titem");
        assert_eq!(visitor.print.spans[1].font_size, 16);
        assert!(visitor.print.spans[1].serif);
        // List items under a heading start one indent in
        let item = visitor.print.spans.last().unwrap();
        assert_eq!(item.first_line_indent, 20);
    }
}
