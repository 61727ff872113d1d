use crate::model::tree::RowRef;
use crate::visit::RowVisitor;

/// Collects the plain text of a row and its subtree, one topic or note per
/// line, tab-indented by depth. Styling is dropped.
#[derive(Debug, Default)]
pub struct PlainTextVisitor {
    pub indent_level: usize,
    pub string: String,
}

impl PlainTextVisitor {
    pub fn new() -> Self {
        PlainTextVisitor::default()
    }

    fn push_line(&mut self, text: &str) {
        if !self.string.is_empty() {
            self.string.push('\n');
        }
        self.string.push_str(&"\t".repeat(self.indent_level));
        self.string.push_str(text);
    }
}

impl RowVisitor for PlainTextVisitor {
    fn visit_row(&mut self, row: RowRef<'_>) {
        self.push_line(row.topic_text());
        if !row.is_note_empty() {
            self.push_line(row.note_text());
        }

        self.indent_level += 1;
        for child in row.children() {
            child.visit(self);
        }
        self.indent_level -= 1;
    }
}
