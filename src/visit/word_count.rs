use crate::model::tree::RowRef;
use crate::util::unicode::word_count;
use crate::visit::RowVisitor;

/// Counts the words in topics and notes of a row and its subtree.
#[derive(Debug, Default)]
pub struct WordCountVisitor {
    pub count: usize,
}

impl WordCountVisitor {
    pub fn new() -> Self {
        WordCountVisitor::default()
    }
}

impl RowVisitor for WordCountVisitor {
    fn visit_row(&mut self, row: RowRef<'_>) {
        self.count += word_count(row.topic_text());
        self.count += word_count(row.note_text());
        for child in row.children() {
            child.visit(self);
        }
    }
}
