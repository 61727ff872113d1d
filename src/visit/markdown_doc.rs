use crate::model::tree::RowRef;
use crate::visit::{MarkdownListVisitor, RowVisitor};

/// Writes rows as a markdown document.
///
/// A row with both topic and note becomes a heading followed by a paragraph,
/// and its children continue in document form. A row with only a topic
/// starts a bullet list holding its whole subtree. A row with only a note is
/// a bare paragraph.
#[derive(Debug, Default)]
pub struct MarkdownDocVisitor {
    pub indent_level: usize,
    pub markdown: String,
    previous_row_was_paragraph: bool,
}

impl MarkdownDocVisitor {
    pub fn new() -> Self {
        MarkdownDocVisitor::default()
    }

    fn visit_children(&mut self, row: RowRef<'_>) {
        self.indent_level += 1;
        for child in row.children() {
            child.visit(self);
        }
        self.indent_level -= 1;
    }
}

impl RowVisitor for MarkdownDocVisitor {
    fn visit_row(&mut self, row: RowRef<'_>) {
        let topic = row.topic.as_ref().map(|t| t.to_markdown()).filter(|t| !t.is_empty());
        let note = row.note.as_ref().map(|n| n.to_markdown()).filter(|n| !n.is_empty());

        match (topic, note) {
            (Some(topic), Some(note)) => {
                self.markdown.push_str("\n\n");
                self.markdown.push_str(&"#".repeat(self.indent_level + 2));
                self.markdown.push_str(&format!(" {topic}\n\n{note}"));
                self.previous_row_was_paragraph = true;
                self.visit_children(row);
            }
            (Some(_), None) => {
                if self.previous_row_was_paragraph {
                    self.markdown.push('\n');
                }
                self.markdown.push('\n');
                let mut list = MarkdownListVisitor::new();
                row.visit(&mut list);
                self.markdown.push_str(&list.markdown);
                self.previous_row_was_paragraph = false;
            }
            (None, note) => {
                match note {
                    Some(note) => {
                        self.markdown.push_str(&format!("\n\n{note}"));
                        self.previous_row_was_paragraph = true;
                    }
                    None => self.previous_row_was_paragraph = false,
                }
                self.visit_children(row);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::row::Row;
    use crate::model::tree::RowTree;
    use pretty_assertions::assert_eq;

    fn render(tree: &RowTree) -> String {
        let mut visitor = MarkdownDocVisitor::new();
        for root in tree.root_refs() {
            root.visit(&mut visitor);
        }
        visitor.markdown
    }

    #[test]
    fn test_heading_then_list() {
        let mut tree = RowTree::default();
        let mut section = Row::with_topic("Intro");
        section.note = Some("Some words.".into());
        let s = tree.append(section, None).unwrap();
        let item = tree.append(Row::with_topic("point one"), Some(s)).unwrap();
        tree.append(Row::with_topic("detail"), Some(item)).unwrap();
        tree.append(Row::with_topic("point two"), Some(s)).unwrap();

        assert_eq!(
            render(&tree),
            "\n\n## Intro\n\nSome words.\n\n* point one\n\t* detail\n* point two"
        );
    }

    #[test]
    fn test_note_only_row_is_paragraph() {
        let mut tree = RowTree::default();
        let mut row = Row::new();
        row.note = Some("just text".into());
        let r = tree.append(row, None).unwrap();
        let mut sub = Row::with_topic("Deeper");
        sub.note = Some("body".into());
        tree.append(sub, Some(r)).unwrap();

        assert_eq!(render(&tree), "\n\njust text\n\n### Deeper\n\nbody");
    }

    #[test]
    fn test_empty_tree() {
        assert_eq!(render(&RowTree::default()), "");
    }
}
