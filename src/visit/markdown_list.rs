use crate::model::tree::RowRef;
use crate::util::unicode::paragraphs;
use crate::visit::RowVisitor;

/// Writes a row and its subtree as a tab-indented markdown bullet list.
///
/// Completed topics are struck through. Note paragraphs follow their item,
/// indented to the item's level plus two spaces.
#[derive(Debug, Default)]
pub struct MarkdownListVisitor {
    pub indent_level: usize,
    pub markdown: String,
}

impl MarkdownListVisitor {
    pub fn new() -> Self {
        MarkdownListVisitor::default()
    }
}

impl RowVisitor for MarkdownListVisitor {
    fn visit_row(&mut self, row: RowRef<'_>) {
        let tabs = "\t".repeat(self.indent_level);
        let topic = row.topic.as_ref().map(|t| t.to_markdown()).unwrap_or_default();

        self.markdown.push_str(&tabs);
        if row.is_complete {
            self.markdown.push_str(&format!("* ~~{topic}~~"));
        } else {
            self.markdown.push_str(&format!("* {topic}"));
        }

        let note = row.note.as_ref().map(|n| n.to_markdown()).unwrap_or_default();
        if !note.is_empty() {
            self.markdown.push_str("\n\n");
            for paragraph in paragraphs(&note) {
                self.markdown.push_str(&tabs);
                self.markdown.push_str(&format!("  {paragraph}\n\n"));
            }
        }

        self.indent_level += 1;
        for child in row.children() {
            self.markdown.push('\n');
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
    fn test_completed_row_is_struck_through() {
        let mut tree = RowTree::default();
        let mut row = Row::with_topic("done thing");
        row.is_complete = true;
        let id = tree.append(row, None).unwrap();

        let mut visitor = MarkdownListVisitor::new();
        tree.row_ref(id).unwrap().visit(&mut visitor);
        assert_eq!(visitor.markdown, "* ~~done thing~~");
    }

    #[test]
    fn test_nested_with_note() {
        let mut tree = RowTree::default();
        let mut parent = Row::with_topic("parent");
        parent.note = Some("first para\n\nsecond para".into());
        let p = tree.append(parent, None).unwrap();
        let c = tree.append(Row::with_topic("child"), Some(p)).unwrap();
        tree.append(Row::with_topic("grandchild"), Some(c)).unwrap();

        let mut visitor = MarkdownListVisitor::new();
        tree.row_ref(p).unwrap().visit(&mut visitor);
        assert_eq!(
            visitor.markdown,
            "* parent\n\n  first para\n\n  second para\n\n\n\t* child\n\t\t* grandchild"
        );
    }

    #[test]
    fn test_blank_paragraphs_in_note_are_kept() {
        let mut tree = RowTree::default();
        let mut row = Row::with_topic("spaced");
        row.note = Some("one\n\n\n\ntwo".into());
        let id = tree.append(row, None).unwrap();

        let mut visitor = MarkdownListVisitor::new();
        tree.row_ref(id).unwrap().visit(&mut visitor);
        assert_eq!(visitor.markdown, "* spaced\n\n  one\n\n  \n\n  two\n\n");
    }
}
