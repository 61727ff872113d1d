use crate::model::tree::RowRef;
use crate::visit::RowVisitor;

/// Escape text for use inside an XML attribute or element. Newlines become
/// character references so multi-line notes survive attribute normalization.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#10;"),
            _ => out.push(c),
        }
    }
    out
}

/// Writes a row and its subtree as OPML `<outline>` elements.
///
/// Topic and note are stored as inline markdown in the `text` and `_note`
/// attributes; completed rows carry `_status="checked"`.
#[derive(Debug, Default)]
pub struct OpmlVisitor {
    pub indent_level: usize,
    pub opml: String,
}

impl OpmlVisitor {
    pub fn new() -> Self {
        OpmlVisitor::default()
    }
}

impl RowVisitor for OpmlVisitor {
    fn visit_row(&mut self, row: RowRef<'_>) {
        let indent = " ".repeat((self.indent_level + 1) * 2);
        let text = row.topic.as_ref().map(|t| escape_xml(&t.to_markdown())).unwrap_or_default();

        self.opml.push_str(&indent);
        self.opml.push_str(&format!("<outline text=\"{text}\""));
        if let Some(note) = row.note.as_ref().filter(|n| !n.is_empty()) {
            self.opml.push_str(&format!(" _note=\"{}\"", escape_xml(&note.to_markdown())));
        }
        if row.is_complete {
            self.opml.push_str(" _status=\"checked\"");
        }

        if !row.has_children() {
            self.opml.push_str("/>\n");
            return;
        }

        self.opml.push_str(">\n");
        self.indent_level += 1;
        for child in row.children() {
            child.visit(self);
        }
        self.indent_level -= 1;
        self.opml.push_str(&indent);
        self.opml.push_str("</outline>\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::row::Row;
    use crate::model::tree::RowTree;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml(r#"a<b>&"c"'d'"#), "a&lt;b&gt;&amp;&quot;c&quot;&apos;d&apos;");
        assert_eq!(escape_xml("one\ntwo"), "one&#10;two");
    }

    #[test]
    fn test_nested_rows() {
        let mut tree = RowTree::default();
        let mut parent = Row::with_topic("Groceries & more");
        parent.note = Some("weekly".into());
        let p = tree.append(parent, None).unwrap();
        let mut milk = Row::with_topic("**Milk**");
        milk.is_complete = true;
        tree.append(milk, Some(p)).unwrap();
        tree.append(Row::new(), Some(p)).unwrap();

        let mut visitor = OpmlVisitor::new();
        tree.row_ref(p).unwrap().visit(&mut visitor);
        assert_eq!(
            visitor.opml,
            concat!(
                "  <outline text=\"Groceries &amp; more\" _note=\"weekly\">\n",
                "    <outline text=\"**Milk**\" _status=\"checked\"/>\n",
                "    <outline text=\"\"/>\n",
                "  </outline>\n",
            )
        );
    }
}
