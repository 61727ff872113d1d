//! Whole-document exports. Each returns the finished text or print buffer;
//! writing it anywhere is up to the caller.

use crate::model::config::ExportConfig;
use crate::model::outline::Outline;
use crate::ops::view_ops::expansion_state;
use crate::visit::{
    escape_xml, MarkdownDocVisitor, MarkdownListVisitor, OpmlVisitor, PlainTextVisitor, PrintBuffer, PrintDocVisitor,
    PrintListVisitor, PrintSpan, WordCountVisitor,
};

/// The outline as an OPML 2.0 document.
pub fn opml(outline: &Outline, config: &ExportConfig) -> String {
    let mut opml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    opml.push_str(&format!("<!-- OPML generated by {} -->\n", escape_xml(&config.generator)));
    opml.push_str("<opml version=\"2.0\">\n");
    opml.push_str("<head>\n");

    let title = outline.title.as_deref().unwrap_or_default();
    opml.push_str(&format!("  <title>{}</title>\n", escape_xml(title)));
    if let Some(created) = outline.created {
        opml.push_str(&format!("  <dateCreated>{}</dateCreated>\n", created.to_rfc2822()));
    }
    if let Some(updated) = outline.updated {
        opml.push_str(&format!("  <dateModified>{}</dateModified>\n", updated.to_rfc2822()));
    }
    if let Some(name) = &outline.owner_name {
        opml.push_str(&format!("  <ownerName>{}</ownerName>\n", escape_xml(name)));
    }
    if let Some(email) = &outline.owner_email {
        opml.push_str(&format!("  <ownerEmail>{}</ownerEmail>\n", escape_xml(email)));
    }
    if let Some(url) = &outline.owner_url {
        opml.push_str(&format!("  <ownerID>{}</ownerID>\n", escape_xml(url)));
    }
    opml.push_str(&format!("  <expansionState>{}</expansionState>\n", expansion_state(outline)));
    if let Some(scroll) = outline.vertical_scroll_state {
        opml.push_str(&format!("  <vertScrollState>{scroll}</vertScrollState>\n"));
    }
    opml.push_str("</head>\n");

    opml.push_str("<body>\n");
    for root in outline.tree().root_refs() {
        let mut visitor = OpmlVisitor::new();
        root.visit(&mut visitor);
        opml.push_str(&visitor.opml);
    }
    opml.push_str("</body>\n");
    opml.push_str("</opml>\n");
    opml
}

/// The outline as a markdown document under a `#` title heading.
pub fn markdown_doc(outline: &Outline) -> String {
    let mut md = format!("# {}", outline.title.as_deref().unwrap_or_default());
    let mut visitor = MarkdownDocVisitor::new();
    outline.visit_rows(&mut visitor);
    md.push_str(&visitor.markdown);
    md
}

/// The outline as a markdown bullet list under a `#` title heading.
pub fn markdown_list(outline: &Outline) -> String {
    let mut md = format!("# {}\n\n", outline.title.as_deref().unwrap_or_default());
    for root in outline.tree().root_refs() {
        let mut visitor = MarkdownListVisitor::new();
        root.visit(&mut visitor);
        md.push_str(&visitor.markdown);
        md.push('\n');
    }
    md
}

/// Title, a blank line, then every topic and note as plain text.
pub fn text_content(outline: &Outline) -> String {
    let mut text = format!("{}\n\n", outline.title.as_deref().unwrap_or_default());
    for root in outline.tree().root_refs() {
        let mut visitor = PlainTextVisitor::new();
        root.visit(&mut visitor);
        text.push_str(&visitor.string);
        text.push('\n');
    }
    text
}

fn print_title(outline: &Outline) -> PrintBuffer {
    let mut print = PrintBuffer::default();
    if let Some(title) = &outline.title {
        print.push(PrintSpan::title(title));
    }
    print
}

/// Print layout in document form
pub fn print_doc(outline: &Outline) -> PrintBuffer {
    let mut print = print_title(outline);
    let mut visitor = PrintDocVisitor::new();
    outline.visit_rows(&mut visitor);
    print.append(visitor.print);
    print
}

/// Print layout as a bullet list
pub fn print_list(outline: &Outline) -> PrintBuffer {
    let mut print = print_title(outline);
    for root in outline.tree().root_refs() {
        let mut visitor = PrintListVisitor::new();
        root.visit(&mut visitor);
        print.append(visitor.print);
    }
    print
}

/// Words in every topic and note. The title is not counted.
pub fn word_count(outline: &Outline) -> usize {
    let mut visitor = WordCountVisitor::new();
    outline.visit_rows(&mut visitor);
    visitor.count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::row::Row;
    use crate::model::rich_text::RichText;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn sample() -> Outline {
        let mut outline = Outline::new("Trip & Plans");
        outline.created = Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        outline.updated = None;
        outline.owner_name = Some("Sam".into());
        let tree = outline.tree_mut();
        let mut packing = Row::with_topic("Packing");
        packing.note = Some(RichText::plain("Check the weather"));
        let p = tree.append(packing, None).unwrap();
        let mut socks = Row::with_topic("socks");
        socks.is_complete = true;
        tree.append(socks, Some(p)).unwrap();
        tree.append(Row::with_topic("_hat_"), Some(p)).unwrap();
        tree.append(Row::with_topic("Tickets"), None).unwrap();
        outline
    }

    #[test]
    fn test_opml_document() {
        let document = opml(&sample(), &ExportConfig::default());
        assert!(document.ends_with("</opml>\n"));
        insta::assert_snapshot!(document.trim_end(), @r###"
        <?xml version="1.0" encoding="UTF-8"?>
        <!-- OPML generated by outliner -->
        <opml version="2.0">
        <head>
          <title>Trip &amp; Plans</title>
          <dateCreated>Fri, 1 Mar 2024 12:00:00 +0000</dateCreated>
          <ownerName>Sam</ownerName>
          <expansionState>0</expansionState>
        </head>
        <body>
          <outline text="Packing" _note="Check the weather">
            <outline text="socks" _status="checked"/>
            <outline text="_hat_"/>
          </outline>
          <outline text="Tickets"/>
        </body>
        </opml>
        "###);
    }

    #[test]
    fn test_markdown_list() {
        assert_eq!(
            markdown_list(&sample()),
            "# Trip & Plans\n\n* Packing\n\n  Check the weather\n\n\n\t* ~~socks~~\n\t* _hat_\n* Tickets\n"
        );
    }

    #[test]
    fn test_markdown_doc_starts_with_title() {
        let md = markdown_doc(&sample());
        assert!(md.starts_with("# Trip & Plans\n\n## Packing\n\nCheck the weather"));
        assert!(md.contains("* ~~socks~~"));
    }

    #[test]
    fn test_text_content() {
        assert_eq!(
            text_content(&sample()),
            "Trip & Plans\n\nPacking\nCheck the weather\n\tsocks\n\that\nTickets\n"
        );
    }

    #[test]
    fn test_print_title_and_word_count() {
        let outline = sample();
        let print = print_list(&outline);
        assert_eq!(print.spans[0].text, "Trip & Plans");
        assert_eq!(print.spans[0].font_size, 18);
        assert!(print_doc(&outline).text().starts_with("Trip & Plans"));
        // Packing, Check the weather, socks, hat, Tickets
        assert_eq!(word_count(&outline), 7);
    }

    #[test]
    fn test_empty_outline() {
        let outline = Outline::default();
        assert_eq!(markdown_list(&outline), "# \n\n");
        assert_eq!(word_count(&outline), 0);
        assert!(print_doc(&outline).is_empty());
    }
}
