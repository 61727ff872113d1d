use chrono::{DateTime, Utc};
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::parse::ParsedRow;

/// Error type for OPML reading
#[derive(Debug, thiserror::Error)]
pub enum OpmlError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),
    #[error("document has no <opml> element")]
    MissingOpml,
    #[error("document has no <body> element")]
    MissingBody,
    #[error("document ends before its elements are closed")]
    Truncated,
}

/// Document metadata from the OPML `<head>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpmlHead {
    pub title: Option<String>,
    pub date_created: Option<DateTime<Utc>>,
    pub date_modified: Option<DateTime<Utc>>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub owner_id: Option<String>,
    /// Comma separated pre-order indices of expanded rows
    pub expansion_state: Option<String>,
    pub vert_scroll_state: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpmlDocument {
    pub head: OpmlHead,
    pub rows: Vec<ParsedRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Outside,
    Head,
    Body,
}

/// Parse an OPML 2.0 document.
///
/// Every `<outline>` under `<body>` becomes a row: `text` is the topic,
/// `_note` the note and `_status="checked"` marks it complete. Unknown
/// elements and attributes are ignored.
pub fn parse_opml(xml: &str) -> Result<OpmlDocument, OpmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut doc = OpmlDocument::default();
    let mut section = Section::Outside;
    let mut seen_opml = false;
    let mut seen_body = false;
    let mut closed_opml = false;
    let mut closed_body = false;
    let mut head_field: Option<String> = None;
    // Outlines still waiting for their end tag
    let mut open: Vec<ParsedRow> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"opml" => seen_opml = true,
                b"head" => section = Section::Head,
                b"body" => {
                    section = Section::Body;
                    seen_body = true;
                }
                b"outline" if section == Section::Body => open.push(outline_row(&e)?),
                name if section == Section::Head => {
                    head_field = Some(String::from_utf8_lossy(name).into_owned());
                }
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"outline" if section == Section::Body => {
                    let row = outline_row(&e)?;
                    close_outline(&mut open, &mut doc.rows, row);
                }
                b"body" => {
                    seen_body = true;
                    closed_body = true;
                }
                _ => {}
            },
            Event::Text(text) => {
                if let Some(field) = head_field.as_deref() {
                    let value = text.unescape()?;
                    set_head_field(&mut doc.head, field, &value);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"outline" if section == Section::Body => {
                    if let Some(row) = open.pop() {
                        close_outline(&mut open, &mut doc.rows, row);
                    }
                }
                b"head" => section = Section::Outside,
                b"body" => {
                    section = Section::Outside;
                    closed_body = true;
                }
                b"opml" => closed_opml = true,
                _ => head_field = None,
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_opml {
        return Err(OpmlError::MissingOpml);
    }
    if !seen_body {
        return Err(OpmlError::MissingBody);
    }
    if !open.is_empty() || !closed_body || !closed_opml {
        return Err(OpmlError::Truncated);
    }

    tracing::debug!(rows = doc.rows.len(), "parsed OPML document");
    Ok(doc)
}

fn outline_row(e: &BytesStart<'_>) -> Result<ParsedRow, OpmlError> {
    let mut row = ParsedRow::default();
    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"text" => row.topic = non_empty(attr.unescape_value()?.into_owned()),
            b"_note" => row.note = non_empty(attr.unescape_value()?.into_owned()),
            b"_status" => row.is_complete = attr.unescape_value()? == "checked",
            _ => {}
        }
    }
    Ok(row)
}

fn close_outline(open: &mut [ParsedRow], top: &mut Vec<ParsedRow>, row: ParsedRow) {
    match open.last_mut() {
        Some(parent) => parent.children.push(row),
        None => top.push(row),
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

fn set_head_field(head: &mut OpmlHead, field: &str, value: &str) {
    let value = value.trim();
    match field {
        "title" => head.title = non_empty(value.to_string()),
        "dateCreated" => head.date_created = parse_date(field, value),
        "dateModified" => head.date_modified = parse_date(field, value),
        "ownerName" => head.owner_name = non_empty(value.to_string()),
        "ownerEmail" => head.owner_email = non_empty(value.to_string()),
        "ownerId" | "ownerID" => head.owner_id = non_empty(value.to_string()),
        "expansionState" => head.expansion_state = non_empty(value.to_string()),
        "vertScrollState" => head.vert_scroll_state = value.parse().ok(),
        _ => {}
    }
}

fn parse_date(field: &str, value: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc2822(value) {
        Ok(date) => Some(date.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!(field, value, error = %e, "ignoring unreadable OPML date");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<opml version="2.0">
  <head>
    <title>Sample Outline</title>
    <dateCreated>Tue, 1 Nov 1994 09:00:00 GMT</dateCreated>
    <ownerName>Pat</ownerName>
    <expansionState>0,2</expansionState>
    <vertScrollState>3</vertScrollState>
  </head>
  <body>
    <outline text="one"/>
    <outline text="two" _note="a note&#10;second line">
      <outline text="two.a" _status="checked"/>
      <outline text="two.b">
        <outline text="two.b.i"/>
      </outline>
    </outline>
    <outline text="three"/>
    <outline text="four &amp; more"/>
    <outline text=""/>
    <outline text="six"/>
  </body>
</opml>
"#;

    #[test]
    fn test_top_level_rows() {
        let doc = parse_opml(SAMPLE).unwrap();
        assert_eq!(doc.rows.len(), 6);
        assert_eq!(doc.rows[3].topic.as_deref(), Some("four & more"));
        assert_eq!(doc.rows[4].topic, None);
    }

    #[test]
    fn test_nesting_notes_and_status() {
        let doc = parse_opml(SAMPLE).unwrap();
        let two = &doc.rows[1];
        assert_eq!(two.note.as_deref(), Some("a note\nsecond line"));
        assert_eq!(two.children.len(), 2);
        assert!(two.children[0].is_complete);
        assert!(!two.children[1].is_complete);
        assert_eq!(two.children[1].children[0].topic.as_deref(), Some("two.b.i"));
        assert_eq!(doc.rows.iter().map(ParsedRow::count).sum::<usize>(), 9);
    }

    #[test]
    fn test_head() {
        let doc = parse_opml(SAMPLE).unwrap();
        assert_eq!(doc.head.title.as_deref(), Some("Sample Outline"));
        assert_eq!(doc.head.owner_name.as_deref(), Some("Pat"));
        assert_eq!(doc.head.expansion_state.as_deref(), Some("0,2"));
        assert_eq!(doc.head.vert_scroll_state, Some(3));
        assert_eq!(
            doc.head.date_created.unwrap().to_rfc3339(),
            "1994-11-01T09:00:00+00:00"
        );
    }

    #[test]
    fn test_bad_date_is_ignored() {
        let doc = parse_opml(
            "<opml><head><dateModified>yesterday</dateModified></head><body/></opml>",
        )
        .unwrap();
        assert!(doc.head.date_modified.is_none());
        assert!(doc.rows.is_empty());
    }

    #[test]
    fn test_missing_elements() {
        assert!(matches!(parse_opml("<html><body/></html>"), Err(OpmlError::MissingOpml)));
        assert!(matches!(parse_opml("<opml><head/></opml>"), Err(OpmlError::MissingBody)));
    }

    #[test]
    fn test_mismatched_tags_are_errors() {
        assert!(matches!(
            parse_opml("<opml><body><outline text=\"a\"></body></opml>"),
            Err(OpmlError::Xml(_))
        ));
    }

    #[test]
    fn test_truncated_document_is_rejected() {
        let cut = "<opml version=\"2.0\"><head><title>t</title></head><body><outline text=\"a\"><outline text=\"b\"/>";
        assert!(matches!(parse_opml(cut), Err(OpmlError::Truncated)));
        assert!(matches!(
            parse_opml("<opml><body><outline text=\"a\"/></body>"),
            Err(OpmlError::Truncated)
        ));
        assert!(matches!(parse_opml("<opml><body>"), Err(OpmlError::Truncated)));
    }
}
