use crate::model::config::OutlinerConfig;
use crate::model::outline::Outline;
use crate::model::rich_text::RichText;
use crate::model::row::{Row, RowId};
use crate::model::tree::{RowError, RowTree};
use crate::ops::view_ops::set_expansion_state;
use crate::parse::{parse_markdown_list, parse_opml, OpmlError, ParsedRow};
use crate::util::fractional_index;

/// Error type for import operations
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("OPML error: {0}")]
    Opml(#[from] OpmlError),
    #[error("row error: {0}")]
    Row(#[from] RowError),
}

/// Build an outline from an OPML document.
///
/// The whole tree is built before the outline is returned, so a document
/// that fails to parse leaves nothing behind. Without a `<title>` the first
/// row's text becomes the title.
pub fn import_opml(xml: &str, config: &OutlinerConfig) -> Result<Outline, ImportError> {
    let doc = parse_opml(xml)?;
    let head = doc.head;

    let title = head.title.or_else(|| first_topic(&doc.rows));
    let mut outline = Outline::with_config(title, config);
    if head.date_created.is_some() {
        outline.created = head.date_created;
    }
    if head.date_modified.is_some() {
        outline.updated = head.date_modified;
    }
    outline.owner_name = head.owner_name;
    outline.owner_email = head.owner_email;
    outline.owner_url = head.owner_id;
    outline.vertical_scroll_state = head.vert_scroll_state;

    add_rows(outline.tree_mut(), doc.rows, None)?;
    if let Some(state) = head.expansion_state {
        set_expansion_state(&mut outline, &state);
    }

    tracing::debug!(rows = outline.row_count(), "imported OPML outline");
    Ok(outline)
}

/// Build an outline from a markdown bullet list. A leading `# ` heading
/// becomes the title.
pub fn import_markdown_list(markdown: &str, config: &OutlinerConfig) -> Result<Outline, ImportError> {
    let doc = parse_markdown_list(markdown);
    let title = doc.title.or_else(|| first_topic(&doc.rows));
    let mut outline = Outline::with_config(title, config);
    add_rows(outline.tree_mut(), doc.rows, None)?;

    tracing::debug!(rows = outline.row_count(), "imported markdown list");
    Ok(outline)
}

fn first_topic(rows: &[ParsedRow]) -> Option<String> {
    let topic = rows.first()?.topic.as_deref()?;
    Some(RichText::from_markdown(topic).as_str().to_string())
}

/// Add `rows` under `parent`, keying each sibling level in document order.
fn add_rows(tree: &mut RowTree, rows: Vec<ParsedRow>, parent: Option<RowId>) -> Result<(), RowError> {
    let keys = fractional_index::initial(rows.len());
    for (parsed, key) in rows.into_iter().zip(keys) {
        let mut row = Row::new();
        row.topic = parsed.topic.as_deref().map(RichText::from_markdown);
        row.note = parsed.note.as_deref().map(RichText::from_markdown);
        row.is_complete = parsed.is_complete;
        row.order = key;
        let id = tree.insert_keyed(row, parent)?;
        add_rows(tree, parsed.children, Some(id))?;
    }
    Ok(())
}
