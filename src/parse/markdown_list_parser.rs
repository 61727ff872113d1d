use crate::parse::ParsedRow;

/// Title and rows read from markdown text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkdownListDocument {
    pub title: Option<String>,
    pub rows: Vec<ParsedRow>,
}

/// Parse a markdown bullet list into rows.
///
/// - `*`, `-` and `+` items nest by indentation (a tab counts as four
///   columns). Any deeper indent makes an item a child of the item above.
/// - `~~text~~` items are complete.
/// - Indented non-item lines under an item are its note; blank lines split
///   note paragraphs.
/// - Other text lines become top-level rows, except a leading `# ` heading,
///   which becomes the title.
pub fn parse_markdown_list(text: &str) -> MarkdownListDocument {
    let mut doc = MarkdownListDocument::default();
    // Open items as (indent, path of child indices from the top level)
    let mut stack: Vec<(usize, Vec<usize>)> = Vec::new();
    let mut pending_blank = false;

    for line in text.lines() {
        if line.trim().is_empty() {
            pending_blank = true;
            continue;
        }

        let indent = count_indent(line);
        let content = line.trim();

        if let Some(item) = bullet_text(content) {
            while stack.last().is_some_and(|(open, _)| *open >= indent) {
                stack.pop();
            }
            let row = item_row(item);
            let parent_path = stack.last().map(|(_, path)| path.clone()).unwrap_or_default();
            let siblings = siblings_at_mut(&mut doc.rows, &parent_path);
            siblings.push(row);
            let mut path = parent_path;
            path.push(siblings.len() - 1);
            stack.push((indent, path));
            pending_blank = false;
            continue;
        }

        // Continuation text belongs to the innermost item it is indented under
        while stack.last().is_some_and(|(open, _)| *open >= indent) {
            stack.pop();
        }
        if let Some(owner) = stack.last().and_then(|(_, path)| row_at_mut(&mut doc.rows, path)) {
            let note = owner.note.get_or_insert_with(String::new);
            if !note.is_empty() {
                note.push_str(if pending_blank { "\n\n" } else { "\n" });
            }
            note.push_str(content);
            pending_blank = false;
            continue;
        }

        if doc.title.is_none() && doc.rows.is_empty() {
            if let Some(title) = content.strip_prefix("# ") {
                doc.title = Some(title.trim().to_string());
                pending_blank = false;
                continue;
            }
        }

        doc.rows.push(ParsedRow {
            topic: Some(content.to_string()),
            ..Default::default()
        });
        pending_blank = false;
    }

    doc
}

fn count_indent(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Text after a bullet marker, when `content` is a list item
fn bullet_text(content: &str) -> Option<&str> {
    let rest = content
        .strip_prefix('*')
        .or_else(|| content.strip_prefix('-'))
        .or_else(|| content.strip_prefix('+'))?;
    if rest.is_empty() {
        return Some("");
    }
    if rest.starts_with(' ') || rest.starts_with('\t') {
        return Some(rest.trim());
    }
    None
}

fn item_row(item: &str) -> ParsedRow {
    let (topic, is_complete) = match item.strip_prefix("~~").and_then(|s| s.strip_suffix("~~")) {
        Some(inner) => (inner, true),
        None => (item, false),
    };
    ParsedRow {
        topic: (!topic.is_empty()).then(|| topic.to_string()),
        is_complete,
        ..Default::default()
    }
}

/// The child list reached by following `path` from the top level
fn siblings_at_mut<'a>(rows: &'a mut Vec<ParsedRow>, path: &[usize]) -> &'a mut Vec<ParsedRow> {
    let mut siblings = rows;
    for &i in path {
        siblings = &mut siblings[i].children;
    }
    siblings
}

fn row_at_mut<'a>(rows: &'a mut [ParsedRow], path: &[usize]) -> Option<&'a mut ParsedRow> {
    let (first, rest) = path.split_first()?;
    let mut row = rows.get_mut(*first)?;
    for &i in rest {
        row = row.children.get_mut(i)?;
    }
    Some(row)
}
