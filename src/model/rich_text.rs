use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Inline attributes carried by a run of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub link: Option<String>,
}

impl TextStyle {
    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && self.link.is_none()
    }
}

/// A styled byte range of a [`RichText`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub range: Range<usize>,
    pub style: TextStyle,
}

/// Topic or note text with inline styling.
///
/// Runs are sorted, non-overlapping and non-empty. Text not covered by a run
/// is unstyled. Adjacent runs never share a style.
///
/// Rich text is persisted as inline markdown: `**bold**`, `_italic_`,
/// `[label](url)`, with `\` escaping the marker characters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct RichText {
    text: String,
    runs: Vec<TextRun>,
}

const ESCAPED: &[char] = &['\\', '*', '_', '[', ']'];

impl RichText {
    /// Unstyled text.
    pub fn plain(text: impl Into<String>) -> Self {
        RichText {
            text: text.into(),
            runs: Vec::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Append `s` with `style`, merging into the previous run when the style
    /// matches.
    pub fn push_str(&mut self, s: &str, style: &TextStyle) {
        if s.is_empty() {
            return;
        }
        let start = self.text.len();
        self.text.push_str(s);
        let end = self.text.len();
        if style.is_plain() {
            return;
        }
        if let Some(last) = self.runs.last_mut() {
            if last.range.end == start && last.style == *style {
                last.range.end = end;
                return;
            }
        }
        self.runs.push(TextRun {
            range: start..end,
            style: style.clone(),
        });
    }

    /// Apply `style` to `range` of the existing text. Used when a caller
    /// formats part of a topic after the fact.
    pub fn set_style(&mut self, range: Range<usize>, style: TextStyle) {
        let mut rebuilt = RichText::default();
        let mut start = 0;
        for (segment, seg_style) in self.segments() {
            let end = start + segment.len();
            let lo = range.start.clamp(start, end);
            let hi = range.end.clamp(lo, end);
            rebuilt.push_str(&self.text[start..lo], &seg_style);
            rebuilt.push_str(&self.text[lo..hi], &style);
            rebuilt.push_str(&self.text[hi..end], &seg_style);
            start = end;
        }
        *self = rebuilt;
    }

    /// The text split into maximal segments of a single style, including
    /// unstyled gaps.
    pub fn segments(&self) -> Vec<(&str, TextStyle)> {
        let mut out = Vec::new();
        let mut pos = 0;
        for run in &self.runs {
            if run.range.start > pos {
                out.push((&self.text[pos..run.range.start], TextStyle::default()));
            }
            out.push((&self.text[run.range.clone()], run.style.clone()));
            pos = run.range.end;
        }
        if pos < self.text.len() {
            out.push((&self.text[pos..], TextStyle::default()));
        }
        out
    }

    // -----------------------------------------------------------------------
    // Markdown
    // -----------------------------------------------------------------------

    /// Parse inline markdown. Markers without a closing partner are kept as
    /// literal text.
    pub fn from_markdown(markdown: &str) -> Self {
        let mut out = RichText::default();
        parse_inline(markdown, &TextStyle::default(), &mut out);
        out
    }

    /// Render as inline markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::with_capacity(self.text.len());
        for (segment, style) in self.segments() {
            let mut piece = escape_markdown(segment);
            if style.italic {
                piece = format!("_{piece}_");
            }
            if style.bold {
                piece = format!("**{piece}**");
            }
            if let Some(url) = &style.link {
                piece = format!("[{piece}]({})", url.replace(')', "%29"));
            }
            md.push_str(&piece);
        }
        md
    }
}

impl fmt::Display for RichText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<String> for RichText {
    fn from(markdown: String) -> Self {
        RichText::from_markdown(&markdown)
    }
}

impl From<&str> for RichText {
    fn from(markdown: &str) -> Self {
        RichText::from_markdown(markdown)
    }
}

impl From<RichText> for String {
    fn from(text: RichText) -> Self {
        text.to_markdown()
    }
}

fn escape_markdown(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if ESCAPED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Byte offset of the next unescaped `marker` at or after `from`. A single
/// `*` never matches the first half of `**`.
fn find_closing(src: &str, from: usize, marker: &str) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 1 + src[i + 1..].chars().next().map_or(0, char::len_utf8);
            continue;
        }
        if src[i..].starts_with(marker) {
            if marker == "*" && src[i..].starts_with("**") {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += src[i..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

fn parse_inline(src: &str, style: &TextStyle, out: &mut RichText) {
    let mut literal = String::new();
    let mut i = 0;

    while i < src.len() {
        let rest = &src[i..];

        if let Some(escaped) = rest.strip_prefix('\\') {
            match escaped.chars().next() {
                Some(c) if ESCAPED.contains(&c) => {
                    literal.push(c);
                    i += 1 + c.len_utf8();
                }
                _ => {
                    literal.push('\\');
                    i += 1;
                }
            }
            continue;
        }

        if rest.starts_with("**") {
            if let Some(end) = find_closing(src, i + 2, "**").filter(|&end| end > i + 2) {
                out.push_str(&literal, style);
                literal.clear();
                let inner = TextStyle {
                    bold: true,
                    ..style.clone()
                };
                parse_inline(&src[i + 2..end], &inner, out);
                i = end + 2;
                continue;
            }
        } else if rest.starts_with('_') || rest.starts_with('*') {
            let marker = &rest[..1];
            if let Some(end) = find_closing(src, i + 1, marker).filter(|&end| end > i + 1) {
                out.push_str(&literal, style);
                literal.clear();
                let inner = TextStyle {
                    italic: true,
                    ..style.clone()
                };
                parse_inline(&src[i + 1..end], &inner, out);
                i = end + 1;
                continue;
            }
        } else if rest.starts_with('[') {
            if let Some((label_end, url_end)) = find_link(src, i) {
                out.push_str(&literal, style);
                literal.clear();
                let url = src[label_end + 2..url_end].replace("%29", ")");
                let inner = TextStyle {
                    link: Some(url),
                    ..style.clone()
                };
                parse_inline(&src[i + 1..label_end], &inner, out);
                i = url_end + 1;
                continue;
            }
        }

        let c = rest.chars().next().unwrap_or_default();
        literal.push(c);
        i += c.len_utf8();
    }

    out.push_str(&literal, style);
}

/// For a `[` at `start`, the offsets of the closing `]` and of the `)` ending
/// the url, when the text forms `[label](url)`.
fn find_link(src: &str, start: usize) -> Option<(usize, usize)> {
    let label_end = find_closing(src, start + 1, "]")?;
    if label_end == start + 1 || !src[label_end..].starts_with("](") {
        return None;
    }
    let url_end = label_end + 2 + src[label_end + 2..].find(')')?;
    Some((label_end, url_end))
}
