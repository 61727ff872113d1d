/// Number of whitespace-separated runs in `s`.
pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Key for case-insensitive ordering of display text.
pub fn fold_case(s: &str) -> String {
    s.to_lowercase()
}

/// Split `s` into paragraphs on blank lines. Runs of blank lines yield
/// empty paragraphs.
pub fn paragraphs(s: &str) -> impl Iterator<Item = &str> {
    s.split("\n\n")
}
