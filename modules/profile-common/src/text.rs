use std::sync::LazyLock;

use regex::Regex;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid regex"));

/// Count alphanumeric runs. Every merge and selection decision goes through this
/// one tokenizer so word counts stay comparable across passes.
pub fn word_count(text: &str) -> usize {
    WORD_RE.find_iter(text).count()
}

/// Collapse text into trimmed, non-empty lines joined by single newlines.
pub fn collapse_blank_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
