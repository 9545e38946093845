//! Answer display formatting
//!
//! Escaping always runs before markup conversion, so the only live tags in the
//! output are the ones produced here.

use regex::Regex;
use std::sync::OnceLock;

fn bold_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid bold pattern"))
}

fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"`([^`\n]+)`").expect("valid code pattern"))
}

fn paragraph_break() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\n[ \t]*\n").expect("valid paragraph pattern"))
}

/// Escape HTML-significant characters
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render an answer as HTML: escape, then `**bold**` and `` `code` ``, then
/// paragraphs and line breaks.
pub fn render_answer_html(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    let escaped = escape_html(&normalized);
    let bolded = bold_pattern().replace_all(&escaped, "<strong>$1</strong>");
    let coded = code_pattern().replace_all(&bolded, "<code>$1</code>");

    paragraph_break()
        .split(&coded)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", p.replace('\n', "<br>")))
        .collect::<Vec<_>>()
        .join("")
}

/// Render an answer for a terminal: markers stripped, paragraphs kept.
pub fn render_answer_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    let unbolded = bold_pattern().replace_all(&normalized, "$1");
    let uncoded = code_pattern().replace_all(&unbolded, "$1");

    paragraph_break()
        .split(&uncoded)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
