//! Constrained Markdown-to-HTML rendering for assistant answers.
//!
//! Supports headings 1-3, bold, italic, inline code, and paragraph/line
//! breaks. All input is HTML-escaped before any markup substitution runs, so
//! model-supplied text can never inject live markup. That ordering is a hard
//! invariant.


use fancy_regex::Regex;
use std::sync::LazyLock;

static HEADING_3: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^### (.*)$").expect("valid regex"));
static HEADING_2: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^## (.*)$").expect("valid regex"));
static HEADING_1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^# (.*)$").expect("valid regex"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"));
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("valid regex"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid regex"));

/// Escape the characters HTML assigns meaning to.
#[inline]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the supported Markdown subset to safe HTML.
///
/// Escapes first, substitutes second. Headings are matched per line before
/// the inline rules run; blank lines split paragraphs and remaining
/// newlines become `<br>`.
#[inline]
pub fn render(markdown: &str) -> String {
    if markdown.is_empty() {
        return String::new();
    }

    let mut html = escape_html(markdown);

    html = HEADING_3.replace_all(&html, "<h3>$1</h3>").into_owned();
    html = HEADING_2.replace_all(&html, "<h2>$1</h2>").into_owned();
    html = HEADING_1.replace_all(&html, "<h1>$1</h1>").into_owned();

    html = BOLD.replace_all(&html, "<strong>$1</strong>").into_owned();
    html = ITALIC.replace_all(&html, "<em>$1</em>").into_owned();
    html = INLINE_CODE.replace_all(&html, "<code>$1</code>").into_owned();

    html = html.replace("\n\n", "</p><p>");
    html = html.replace('\n', "<br>");

    if !html.starts_with("<h") {
        html = format!("<p>{html}</p>");
    }

    html = html.replace("<p></p>", "");
    html = html.replace("<p><br></p>", "");

    html
}
