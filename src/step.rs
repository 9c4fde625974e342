//! Step text conventions shared by both renderers.
//!
//! A step may open with a `**bold header**`; the remainder is the body.
//! Lines are separated either by real newlines or by the XML-escaped
//! `&#xA;` marker the upstream model sometimes emits.

use once_cell::sync::Lazy;
use regex::Regex;

pub const XML_NEWLINE: &str = "&#xA;";

static LEADING_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*\*(.+?)\*\*").unwrap());
static BOLD_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepText {
    pub header: Option<String>,
    pub body: String,
}

/// Separates a leading `**...**` marker from the rest of the step.
pub fn split(raw: &str) -> StepText {
    match LEADING_HEADER.captures(raw) {
        Some(caps) => {
            let marker_len = caps[0].len();
            StepText {
                header: Some(caps[1].to_string()),
                body: raw[marker_len..].trim_start().to_string(),
            }
        }
        None => StepText {
            header: None,
            body: raw.to_string(),
        },
    }
}

/// Splits on `&#xA;` or `\n`, dropping empty segments.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split(XML_NEWLINE)
        .flat_map(|chunk| chunk.split('\n'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Escapes the HTML metacharacters of user text, then turns every
/// `**x**` span into `<b>x</b>`.
pub fn bold_to_html(line: &str) -> String {
    let escaped = escape_html(line);
    BOLD_SPAN.replace_all(&escaped, "<b>$1</b>").into_owned()
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_extracts_leading_header() {
        let text = split("**Step One**\nDo the first thing.");
        assert_eq!(text.header.as_deref(), Some("Step One"));
        assert_eq!(text.body, "Do the first thing.");
    }

    #[test]
    fn split_without_marker_keeps_everything_in_body() {
        let text = split("Plain step with **inline** bold");
        assert_eq!(text.header, None);
        assert_eq!(text.body, "Plain step with **inline** bold");
    }

    #[test]
    fn split_header_only_has_empty_body() {
        let text = split("**Only a header**");
        assert_eq!(text.header.as_deref(), Some("Only a header"));
        assert_eq!(text.body, "");
    }

    #[test]
    fn split_ignores_unterminated_marker() {
        let text = split("**not closed");
        assert_eq!(text.header, None);
    }

    #[test]
    fn split_lines_handles_both_separators() {
        assert_eq!(split_lines("a&#xA;b\nc"), vec!["a", "b", "c"]);
        assert_eq!(split_lines("a\n\n&#xA;b\n"), vec!["a", "b"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn bold_to_html_converts_every_span() {
        assert_eq!(bold_to_html("**a** and **b**"), "<b>a</b> and <b>b</b>");
    }

    #[test]
    fn bold_to_html_escapes_markup() {
        assert_eq!(bold_to_html("x < y & **z**"), "x &lt; y &amp; <b>z</b>");
    }
}
