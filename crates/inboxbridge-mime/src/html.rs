//! Regex-based HTML to plain text reduction.
//!
//! This is not an HTML parser. It removes script and style blocks, turns
//! every remaining tag into a space and collapses whitespace. Unbalanced or
//! malformed markup simply survives whichever passes do not match it.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script.*?>.*?</script>").expect("valid regex"));

#[allow(clippy::expect_used)]
static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style.*?>.*?</style>").expect("valid regex"));

#[allow(clippy::expect_used)]
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

#[allow(clippy::expect_used)]
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Reduces an HTML document to a single line of readable text.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(html, "");
    let text = STYLE_BLOCK.replace_all(&text, "");
    let text = TAG.replace_all(&text, " ");
    collapse_whitespace(&text)
}

/// Collapses every whitespace run to one space and trims both ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Builds a preview of at most `max_chars` characters.
///
/// Whitespace is collapsed first. Longer text is cut, trimmed again and
/// suffixed with `...`.
#[must_use]
pub fn snippet(text: &str, max_chars: usize) -> String {
    let cleaned = collapse_whitespace(text);
    if cleaned.chars().count() <= max_chars {
        return cleaned;
    }
    let cut: String = cleaned.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_tags_and_scripts() {
        assert_eq!(
            html_to_text("<p>Hi <b>there</b></p><script>evil()</script>"),
            "Hi there"
        );
    }

    #[test]
    fn script_and_style_are_case_insensitive_and_multiline() {
        let html = "<STYLE type=\"text/css\">\nbody { color: red; }\n</Style>\
                    <div>Body</div><Script src=x>\nalert(1)\n</SCRIPT>tail";
        assert_eq!(html_to_text(html), "Body tail");
    }

    #[test]
    fn tolerates_unbalanced_markup() {
        assert_eq!(html_to_text("<div><p>open <b>never closed"), "open never closed");
        assert_eq!(html_to_text("a < b and c > d"), "a d");
        assert_eq!(html_to_text("<script>no end"), "no end");
    }

    #[test]
    fn empty_and_whitespace_only() {
        assert_eq!(html_to_text(""), "");
        assert_eq!(html_to_text(" \n\t<br/> "), "");
    }

    #[test]
    fn snippet_truncates_on_char_boundary() {
        let text = "é".repeat(200);
        let s = snippet(&text, 150);
        assert!(s.ends_with("..."));
        assert_eq!(s.chars().count(), 153);
    }

    #[test]
    fn snippet_keeps_short_text() {
        assert_eq!(snippet("  short\n text ", 150), "short text");
    }

    #[test]
    fn snippet_trims_before_ellipsis() {
        assert_eq!(snippet("abc def", 4), "abc...");
    }

    proptest! {
        #[test]
        fn output_has_no_tags_or_runs_of_space(input in "[ -~\n\t]{0,200}") {
            let out = html_to_text(&input);
            prop_assert!(!out.contains("  "));
            prop_assert_eq!(out.trim(), out.as_str());
            prop_assert!(!TAG.is_match(&out));
        }
    }
}
