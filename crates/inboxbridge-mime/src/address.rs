//! Display normalization for address headers.

use std::sync::LazyLock;

use regex::Regex;

/// Returned when no address header is present.
pub const UNKNOWN_ADDRESS: &str = "Unknown";

#[allow(clippy::expect_used)]
static NAME_ADDR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(.*?)\s*<([^<>]*)>\s*$").expect("valid regex"));

/// Normalizes one raw address header value into a display string.
///
/// - `"A B" <a@b.com>` becomes `A B <a@b.com>`.
/// - `<a@b.com>` or `"" <a@b.com>` (no usable name) is returned as given.
/// - A bare address, or anything else that does not match, is returned as given.
/// - A missing value becomes [`UNKNOWN_ADDRESS`].
#[must_use]
pub fn parse_address(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return UNKNOWN_ADDRESS.to_string();
    };

    let Some(caps) = NAME_ADDR.captures(raw) else {
        return raw.to_string();
    };

    let name = caps
        .get(1)
        .map_or("", |m| m.as_str())
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    let addr = caps.get(2).map_or("", |m| m.as_str()).trim();

    if name.is_empty() {
        raw.to_string()
    } else {
        format!("{name} <{addr}>")
    }
}

/// Normalizes every mailbox in a comma-separated header such as `To`, then
/// joins them with `", "`.
///
/// Commas inside quoted names or angle brackets do not split.
#[must_use]
pub fn parse_address_list(raw: &str) -> String {
    split_mailboxes(raw)
        .into_iter()
        .map(|mailbox| parse_address(Some(mailbox)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn split_mailboxes(raw: &str) -> Vec<&str> {
    let mut mailboxes = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut angle = false;

    for (idx, ch) in raw.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            '<' if !quoted => angle = true,
            '>' if !quoted => angle = false,
            ',' if !quoted && !angle => {
                mailboxes.push(raw[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    mailboxes.push(raw[start..].trim());
    mailboxes.retain(|m| !m.is_empty());
    mailboxes
}

/// Formats a name and address pair the way [`parse_address`] would render
/// the equivalent header.
#[must_use]
pub fn format_mailbox(name: Option<&str>, address: Option<&str>) -> Option<String> {
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    let address = address.map(str::trim).filter(|a| !a.is_empty());
    match (name, address) {
        (Some(name), Some(address)) => Some(parse_address(Some(&format!("\"{name}\" <{address}>")))),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_name_is_unquoted() {
        assert_eq!(parse_address(Some("\"A B\" <a@b.com>")), "A B <a@b.com>");
    }

    #[test]
    fn bare_address_is_unchanged() {
        assert_eq!(parse_address(Some("a@b.com")), "a@b.com");
    }

    #[test]
    fn address_list_normalizes_each_mailbox() {
        assert_eq!(
            parse_address_list("\"Bob B\" <bob@example.org>, carol@example.org"),
            "Bob B <bob@example.org>, carol@example.org"
        );
        assert_eq!(
            parse_address_list("\"Lee, Ann\" <ann@x.org>,,  'Ops' <ops@x.org> "),
            "Lee, Ann <ann@x.org>, Ops <ops@x.org>"
        );
        assert_eq!(parse_address_list("\"Bob B\" <bob@example.org>"), "Bob B <bob@example.org>");
        assert_eq!(parse_address_list(""), "");
    }

    #[test]
    fn missing_is_unknown() {
        assert_eq!(parse_address(None), "Unknown");
    }

    #[test]
    fn unquoted_and_single_quoted_names() {
        assert_eq!(parse_address(Some("Jane Doe <jane@x.org>")), "Jane Doe <jane@x.org>");
        assert_eq!(parse_address(Some("'Ops' <ops@x.org>")), "Ops <ops@x.org>");
    }

    #[test]
    fn empty_name_returns_raw_value() {
        assert_eq!(parse_address(Some("<a@b.com>")), "<a@b.com>");
        assert_eq!(parse_address(Some("\"\" <a@b.com>")), "\"\" <a@b.com>");
    }

    #[test]
    fn garbage_is_returned_verbatim() {
        assert_eq!(parse_address(Some("not an address >")), "not an address >");
        assert_eq!(parse_address(Some("")), "");
    }

    #[test]
    fn format_mailbox_variants() {
        assert_eq!(
            format_mailbox(Some("A B"), Some("a@b.com")).as_deref(),
            Some("A B <a@b.com>")
        );
        assert_eq!(format_mailbox(None, Some("a@b.com")).as_deref(), Some("a@b.com"));
        assert_eq!(format_mailbox(Some("Team"), None).as_deref(), Some("Team"));
        assert_eq!(format_mailbox(Some(" "), Some("")), None);
    }
}
