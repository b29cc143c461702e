//! Wire encoding helpers for command arguments.

/// Writes an astring: bare when it is a plain atom, quoted otherwise.
pub fn write_astring(buf: &mut Vec<u8>, s: &str) {
    if !s.is_empty() && !s.bytes().any(needs_quoting) {
        buf.extend_from_slice(s.as_bytes());
        return;
    }
    buf.push(b'"');
    for b in s.bytes() {
        if matches!(b, b'"' | b'\\') {
            buf.push(b'\\');
        }
        buf.push(b);
    }
    buf.push(b'"');
}

const fn needs_quoting(b: u8) -> bool {
    matches!(
        b,
        b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*' | b']'
    ) || b < 0x20
        || b >= 0x7F
}

/// Returns true if `s` cannot travel inside a quoted string.
#[must_use]
pub fn has_line_break(s: &str) -> bool {
    s.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn astring(s: &str) -> String {
        let mut buf = Vec::new();
        write_astring(&mut buf, s);
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn test_plain_atom_is_bare() {
        assert_eq!(astring("INBOX"), "INBOX");
        assert_eq!(astring("user@example.com"), "user@example.com");
    }

    #[test]
    fn test_specials_are_quoted_and_escaped() {
        assert_eq!(astring(""), "\"\"");
        assert_eq!(astring("two words"), "\"two words\"");
        assert_eq!(astring(r#"p"a\ss"#), r#""p\"a\\ss""#);
    }

    #[test]
    fn test_line_break_detection() {
        assert!(has_line_break("pass\r\nA1 LOGOUT"));
        assert!(!has_line_break("correct horse"));
    }
}
