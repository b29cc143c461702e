//! FETCH response parsing.

use crate::Result;
use crate::parser::lexer::{Lexer, Token};
use crate::types::Uid;

use super::types::FetchItem;

/// Parses the parenthesized item list that follows `* n FETCH `.
pub fn parse_fetch_items(lexer: &mut Lexer<'_>) -> Result<Vec<FetchItem>> {
    lexer.expect(Token::LParen)?;
    let mut items = Vec::new();

    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(name) => {
                if let Some(item) = parse_item(lexer, name)? {
                    items.push(item);
                }
            }
            token => {
                return Err(lexer.error(&format!("Unexpected token in FETCH: {token:?}")));
            }
        }
    }

    Ok(items)
}

fn parse_item(lexer: &mut Lexer<'_>, name: &str) -> Result<Option<FetchItem>> {
    let upper = name.to_ascii_uppercase();
    let item = match upper.as_str() {
        "UID" => {
            lexer.expect_space()?;
            let n = lexer.read_number()?;
            let uid = Uid::new(n).ok_or_else(|| lexer.error("UID cannot be 0"))?;
            FetchItem::Uid(uid)
        }
        "FLAGS" => {
            lexer.expect_space()?;
            FetchItem::Flags(parse_atom_list(lexer)?)
        }
        "RFC822.SIZE" => {
            lexer.expect_space()?;
            FetchItem::Rfc822Size(lexer.read_number()?)
        }
        "INTERNALDATE" => {
            lexer.expect_space()?;
            let date = lexer.read_nstring()?.unwrap_or_default();
            FetchItem::InternalDate(String::from_utf8_lossy(&date).into_owned())
        }
        "RFC822" | "RFC822.HEADER" | "RFC822.TEXT" => {
            lexer.expect_space()?;
            FetchItem::Body {
                section: Some(name.to_ascii_uppercase()),
                origin: None,
                data: lexer.read_nstring()?,
            }
        }
        "BODY" | "BINARY" if lexer.peek() == Some(b'[') => {
            let section = read_section(lexer)?;
            let origin = read_origin(lexer);
            lexer.expect_space()?;
            FetchItem::Body {
                section,
                origin,
                data: lexer.read_nstring()?,
            }
        }
        _ => {
            lexer.expect_space()?;
            skip_value(lexer)?;
            return Ok(None);
        }
    };
    Ok(Some(item))
}

/// Reads `[section]` verbatim. The section may contain a parenthesized
/// field list, so it is scanned as raw bytes up to the closing bracket.
fn read_section(lexer: &mut Lexer<'_>) -> Result<Option<String>> {
    lexer.advance();
    let raw = lexer.take_while(|b| b != b']' && b != b'\r' && b != b'\n');
    if lexer.advance() != Some(b']') {
        return Err(lexer.error("Unterminated body section"));
    }
    Ok((!raw.is_empty()).then(|| String::from_utf8_lossy(raw).into_owned()))
}

fn read_origin(lexer: &mut Lexer<'_>) -> Option<u32> {
    if lexer.peek() != Some(b'<') {
        return None;
    }
    lexer.advance();
    let digits = lexer.take_while(|b| b.is_ascii_digit());
    let origin = std::str::from_utf8(digits).ok()?.parse().ok();
    if lexer.peek() == Some(b'>') {
        lexer.advance();
    }
    origin
}

fn parse_atom_list(lexer: &mut Lexer<'_>) -> Result<Vec<String>> {
    lexer.expect(Token::LParen)?;
    let mut atoms = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => return Ok(atoms),
            Token::Space => {}
            Token::Atom(s) => atoms.push(s.to_string()),
            token => {
                return Err(lexer.error(&format!("Unexpected token in list: {token:?}")));
            }
        }
    }
}

/// Skips one value of an item the client does not model, including nested
/// lists such as BODYSTRUCTURE or ENVELOPE.
fn skip_value(lexer: &mut Lexer<'_>) -> Result<()> {
    let mut depth = 0usize;
    loop {
        match lexer.next_token()? {
            Token::LParen => depth += 1,
            Token::RParen if depth > 0 => depth -= 1,
            Token::RParen | Token::Crlf | Token::Eof => {
                return Err(lexer.error("Truncated FETCH item"));
            }
            _ => {}
        }
        if depth == 0 {
            return Ok(());
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn parse(input: &[u8]) -> Vec<FetchItem> {
        parse_fetch_items(&mut Lexer::new(input)).unwrap()
    }

    #[test]
    fn test_uid_and_flags() {
        let items = parse(b"(UID 812 FLAGS (\\Seen \\Answered))");
        assert_eq!(items[0], FetchItem::Uid(Uid::new(812).unwrap()));
        assert_eq!(
            items[1],
            FetchItem::Flags(vec!["\\Seen".to_string(), "\\Answered".to_string()])
        );
    }

    #[test]
    fn test_header_fields_section() {
        let input = b"(UID 7 BODY[HEADER.FIELDS (FROM TO SUBJECT DATE)] {19}\r\nSubject: Lunch?\r\n\r\n)";
        let items = parse(input);
        assert_eq!(items.len(), 2);
        match &items[1] {
            FetchItem::Body {
                section,
                origin,
                data,
            } => {
                assert_eq!(
                    section.as_deref(),
                    Some("HEADER.FIELDS (FROM TO SUBJECT DATE)")
                );
                assert!(origin.is_none());
                assert_eq!(data.as_deref(), Some(&b"Subject: Lunch?\r\n\r\n"[..]));
            }
            other => panic!("unexpected item {other:?}"),
        }
    }

    #[test]
    fn test_full_body_with_origin_and_nil() {
        let items = parse(b"(BODY[]<0> NIL)");
        assert_eq!(
            items[0],
            FetchItem::Body {
                section: None,
                origin: Some(0),
                data: None,
            }
        );
    }

    #[test]
    fn test_unknown_items_are_skipped() {
        let input = b"(ENVELOPE (\"d\" \"s\" ((NIL NIL \"a\" \"b\")) NIL NIL NIL NIL NIL NIL NIL) UID 3 MODSEQ (12))";
        let items = parse(input);
        assert_eq!(items, vec![FetchItem::Uid(Uid::new(3).unwrap())]);
    }

    #[test]
    fn test_rfc822_item() {
        let items = parse(b"(RFC822 {2}\r\nhi)");
        assert_eq!(
            items[0],
            FetchItem::Body {
                section: Some("RFC822".to_string()),
                origin: None,
                data: Some(b"hi".to_vec()),
            }
        );
    }

    #[test]
    fn test_zero_uid_is_error() {
        assert!(parse_fetch_items(&mut Lexer::new(b"(UID 0)")).is_err());
    }
}
