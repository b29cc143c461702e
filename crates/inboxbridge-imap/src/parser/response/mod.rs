//! IMAP response parser.
//!
//! Turns one framed response (a line plus any literals it announced) into a
//! [`Response`].

#![allow(clippy::missing_errors_doc)]

mod fetch;
mod types;

pub use types::{FetchItem, UntaggedResponse};

use crate::parser::lexer::{Lexer, Token};
use crate::types::{ResponseCode, SeqNum, Status, Tag, Uid};
use crate::{Error, Result};

/// A parsed server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Command completion.
    Tagged {
        /// Tag of the completed command.
        tag: Tag,
        /// Completion status.
        status: Status,
        /// Bracketed response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// Server data.
    Untagged(UntaggedResponse),
    /// Command continuation request.
    Continuation {
        /// Optional prompt text.
        text: Option<String>,
    },
}

/// Stateless response parser.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses one complete response.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut lexer = Lexer::new(input);

        match lexer.next_token()? {
            Token::Asterisk => {
                lexer.expect_space()?;
                parse_untagged(&mut lexer).map(Response::Untagged)
            }
            Token::Plus => {
                if lexer.peek() == Some(b' ') {
                    lexer.advance();
                }
                let text = lexer.rest_of_line();
                Ok(Response::Continuation {
                    text: (!text.is_empty()).then_some(text),
                })
            }
            Token::Atom(tag) => {
                let tag = Tag::new(tag);
                lexer.expect_space()?;
                let word = lexer.read_atom()?;
                let status = Status::parse(word)
                    .ok_or_else(|| lexer.error(&format!("Invalid status: {word}")))?;
                let (code, text) = parse_resp_text(&mut lexer)?;
                Ok(Response::Tagged {
                    tag,
                    status,
                    code,
                    text,
                })
            }
            token => Err(Error::Parse {
                position: 0,
                message: format!("Expected *, + or tag, got {token:?}"),
            }),
        }
    }
}

fn parse_untagged(lexer: &mut Lexer<'_>) -> Result<UntaggedResponse> {
    match lexer.next_token()? {
        Token::Number(n) => {
            lexer.expect_space()?;
            let keyword = lexer.read_atom()?.to_ascii_uppercase();
            let seq = || SeqNum::new(n).ok_or_else(|| lexer.error("Sequence number 0"));
            match keyword.as_str() {
                "EXISTS" => Ok(UntaggedResponse::Exists(n)),
                "RECENT" => Ok(UntaggedResponse::Recent(n)),
                "EXPUNGE" => Ok(UntaggedResponse::Expunge(seq()?)),
                "FETCH" => {
                    let seq = seq()?;
                    lexer.expect_space()?;
                    let items = fetch::parse_fetch_items(lexer)?;
                    Ok(UntaggedResponse::Fetch { seq, items })
                }
                _ => {
                    lexer.rest_of_line();
                    Ok(UntaggedResponse::Other(keyword))
                }
            }
        }
        Token::Atom(word) => {
            if let Some(status) = Status::parse(word) {
                let (code, text) = parse_resp_text(lexer)?;
                return Ok(UntaggedResponse::Condition { status, code, text });
            }
            let keyword = word.to_ascii_uppercase();
            let rest = lexer.rest_of_line();
            match keyword.as_str() {
                "CAPABILITY" => Ok(UntaggedResponse::Capability(
                    rest.split_ascii_whitespace().map(str::to_string).collect(),
                )),
                "FLAGS" => Ok(UntaggedResponse::Flags(
                    rest.trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace())
                        .split_ascii_whitespace()
                        .map(str::to_string)
                        .collect(),
                )),
                _ => Ok(UntaggedResponse::Other(keyword)),
            }
        }
        token => Err(lexer.error(&format!("Unexpected token in untagged response: {token:?}"))),
    }
}

/// Parses `[SP] ["[" code "]" SP] text`.
fn parse_resp_text(lexer: &mut Lexer<'_>) -> Result<(Option<ResponseCode>, String)> {
    if lexer.peek() == Some(b' ') {
        lexer.advance();
    }
    let code = if lexer.peek() == Some(b'[') {
        let code = parse_response_code(lexer)?;
        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }
        Some(code)
    } else {
        None
    };
    Ok((code, lexer.rest_of_line()))
}

fn parse_response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.expect(Token::LBracket)?;
    let keyword = lexer.read_atom()?.to_ascii_uppercase();

    let mut number = || -> Result<u32> {
        lexer.expect_space()?;
        lexer.read_number()
    };
    let code = match keyword.as_str() {
        "ALERT" => ResponseCode::Alert,
        "READ-ONLY" => ResponseCode::ReadOnly,
        "READ-WRITE" => ResponseCode::ReadWrite,
        "UIDVALIDITY" => ResponseCode::UidValidity(number()?),
        "UIDNEXT" => match Uid::new(number()?) {
            Some(uid) => ResponseCode::UidNext(uid),
            None => ResponseCode::Other(keyword),
        },
        "UNSEEN" => match SeqNum::new(number()?) {
            Some(seq) => ResponseCode::Unseen(seq),
            None => ResponseCode::Other(keyword),
        },
        _ => ResponseCode::Other(keyword),
    };

    // Codes may carry arguments the client does not model.
    lexer.take_while(|b| b != b']' && b != b'\r' && b != b'\n');
    lexer.expect(Token::RBracket)?;
    Ok(code)
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

    #[test]
    fn test_greeting() {
        let response = ResponseParser::parse(b"* OK Dovecot ready.\r\n").unwrap();
        assert_eq!(
            response,
            Response::Untagged(UntaggedResponse::Condition {
                status: Status::Ok,
                code: None,
                text: "Dovecot ready.".to_string(),
            })
        );
    }

    #[test]
    fn test_greeting_with_capability_code() {
        let response =
            ResponseParser::parse(b"* OK [CAPABILITY IMAP4rev1 IDLE] ready\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Condition { code, text, .. }) => {
                assert_eq!(code, Some(ResponseCode::Other("CAPABILITY".to_string())));
                assert_eq!(text, "ready");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_tagged_no() {
        let response =
            ResponseParser::parse(b"A0001 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
                .unwrap();
        match response {
            Response::Tagged {
                tag, status, text, ..
            } => {
                assert_eq!(tag.as_str(), "A0001");
                assert_eq!(status, Status::No);
                assert_eq!(text, "Invalid credentials");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_tagged_ok_with_read_only() {
        let response = ResponseParser::parse(b"A0002 OK [READ-ONLY] EXAMINE done\r\n").unwrap();
        assert!(matches!(
            response,
            Response::Tagged {
                status: Status::Ok,
                code: Some(ResponseCode::ReadOnly),
                ..
            }
        ));
    }

    #[test]
    fn test_uidvalidity_code() {
        let response =
            ResponseParser::parse(b"* OK [UIDVALIDITY 3857529045] UIDs valid\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Condition { code, .. }) => {
                assert_eq!(code, Some(ResponseCode::UidValidity(3857529045)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_exists_and_recent() {
        assert_eq!(
            ResponseParser::parse(b"* 30 EXISTS\r\n").unwrap(),
            Response::Untagged(UntaggedResponse::Exists(30))
        );
        assert_eq!(
            ResponseParser::parse(b"* 0 RECENT\r\n").unwrap(),
            Response::Untagged(UntaggedResponse::Recent(0))
        );
    }

    #[test]
    fn test_fetch() {
        let response = ResponseParser::parse(b"* 12 FETCH (UID 4096)\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Fetch { seq, items }) => {
                assert_eq!(seq.get(), 12);
                assert_eq!(items, vec![FetchItem::Uid(Uid::new(4096).unwrap())]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_flags() {
        let response =
            ResponseParser::parse(b"* FLAGS (\\Answered \\Flagged \\Seen)\r\n").unwrap();
        assert_eq!(
            response,
            Response::Untagged(UntaggedResponse::Flags(vec![
                "\\Answered".to_string(),
                "\\Flagged".to_string(),
                "\\Seen".to_string(),
            ]))
        );
    }

    #[test]
    fn test_unknown_untagged_is_kept() {
        let response = ResponseParser::parse(b"* LIST (\\HasNoChildren) \"/\" INBOX\r\n").unwrap();
        assert_eq!(
            response,
            Response::Untagged(UntaggedResponse::Other("LIST".to_string()))
        );
    }

    #[test]
    fn test_continuation() {
        assert_eq!(
            ResponseParser::parse(b"+ go ahead\r\n").unwrap(),
            Response::Continuation {
                text: Some("go ahead".to_string())
            }
        );
        assert_eq!(
            ResponseParser::parse(b"+\r\n").unwrap(),
            Response::Continuation { text: None }
        );
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(matches!(
            ResponseParser::parse(b")))\r\n"),
            Err(Error::Parse { .. })
        ));
    }
}
