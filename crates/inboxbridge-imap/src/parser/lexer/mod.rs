//! Tokenizer for IMAP server responses.
//!
//! Works on one complete response as delivered by the framed stream, so a
//! `{n}` literal prefix is always followed by its payload in the same buffer.

#![allow(clippy::missing_errors_doc)]

mod token;

pub use token::Token;

use crate::{Error, Result};

/// Cursor over a response buffer.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `input`.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Current byte offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos.min(self.input.len())..]
    }

    /// Returns true when all input is consumed.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Current byte, if any.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Consumes one byte.
    pub fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// Skips up to `n` bytes.
    pub fn skip(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Consumes bytes while `pred` holds and returns them.
    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a [u8] {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    /// Reads the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        let Some(byte) = self.peek() else {
            return Ok(Token::Eof);
        };

        let single = match byte {
            b' ' => Some(Token::Space),
            b'(' => Some(Token::LParen),
            b')' => Some(Token::RParen),
            b'[' => Some(Token::LBracket),
            b']' => Some(Token::RBracket),
            b'*' => Some(Token::Asterisk),
            b'+' => Some(Token::Plus),
            _ => None,
        };
        if let Some(token) = single {
            self.pos += 1;
            return Ok(token);
        }

        match byte {
            b'\r' if self.input.get(self.pos + 1) == Some(&b'\n') => {
                self.pos += 2;
                Ok(Token::Crlf)
            }
            b'\n' => {
                self.pos += 1;
                Ok(Token::Crlf)
            }
            b'"' => self.quoted(),
            b'{' => self.literal(),
            b if is_atom_char(b) => self.atom(),
            b => Err(self.error(&format!("Unexpected character: {b:#04x}"))),
        }
    }

    fn quoted(&mut self) -> Result<Token<'a>> {
        self.pos += 1;
        let mut out = Vec::new();
        loop {
            match self.advance() {
                Some(b'"') => break,
                Some(b'\\') => match self.advance() {
                    Some(c @ (b'"' | b'\\')) => out.push(c),
                    Some(c) => return Err(self.error(&format!("Invalid escape: \\{}", c as char))),
                    None => return Err(self.error("Unterminated quoted string")),
                },
                Some(b'\r' | b'\n') | None => {
                    return Err(self.error("Unterminated quoted string"));
                }
                Some(c) => out.push(c),
            }
        }
        // Servers put raw 8-bit header text in quoted strings; keep it lossy.
        Ok(Token::Quoted(String::from_utf8_lossy(&out).into_owned()))
    }

    fn literal(&mut self) -> Result<Token<'a>> {
        self.pos += 1;
        let digits = self.take_while(|b| b.is_ascii_digit());
        let size: usize = std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| self.error("Invalid literal size"))?;
        // LITERAL+ marker
        if self.peek() == Some(b'+') {
            self.pos += 1;
        }
        if self.advance() != Some(b'}') {
            return Err(self.error("Expected } after literal size"));
        }
        if self.peek() == Some(b'\r') {
            self.pos += 1;
        }
        if self.advance() != Some(b'\n') {
            return Err(self.error("Expected CRLF after literal size"));
        }
        let end = self
            .pos
            .checked_add(size)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| self.error("Incomplete literal data"))?;
        let data = &self.input[self.pos..end];
        self.pos = end;
        Ok(Token::Literal(data))
    }

    fn atom(&mut self) -> Result<Token<'a>> {
        let raw = self.take_while(is_atom_char);
        let s = std::str::from_utf8(raw).map_err(|_| self.error("Invalid UTF-8 in atom"))?;
        if s.bytes().all(|b| b.is_ascii_digit())
            && let Ok(n) = s.parse::<u32>()
        {
            return Ok(Token::Number(n));
        }
        if s.eq_ignore_ascii_case("NIL") {
            return Ok(Token::Nil);
        }
        Ok(Token::Atom(s))
    }

    /// Creates a parse error at the current position.
    pub(crate) fn error(&self, message: &str) -> Error {
        Error::Parse {
            position: self.pos,
            message: message.to_string(),
        }
    }

    /// Consumes a token of the same kind as `expected`.
    #[allow(clippy::needless_pass_by_value)]
    pub fn expect(&mut self, expected: Token<'_>) -> Result<()> {
        let token = self.next_token()?;
        if token.same_kind(&expected) {
            Ok(())
        } else {
            Err(self.error(&format!("Expected {expected:?}, got {token:?}")))
        }
    }

    /// Consumes a single space.
    pub fn expect_space(&mut self) -> Result<()> {
        self.expect(Token::Space)
    }

    /// Reads a number.
    pub fn read_number(&mut self) -> Result<u32> {
        match self.next_token()? {
            Token::Number(n) => Ok(n),
            token => Err(self.error(&format!("Expected number, got {token:?}"))),
        }
    }

    /// Reads an atom, accepting a bare number as its text.
    pub fn read_atom(&mut self) -> Result<&'a str> {
        let start = self.pos;
        match self.next_token()? {
            Token::Atom(s) => Ok(s),
            Token::Number(_) => std::str::from_utf8(&self.input[start..self.pos])
                .map_err(|_| self.error("Invalid UTF-8 in atom")),
            token => Err(self.error(&format!("Expected atom, got {token:?}"))),
        }
    }

    /// Reads an nstring: `NIL`, a quoted string or a literal.
    pub fn read_nstring(&mut self) -> Result<Option<Vec<u8>>> {
        match self.next_token()? {
            Token::Nil => Ok(None),
            Token::Quoted(s) => Ok(Some(s.into_bytes())),
            Token::Literal(data) => Ok(Some(data.to_vec())),
            token => Err(self.error(&format!("Expected nstring, got {token:?}"))),
        }
    }

    /// Returns the rest of the current line as text and consumes the line
    /// terminator.
    pub fn rest_of_line(&mut self) -> String {
        let line = self.take_while(|b| b != b'\r' && b != b'\n');
        if self.peek() == Some(b'\r') {
            self.pos += 1;
        }
        if self.peek() == Some(b'\n') {
            self.pos += 1;
        }
        String::from_utf8_lossy(line).into_owned()
    }
}

/// Returns true for bytes allowed in an atom.
///
/// `\` is accepted so that flags such as `\Seen` lex as one atom, and `.`
/// and `<`/`>` so that `BODY.PEEK` and partial markers stay intact.
#[must_use]
pub const fn is_atom_char(b: u8) -> bool {
    b > 0x20
        && b < 0x7F
        && !matches!(b, b'(' | b')' | b'{' | b'%' | b'*' | b'"' | b']' | b'[')
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

    fn tokens(input: &[u8]) -> Vec<Token<'_>> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token == Token::Eof {
                return out;
            }
            out.push(token);
        }
    }

    #[test]
    fn test_tagged_line() {
        assert_eq!(
            tokens(b"A0001 OK done\r\n"),
            vec![
                Token::Atom("A0001"),
                Token::Space,
                Token::Atom("OK"),
                Token::Space,
                Token::Atom("done"),
                Token::Crlf,
            ]
        );
    }

    #[test]
    fn test_untagged_exists() {
        assert_eq!(
            tokens(b"* 172 EXISTS"),
            vec![
                Token::Asterisk,
                Token::Space,
                Token::Number(172),
                Token::Space,
                Token::Atom("EXISTS"),
            ]
        );
    }

    #[test]
    fn test_quoted_with_escapes() {
        let mut lexer = Lexer::new(br#""say \"hi\" \\ bye""#);
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::Quoted(r#"say "hi" \ bye"#.to_string())
        );
    }

    #[test]
    fn test_unterminated_quoted_is_error() {
        let mut lexer = Lexer::new(b"\"open\r\n");
        assert!(matches!(lexer.next_token(), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_literal_payload() {
        let mut lexer = Lexer::new(b"{5}\r\nHello)");
        assert_eq!(lexer.next_token().unwrap(), Token::Literal(b"Hello"));
        assert_eq!(lexer.next_token().unwrap(), Token::RParen);
    }

    #[test]
    fn test_literal_plus_and_empty() {
        let mut lexer = Lexer::new(b"{0+}\r\n");
        assert_eq!(lexer.next_token().unwrap(), Token::Literal(b""));
    }

    #[test]
    fn test_truncated_literal_is_error() {
        let mut lexer = Lexer::new(b"{10}\r\nshort");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_nil_and_flags() {
        assert_eq!(
            tokens(b"nil \\Seen"),
            vec![Token::Nil, Token::Space, Token::Atom("\\Seen")]
        );
    }

    #[test]
    fn test_section_brackets() {
        assert_eq!(
            tokens(b"BODY[HEADER.FIELDS"),
            vec![
                Token::Atom("BODY"),
                Token::LBracket,
                Token::Atom("HEADER.FIELDS"),
            ]
        );
    }

    #[test]
    fn test_read_atom_accepts_digits() {
        let mut lexer = Lexer::new(b"42");
        assert_eq!(lexer.read_atom().unwrap(), "42");
    }

    #[test]
    fn test_rest_of_line() {
        let mut lexer = Lexer::new(b"text with [brackets]\r\nnext");
        assert_eq!(lexer.rest_of_line(), "text with [brackets]");
        assert_eq!(lexer.remaining(), b"next");
    }
}
