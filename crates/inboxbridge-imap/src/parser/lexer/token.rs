//! Lexer tokens.

/// One lexical unit of a server response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Unquoted run of atom characters.
    Atom(&'a str),
    /// Run of ASCII digits that fits in a `u32`.
    Number(u32),
    /// Quoted string with escapes resolved.
    Quoted(String),
    /// Literal payload announced by a `{n}` prefix.
    Literal(&'a [u8]),
    /// `NIL`.
    Nil,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// Single space.
    Space,
    /// `*` untagged prefix.
    Asterisk,
    /// `+` continuation prefix.
    Plus,
    /// Line terminator.
    Crlf,
    /// End of input.
    Eof,
}

impl Token<'_> {
    /// Returns true if both tokens are the same kind, ignoring payloads.
    #[must_use]
    pub fn same_kind(&self, other: &Token<'_>) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}
