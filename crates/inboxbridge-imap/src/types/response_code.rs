//! Completion status and bracketed response codes.

use super::{SeqNum, Uid};

/// Status word of a tagged or untagged condition response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
    /// Server greeting for a pre-authenticated session.
    PreAuth,
    /// Server is closing the connection.
    Bye,
}

impl Status {
    /// Parses a status keyword, case-insensitively.
    #[must_use]
    pub fn parse(word: &str) -> Option<Self> {
        const WORDS: [(&str, Status); 5] = [
            ("OK", Status::Ok),
            ("NO", Status::No),
            ("BAD", Status::Bad),
            ("PREAUTH", Status::PreAuth),
            ("BYE", Status::Bye),
        ];
        WORDS
            .iter()
            .find(|(w, _)| w.eq_ignore_ascii_case(word))
            .map(|&(_, status)| status)
    }

    /// Returns true for OK and PREAUTH.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PreAuth)
    }
}

/// Bracketed code carried in response text, e.g. `[UIDVALIDITY 3857529045]`.
///
/// Only the codes the read-only client acts on get their own variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// ALERT: text that must be shown to the user.
    Alert,
    /// READ-ONLY: mailbox opened without write access.
    ReadOnly,
    /// READ-WRITE: mailbox opened with write access.
    ReadWrite,
    /// UIDNEXT: next UID the server will assign.
    UidNext(Uid),
    /// UIDVALIDITY: epoch for UIDs in this mailbox.
    UidValidity(u32),
    /// UNSEEN: first unseen message.
    Unseen(SeqNum),
    /// Any other code, keyword only.
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(Status::parse("ok"), Some(Status::Ok));
        assert_eq!(Status::parse("No"), Some(Status::No));
        assert_eq!(Status::parse("PREAUTH"), Some(Status::PreAuth));
        assert_eq!(Status::parse("MAYBE"), None);
    }

    #[test]
    fn test_status_is_ok() {
        assert!(Status::Ok.is_ok());
        assert!(Status::PreAuth.is_ok());
        assert!(!Status::Bye.is_ok());
    }
}
