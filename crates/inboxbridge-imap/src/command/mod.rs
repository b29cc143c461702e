//! Commands the client sends.

mod serialize;
mod tag_generator;

use crate::types::SequenceSet;

pub use serialize::has_line_break;
pub use tag_generator::TagGenerator;

use serialize::write_astring;

/// Header fields requested for listings.
pub const LIST_HEADER_FIELDS: &str = "FROM TO SUBJECT DATE";

/// One FETCH data item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// `UID`
    Uid,
    /// `FLAGS`
    Flags,
    /// `BODY.PEEK[HEADER.FIELDS (...)]`, which does not set `\Seen`.
    HeaderFields(Vec<String>),
    /// `BODY.PEEK[]`, the whole message without setting `\Seen`.
    FullBody,
}

impl FetchAttribute {
    /// The header fields used for inbox listings.
    #[must_use]
    pub fn listing_headers() -> Self {
        Self::HeaderFields(
            LIST_HEADER_FIELDS
                .split(' ')
                .map(str::to_string)
                .collect(),
        )
    }

    fn write(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Uid => buf.extend_from_slice(b"UID"),
            Self::Flags => buf.extend_from_slice(b"FLAGS"),
            Self::HeaderFields(fields) => {
                buf.extend_from_slice(b"BODY.PEEK[HEADER.FIELDS (");
                buf.extend_from_slice(fields.join(" ").as_bytes());
                buf.extend_from_slice(b")]");
            }
            Self::FullBody => buf.extend_from_slice(b"BODY.PEEK[]"),
        }
    }
}

/// IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// LOGIN with a plain username and password.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// EXAMINE (read-only SELECT).
    Examine {
        /// Mailbox name.
        mailbox: String,
    },
    /// FETCH by sequence number.
    Fetch {
        /// Messages to fetch.
        set: SequenceSet,
        /// Data items.
        items: Vec<FetchAttribute>,
    },
    /// UID FETCH.
    UidFetch {
        /// UIDs to fetch.
        set: SequenceSet,
        /// Data items.
        items: Vec<FetchAttribute>,
    },
    /// LOGOUT.
    Logout,
}

impl Command {
    /// Serializes the command with its tag and trailing CRLF.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');

        match self {
            Self::Login { username, password } => {
                buf.extend_from_slice(b"LOGIN ");
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }
            Self::Examine { mailbox } => {
                buf.extend_from_slice(b"EXAMINE ");
                write_astring(&mut buf, mailbox);
            }
            Self::Fetch { set, items } => {
                buf.extend_from_slice(b"FETCH ");
                write_fetch(&mut buf, set, items);
            }
            Self::UidFetch { set, items } => {
                buf.extend_from_slice(b"UID FETCH ");
                write_fetch(&mut buf, set, items);
            }
            Self::Logout => buf.extend_from_slice(b"LOGOUT"),
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Command name for logging. Never includes arguments.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "LOGIN",
            Self::Examine { .. } => "EXAMINE",
            Self::Fetch { .. } => "FETCH",
            Self::UidFetch { .. } => "UID FETCH",
            Self::Logout => "LOGOUT",
        }
    }
}

fn write_fetch(buf: &mut Vec<u8>, set: &SequenceSet, items: &[FetchAttribute]) {
    buf.extend_from_slice(set.to_string().as_bytes());
    buf.push(b' ');
    if let [single] = items {
        single.write(buf);
        return;
    }
    buf.push(b'(');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            buf.push(b' ');
        }
        item.write(buf);
    }
    buf.push(b')');
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

    fn wire(cmd: &Command, tag: &str) -> String {
        String::from_utf8(cmd.serialize(tag)).unwrap()
    }

    #[test]
    fn test_login() {
        let cmd = Command::Login {
            username: "ada@example.org".to_string(),
            password: "s3cret pass".to_string(),
        };
        assert_eq!(
            wire(&cmd, "A0001"),
            "A0001 LOGIN ada@example.org \"s3cret pass\"\r\n"
        );
    }

    #[test]
    fn test_examine() {
        let cmd = Command::Examine {
            mailbox: "INBOX".to_string(),
        };
        assert_eq!(wire(&cmd, "A0002"), "A0002 EXAMINE INBOX\r\n");
    }

    #[test]
    fn test_listing_fetch() {
        let cmd = Command::Fetch {
            set: SequenceSet::most_recent(30, 25).unwrap(),
            items: vec![FetchAttribute::Uid, FetchAttribute::listing_headers()],
        };
        assert_eq!(
            wire(&cmd, "A0003"),
            "A0003 FETCH 6:30 (UID BODY.PEEK[HEADER.FIELDS (FROM TO SUBJECT DATE)])\r\n"
        );
    }

    #[test]
    fn test_uid_fetch_full_body() {
        let cmd = Command::UidFetch {
            set: SequenceSet::Single(4711),
            items: vec![FetchAttribute::Uid, FetchAttribute::FullBody],
        };
        assert_eq!(
            wire(&cmd, "A0003"),
            "A0003 UID FETCH 4711 (UID BODY.PEEK[])\r\n"
        );
    }

    #[test]
    fn test_single_item_is_not_parenthesized() {
        let cmd = Command::Fetch {
            set: SequenceSet::Single(1),
            items: vec![FetchAttribute::Flags],
        };
        assert_eq!(wire(&cmd, "B1"), "B1 FETCH 1 FLAGS\r\n");
    }

    #[test]
    fn test_name_hides_arguments() {
        let cmd = Command::Login {
            username: "u".to_string(),
            password: "p".to_string(),
        };
        assert_eq!(cmd.name(), "LOGIN");
        assert_eq!(Command::Logout.name(), "LOGOUT");
    }
}
