//! Parsed response data.

use crate::types::{ResponseCode, SeqNum, Status, Uid};

/// One data item inside a FETCH response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItem {
    /// Message UID.
    Uid(Uid),
    /// Flag list, kept as the raw atoms.
    Flags(Vec<String>),
    /// Size of the full message in octets.
    Rfc822Size(u32),
    /// Server-side arrival date.
    InternalDate(String),
    /// `BODY[section]<origin>` payload. `RFC822*` items land here too,
    /// with the item name as the section.
    Body {
        /// Section specifier between the brackets, if non-empty.
        section: Option<String>,
        /// Partial fetch origin.
        origin: Option<u32>,
        /// Payload, `None` for NIL.
        data: Option<Vec<u8>>,
    },
}

/// Untagged server data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedResponse {
    /// OK, NO, BAD, PREAUTH or BYE with optional code and text.
    Condition {
        /// Status word.
        status: Status,
        /// Bracketed response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// CAPABILITY list.
    Capability(Vec<String>),
    /// FLAGS list for the opened mailbox.
    Flags(Vec<String>),
    /// Message count.
    Exists(u32),
    /// Recent count.
    Recent(u32),
    /// A message was expunged.
    Expunge(SeqNum),
    /// FETCH data for one message.
    Fetch {
        /// Sequence number of the message.
        seq: SeqNum,
        /// Data items.
        items: Vec<FetchItem>,
    },
    /// Any untagged data the client does not use, by keyword.
    Other(String),
}
