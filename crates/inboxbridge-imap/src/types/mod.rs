//! Core IMAP types.

mod identifiers;
mod mailbox;
mod response_code;
mod sequence;

pub use identifiers::{SeqNum, Tag, Uid};
pub use mailbox::MailboxStatus;
pub use response_code::{ResponseCode, Status};
pub use sequence::SequenceSet;
