//! # inboxbridge-imap
//!
//! Async IMAP4rev1 client used by InboxBridge to read an INBOX.
//!
//! ## Features
//!
//! - **Type-state connection**: `NotAuthenticated` → `Authenticated` →
//!   `Selected`, enforced at compile time
//! - **TLS via rustls**: verified by default, with an explicit opt-in for
//!   servers with self-signed certificates ([`TlsTrust::AcceptInvalidCerts`])
//! - **Sans-I/O parser**: protocol parsing separated from network I/O
//! - **One-shot operations**: [`mailbox::list_recent`], [`mailbox::fetch_raw`]
//!   and [`mailbox::test_login`], each on its own bounded connection
//!
//! ## Quick Start
//!
//! ```ignore
//! use inboxbridge_imap::{Config, mailbox::{self, Account}};
//!
//! let account = Account {
//!     config: Config::new("imap.example.com"),
//!     username: "ada@example.com".into(),
//!     password: "app-password".into(),
//! };
//! for entry in mailbox::list_recent(&account, 25).await? {
//!     println!("{} {:?}", entry.uid, entry.headers.get("subject"));
//! }
//! ```
//!
//! ## Modules
//!
//! - [`command`]: command builders and tag generation
//! - [`connection`]: configuration, transport, framing and the client
//! - [`mailbox`]: one-shot INBOX operations
//! - [`parser`]: sans-I/O response parser
//! - [`types`]: identifiers, sequence sets and response codes

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod mailbox;
pub mod parser;
pub mod types;

pub use command::{Command, FetchAttribute, TagGenerator};
pub use connection::{
    Authenticated, Client, Config, ConfigBuilder, Fetched, FramedStream, ImapStream,
    NotAuthenticated, Security, Selected, TlsTrust,
};
pub use error::{Error, Result};
pub use mailbox::{Account, HeaderSummary};
pub use parser::{FetchItem, Response, ResponseParser, UntaggedResponse};
pub use types::{MailboxStatus, ResponseCode, SeqNum, SequenceSet, Status, Tag, Uid};
