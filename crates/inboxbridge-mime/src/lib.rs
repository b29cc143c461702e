//! # inboxbridge-mime
//!
//! Normalization primitives shared by every InboxBridge provider adapter.
//!
//! ## Features
//!
//! - **Header unfolding**: folded header blocks into a case-insensitive map
//! - **Address display**: `"Name" <addr>` forms into one display string
//! - **Body selection**: plain text wins over HTML anywhere in the part tree
//! - **HTML reduction**: script/style/tag stripping with whitespace collapse
//! - **Message parsing**: RFC 822 messages into a [`MimePart`] tree
//!
//! Apart from [`Message::parse`] and the raw decoders in [`encoding`], nothing
//! here returns an error: missing data degrades to sentinel values.
//!
//! ## Quick Start
//!
//! ```ignore
//! use inboxbridge_mime::{Message, select_body, html_to_text, BodyKind};
//!
//! let message = Message::parse(raw_bytes)?;
//! let body = match select_body(&message.root) {
//!     Some(b) if b.kind == BodyKind::Html => html_to_text(&b.content),
//!     Some(b) => b.content,
//!     None => String::new(),
//! };
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod content_type;
mod error;
mod header;
mod html;
mod message;
mod part;
mod select;

pub mod encoding;

pub use address::{UNKNOWN_ADDRESS, format_mailbox, parse_address, parse_address_list};
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::{HeaderAccumulator, Headers, parse_header_blob};
pub use html::{collapse_whitespace, html_to_text, snippet};
pub use message::{Message, TransferEncoding};
pub use part::MimePart;
pub use select::{BodyKind, SelectedBody, select_body};
