//! Service layer.
//!
//! This is the surface callers use: it clamps inputs, dispatches to a
//! [`crate::provider::MailProvider`] and shapes the results.

mod inbox;

pub use inbox::{
    DEFAULT_LIST_MAX, MAX_LIST, credentials_for, get_message_detail, inbox_summary, list_messages,
    search_messages, test_connection,
};
