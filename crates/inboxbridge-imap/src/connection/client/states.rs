//! Connection state types.

use crate::types::MailboxStatus;

/// Connected and greeted, not yet logged in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Logged in, no mailbox open.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

/// A mailbox is open.
///
/// Unlike the other states this one carries data: the mailbox name and the
/// status the server reported when it was opened.
#[derive(Debug, Clone)]
pub struct Selected {
    pub(crate) mailbox: String,
    pub(crate) status: MailboxStatus,
}

impl Selected {
    /// Name of the open mailbox.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        &self.mailbox
    }

    /// Status reported on open.
    #[must_use]
    pub const fn status(&self) -> &MailboxStatus {
        &self.status
    }
}
