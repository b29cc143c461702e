//! Mailbox state reported on EXAMINE.

use super::{ResponseCode, Uid};

/// Mailbox status gathered from the untagged data that EXAMINE returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxStatus {
    /// Number of messages in the mailbox.
    pub exists: u32,
    /// Number of messages with the `\Recent` flag.
    pub recent: u32,
    /// Next UID to be assigned.
    pub uid_next: Option<Uid>,
    /// UIDVALIDITY value.
    pub uid_validity: Option<u32>,
    /// Whether the mailbox was opened read-only.
    pub read_only: bool,
}

impl MailboxStatus {
    /// Folds a response code into the status.
    pub fn apply_code(&mut self, code: &ResponseCode) {
        match code {
            ResponseCode::UidNext(uid) => self.uid_next = Some(*uid),
            ResponseCode::UidValidity(v) => self.uid_validity = Some(*v),
            ResponseCode::ReadOnly => self.read_only = true,
            ResponseCode::ReadWrite => self.read_only = false,
            _ => {}
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_code() {
        let mut status = MailboxStatus::default();
        status.apply_code(&ResponseCode::UidValidity(3_857_529_045));
        status.apply_code(&ResponseCode::UidNext(Uid::new(4392).unwrap()));
        status.apply_code(&ResponseCode::ReadOnly);
        status.apply_code(&ResponseCode::Alert);

        assert_eq!(status.uid_validity, Some(3_857_529_045));
        assert_eq!(status.uid_next.map(Uid::get), Some(4392));
        assert!(status.read_only);
        assert_eq!(status.exists, 0);
    }
}
