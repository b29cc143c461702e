//! Sequence sets for message ranges.

use std::fmt;

use super::Uid;

/// A set of sequence numbers or UIDs as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSet {
    /// Single number.
    Single(u32),
    /// Inclusive range.
    Range(u32, u32),
}

impl SequenceSet {
    /// Creates a set holding one UID.
    #[must_use]
    pub const fn uid(uid: Uid) -> Self {
        Self::Single(uid.get())
    }

    /// The window holding the newest `n` messages of a mailbox with `total`
    /// messages: `max(1, total - n + 1):total`.
    ///
    /// Returns `None` when the mailbox is empty or `n` is 0.
    #[must_use]
    pub const fn most_recent(total: u32, n: u32) -> Option<Self> {
        if total == 0 || n == 0 {
            return None;
        }
        let start = if n >= total { 1 } else { total - n + 1 };
        Some(Self::Range(start, total))
    }
}

impl fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
        }
    }
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
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_most_recent_window() {
        assert_eq!(SequenceSet::most_recent(30, 25).unwrap().to_string(), "6:30");
        assert_eq!(SequenceSet::most_recent(10, 25).unwrap().to_string(), "1:10");
        assert_eq!(SequenceSet::most_recent(25, 25).unwrap().to_string(), "1:25");
        assert_eq!(SequenceSet::most_recent(1, 5).unwrap().to_string(), "1:1");
    }

    #[test]
    fn test_most_recent_empty_mailbox() {
        assert!(SequenceSet::most_recent(0, 20).is_none());
        assert!(SequenceSet::most_recent(12, 0).is_none());
    }

    #[test]
    fn test_single_from_ids() {
        let uid = Uid::new(901).unwrap();
        assert_eq!(SequenceSet::uid(uid).to_string(), "901");
    }

    proptest! {
        #[test]
        fn most_recent_covers_min_of_total_and_n(total in 1u32..10_000, n in 1u32..200) {
            let Some(SequenceSet::Range(start, end)) = SequenceSet::most_recent(total, n) else {
                panic!("window is always a range");
            };
            prop_assert_eq!(end, total);
            prop_assert_eq!(end - start + 1, n.min(total));
        }
    }
}
