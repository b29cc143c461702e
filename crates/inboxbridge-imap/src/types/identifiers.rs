//! Tags, sequence numbers and UIDs.

use std::fmt;
use std::num::NonZeroU32;

/// IMAP command tag.
///
/// Every command carries a fresh tag and the server echoes it on the
/// completion line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(String);

impl Tag {
    /// Creates a tag from a string.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! nonzero_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Wraps a raw value. Returns `None` for 0.
            #[must_use]
            pub const fn new(n: u32) -> Option<Self> {
                match NonZeroU32::new(n) {
                    Some(v) => Some(Self(v)),
                    None => None,
                }
            }

            /// Returns the raw value.
            #[must_use]
            pub const fn get(self) -> u32 {
                self.0.get()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

nonzero_id!(
    /// Message sequence number, 1-based and only stable for one session.
    SeqNum
);

nonzero_id!(
    /// Persistent message identifier within one mailbox.
    Uid
);

impl std::str::FromStr for Uid {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<NonZeroU32>().map(Self)
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
    use super::*;

    #[test]
    fn test_zero_is_rejected() {
        assert!(SeqNum::new(0).is_none());
        assert!(Uid::new(0).is_none());
        assert_eq!(SeqNum::new(7).unwrap().get(), 7);
    }

    #[test]
    fn test_display() {
        assert_eq!(Uid::new(4242).unwrap().to_string(), "4242");
        assert_eq!(Tag::new("A0003").to_string(), "A0003");
    }

    #[test]
    fn test_uid_from_str() {
        assert_eq!("  88 ".parse::<Uid>().unwrap().get(), 88);
        assert!("0".parse::<Uid>().is_err());
        assert!("abc".parse::<Uid>().is_err());
    }
}
