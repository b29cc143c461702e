//! Command tag generator.

/// Produces sequential tags `A0001`, `A0002`, ... for one connection.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    prefix: char,
    counter: u32,
}

impl TagGenerator {
    /// Creates a generator with the given prefix.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self { prefix, counter: 0 }
    }

    /// Returns the next tag.
    pub fn next_tag(&mut self) -> String {
        self.counter = self.counter.wrapping_add(1).max(1);
        format!("{}{:04}", self.prefix, self.counter)
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('A')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_tags() {
        let mut tags = TagGenerator::default();
        assert_eq!(tags.next_tag(), "A0001");
        assert_eq!(tags.next_tag(), "A0002");
    }

    #[test]
    fn test_custom_prefix_and_wide_counter() {
        let mut tags = TagGenerator {
            prefix: 'x',
            counter: 12_345,
        };
        assert_eq!(tags.next_tag(), "x12346");
    }

    #[test]
    fn test_wraps_past_zero() {
        let mut tags = TagGenerator {
            prefix: 'A',
            counter: u32::MAX,
        };
        assert_eq!(tags.next_tag(), "A0001");
    }
}
