//! IMAP command tag generator.

/// Generates sequential tags in the format "A0000", "A0001", etc.
///
/// The counter wraps after `u32::MAX`; a session never issues that many
/// commands, and tags only need to be unique among in-flight commands.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    counter: u32,
    prefix: char,
}

impl TagGenerator {
    /// Creates a new tag generator with the given prefix.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self { counter: 0, prefix }
    }

    /// Generates the next tag.
    pub fn next_tag(&mut self) -> String {
        let n = self.counter;
        self.counter = self.counter.wrapping_add(1);
        format!("{}{n:04}", self.prefix)
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
    fn test_tag_sequence() {
        let mut generator = TagGenerator::default();
        assert_eq!(generator.next_tag(), "A0000");
        assert_eq!(generator.next_tag(), "A0001");
    }

    #[test]
    fn test_custom_prefix_and_padding() {
        let mut generator = TagGenerator::new('T');
        for _ in 0..12 {
            let _ = generator.next_tag();
        }
        assert_eq!(generator.next_tag(), "T0012");
    }
}
