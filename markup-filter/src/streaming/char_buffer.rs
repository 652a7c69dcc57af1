//! Bounded Character Buffer
//!
//! Memory for a single lexical unit is capped. This buffer:
//! - Grows on demand up to a hard ceiling, never beyond
//! - Keeps its allocation across `reset` so the next unit reuses it
//! - Fails loudly with `CapacityExceeded` instead of truncating

use crate::error::FilterError;
use crate::markup::Attributes;

/// Append-only character accumulator with a capacity ceiling
#[derive(Debug)]
pub struct CharBuffer {
    /// Accumulated characters
    data: String,
    /// Number of characters in `data`
    len: usize,
    /// Ceiling in characters (fixed, no growth past it)
    max_chars: usize,
}

impl CharBuffer {
    /// Create with a ceiling and an initial allocation hint
    pub fn new(max_chars: usize, initial_capacity: usize) -> Self {
        Self {
            data: String::with_capacity(initial_capacity.min(max_chars)),
            len: 0,
            max_chars,
        }
    }

    /// Create pre-filled with `text`
    pub fn with_content(max_chars: usize, text: &str) -> Result<Self, FilterError> {
        let mut buffer = Self::new(max_chars, text.len());
        buffer.append_str(text)?;
        Ok(buffer)
    }

    /// Append one character
    pub fn append(&mut self, c: char) -> Result<(), FilterError> {
        if self.len >= self.max_chars {
            return Err(FilterError::CapacityExceeded {
                capacity: self.max_chars,
            });
        }
        self.data.push(c);
        self.len += 1;
        Ok(())
    }

    /// Append a run of characters; on failure nothing is appended
    pub fn append_str(&mut self, text: &str) -> Result<(), FilterError> {
        let added = text.chars().count();
        if added > self.max_chars - self.len {
            return Err(FilterError::CapacityExceeded {
                capacity: self.max_chars,
            });
        }
        self.data.push_str(text);
        self.len += added;
        Ok(())
    }

    /// Empty the buffer, keeping its allocation
    pub fn reset(&mut self) {
        self.data.clear();
        self.len = 0;
    }

    /// Number of characters held
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Character at `index`, counted in characters.
    ///
    /// Walks the content from the start, so this is linear in `index`.
    pub fn char_at(&self, index: usize) -> Option<char> {
        self.data.chars().nth(index)
    }

    /// First character, if any
    pub fn first(&self) -> Option<char> {
        self.data.chars().next()
    }

    /// Check whether the content ends with `suffix`
    pub fn ends_with(&self, suffix: &str) -> bool {
        self.data.ends_with(suffix)
    }

    /// Borrow the accumulated content
    pub fn as_str(&self) -> &str {
        &self.data
    }

    /// Copy out the accumulated content; the buffer keeps it
    pub fn contents(&self) -> String {
        self.data.clone()
    }

    /// Interpret the content as attribute text
    pub fn parse_attributes(&self) -> Attributes {
        Attributes::parse(&self.data)
    }

    /// Get the ceiling
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Get the current allocation in bytes
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Release the backing storage
    pub fn close(&mut self) {
        self.data = String::new();
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_read() {
        let mut buffer = CharBuffer::new(64, 4);
        buffer.append('<').unwrap();
        buffer.append_str("a href").unwrap();

        assert_eq!(buffer.len(), 7);
        assert_eq!(buffer.first(), Some('<'));
        assert_eq!(buffer.char_at(2), Some(' '));
        assert_eq!(buffer.as_str(), "<a href");
        assert_eq!(buffer.contents(), "<a href");
        // contents() does not drain
        assert_eq!(buffer.len(), 7);
    }

    #[test]
    fn test_length_counts_characters() {
        let mut buffer = CharBuffer::new(4, 0);
        buffer.append_str("äöü").unwrap();
        assert_eq!(buffer.len(), 3);
        buffer.append('ß').unwrap();
        assert!(buffer.append('x').is_err());
    }

    #[test]
    fn test_memory_limit() {
        let mut buffer = CharBuffer::new(8, 64);
        // Initial allocation never exceeds the ceiling
        assert!(buffer.capacity() < 64);

        buffer.append_str("12345678").unwrap();
        let err = buffer.append('9').unwrap_err();
        assert!(matches!(err, FilterError::CapacityExceeded { capacity: 8 }));
        assert_eq!(buffer.len(), 8);
    }

    #[test]
    fn test_append_str_is_all_or_nothing() {
        let mut buffer = CharBuffer::new(5, 0);
        buffer.append_str("abc").unwrap();
        assert!(buffer.append_str("def").is_err());
        assert_eq!(buffer.as_str(), "abc");
    }

    #[test]
    fn test_reset_keeps_allocation() {
        let mut buffer = CharBuffer::new(1024, 0);
        buffer.append_str("some data that needs room").unwrap();
        let capacity = buffer.capacity();

        buffer.reset();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), capacity);
    }

    #[test]
    fn test_close_releases_storage() {
        let mut buffer = CharBuffer::with_content(1024, "body").unwrap();
        buffer.close();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 0);
    }

    #[test]
    fn test_parse_attributes() {
        let buffer = CharBuffer::with_content(1024, r#" href="x" rel=nofollow"#).unwrap();
        let attributes = buffer.parse_attributes();
        assert_eq!(attributes.get("href"), Some("x"));
        assert_eq!(attributes.get("rel"), Some("nofollow"));
    }
}
