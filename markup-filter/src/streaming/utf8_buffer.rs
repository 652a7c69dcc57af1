//! UTF-8 Boundary Handler
//!
//! Byte input arrives in arbitrary chunks, so a multi-byte character can be
//! split between two writes. The decoder holds back the incomplete tail of
//! a chunk until the next one completes it.
//!
//! A UTF-8 character can be 1-4 bytes:
//! - 1 byte:  0xxxxxxx (ASCII)
//! - 2 bytes: 110xxxxx 10xxxxxx
//! - 3 bytes: 1110xxxx 10xxxxxx 10xxxxxx
//! - 4 bytes: 11110xxx 10xxxxxx 10xxxxxx 10xxxxxx

use crate::config::DecodePolicy;
use crate::error::FilterError;

/// Incremental UTF-8 decoder for chunked byte input
#[derive(Debug)]
pub struct Utf8Decoder {
    /// Leftover bytes from previous chunk (max 3 bytes of an unfinished char)
    leftover: [u8; 4],
    /// Number of leftover bytes
    leftover_len: usize,
    /// What to do with invalid sequences
    policy: DecodePolicy,
    /// Bytes consumed so far, for error offsets
    consumed: usize,
}

impl Utf8Decoder {
    /// Create a new decoder
    pub fn new(policy: DecodePolicy) -> Self {
        Self {
            leftover: [0u8; 4],
            leftover_len: 0,
            policy,
            consumed: 0,
        }
    }

    /// Decode `chunk`, appending every completed character to `out`.
    ///
    /// An incomplete sequence at the end of the chunk is kept for the next
    /// call.
    pub fn decode(&mut self, chunk: &[u8], out: &mut String) -> Result<(), FilterError> {
        let mut rest = chunk;

        if self.leftover_len > 0 {
            let expected = Self::sequence_length(self.leftover[0]);
            let needed = expected.saturating_sub(self.leftover_len);
            let mut taken = 0;
            while taken < needed && taken < rest.len() && Self::is_continuation(rest[taken]) {
                self.leftover[self.leftover_len] = rest[taken];
                self.leftover_len += 1;
                taken += 1;
            }
            rest = &rest[taken..];

            if self.leftover_len < expected && rest.is_empty() {
                // Still incomplete, wait for more input
                return Ok(());
            }

            let pending = self.leftover;
            let pending_len = self.leftover_len;
            self.leftover_len = 0;
            self.push_valid(&pending[..pending_len], out)?;
        }

        let (valid_end, tail) = Self::find_valid_boundary(rest);
        self.push_valid(&rest[..valid_end], out)?;

        if let Some(len) = tail {
            self.leftover[..len].copy_from_slice(&rest[valid_end..]);
            self.leftover_len = len;
        }
        Ok(())
    }

    /// Resolve a dangling partial sequence at end of input
    pub fn finish(&mut self, out: &mut String) -> Result<(), FilterError> {
        if self.leftover_len == 0 {
            return Ok(());
        }
        let pending = self.leftover;
        let pending_len = self.leftover_len;
        self.leftover_len = 0;
        self.push_valid(&pending[..pending_len], out)
    }

    /// Bytes held back waiting for their continuation
    pub fn pending(&self) -> &[u8] {
        &self.leftover[..self.leftover_len]
    }

    /// Take the held-back bytes, leaving the decoder empty
    pub fn take_pending(&mut self) -> Vec<u8> {
        let pending = self.pending().to_vec();
        self.leftover_len = 0;
        pending
    }

    fn push_valid(&mut self, bytes: &[u8], out: &mut String) -> Result<(), FilterError> {
        match self.policy {
            DecodePolicy::Lossy => out.push_str(&String::from_utf8_lossy(bytes)),
            DecodePolicy::Strict => match std::str::from_utf8(bytes) {
                Ok(text) => out.push_str(text),
                Err(e) => {
                    return Err(FilterError::InvalidUtf8 {
                        offset: self.consumed + e.valid_up_to(),
                    })
                }
            },
        }
        self.consumed += bytes.len();
        Ok(())
    }

    /// Check if byte is a UTF-8 continuation byte (10xxxxxx)
    #[inline]
    pub fn is_continuation(byte: u8) -> bool {
        (byte & 0b1100_0000) == 0b1000_0000
    }

    /// Get expected length of UTF-8 sequence from first byte
    #[inline]
    pub fn sequence_length(first_byte: u8) -> usize {
        match first_byte {
            0x00..=0x7F => 1, // ASCII
            0xC0..=0xDF => 2, // 2-byte sequence
            0xE0..=0xEF => 3, // 3-byte sequence
            0xF0..=0xF7 => 4, // 4-byte sequence
            _ => 1,           // Invalid, treat as single byte
        }
    }

    /// Find the end of the last complete sequence; returns the length of an
    /// incomplete trailing sequence if there is one
    fn find_valid_boundary(chunk: &[u8]) -> (usize, Option<usize>) {
        let mut i = chunk.len();
        while i > 0 && i > chunk.len().saturating_sub(4) {
            i -= 1;
            if !Self::is_continuation(chunk[i]) {
                let expected_len = Self::sequence_length(chunk[i]);
                let available = chunk.len() - i;
                if available < expected_len {
                    return (i, Some(available));
                }
                break;
            }
        }
        (chunk.len(), None)
    }
}

impl Default for Utf8Decoder {
    fn default() -> Self {
        Self::new(DecodePolicy::default())
    }
}
