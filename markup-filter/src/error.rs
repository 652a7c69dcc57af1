//! Error types for the markup filter
//!
//! Malformed markup is never an error: the tokenizer and collector recover
//! locally. What remains are the conditions a caller must see: a unit that
//! outgrew its buffer, a failing sink, rejected byte input and failures
//! raised by the scraper or transformer hooks.

use std::error::Error as StdError;

use thiserror::Error;

/// Errors surfaced by [`MarkupFilter`](crate::MarkupFilter)
#[derive(Debug, Error)]
pub enum FilterError {
    /// A pending unit or a collected body grew past the buffer ceiling
    #[error("buffer capacity of {capacity} characters exceeded")]
    CapacityExceeded { capacity: usize },

    /// The output sink failed
    #[error("sink I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Byte input was not valid UTF-8 under the strict decode policy
    #[error("invalid UTF-8 sequence at byte offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// Bulk write range does not fit the supplied slice
    #[error("write range {offset}..{offset}+{len} out of bounds for {available} characters")]
    OutOfRange {
        offset: usize,
        len: usize,
        available: usize,
    },

    /// The filter was already closed
    #[error("filter is closed")]
    Closed,

    /// A scraper or transformer hook failed
    #[error(transparent)]
    Hook(#[from] HookError),
}

impl FilterError {
    /// Check if this error came from a buffer ceiling
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, FilterError::CapacityExceeded { .. })
    }
}

impl From<FilterError> for std::io::Error {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::Io(e) => e,
            FilterError::InvalidUtf8 { .. } => {
                std::io::Error::new(std::io::ErrorKind::InvalidData, err)
            }
            other => std::io::Error::other(other),
        }
    }
}

/// Failure reported by a [`Scraper`](crate::Scraper) or
/// [`Transformer`](crate::Transformer) hook
#[derive(Debug, Error)]
#[error("hook failed: {0}")]
pub struct HookError(#[source] Box<dyn StdError + Send + Sync + 'static>);

impl HookError {
    /// Wrap any error raised inside a hook
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self(err.into())
    }

    /// Get the wrapped error
    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync + 'static> {
        self.0
    }
}
