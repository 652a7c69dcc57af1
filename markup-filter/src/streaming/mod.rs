//! Streaming primitives for single-pass markup filtering
//!
//! - bounded character buffer with a hard ceiling
//! - incremental UTF-8 decoding across chunk boundaries
//! - character-level tokenizer producing tags, text runs and comments

pub mod char_buffer;
pub mod tokenizer;
pub mod utf8_buffer;

pub use char_buffer::CharBuffer;
pub use tokenizer::{
    is_tag_name_char, LexMode, Lexeme, RecoveryCounts, Sentence, SentenceKind, Tokenizer,
    DOUBLE_QUOTE, LB, RB, SINGLE_QUOTE,
};
pub use utf8_buffer::Utf8Decoder;
