//! Streaming filter facade
//!
//! [`MarkupFilter`] wires the tokenizer and the collector to an output sink
//! behind a plain write/flush/close contract. Input is consumed one
//! character at a time and never buffered beyond the unit in progress.
//!
//! Binary guard: the first disallowed control character sets a sticky
//! flag. With `pass_by_if_binary_suspect` enabled the filter stops
//! interpreting markup at that point: the partially buffered unit and any
//! open collection are discarded, and all further input (starting with the
//! offending character) is copied to the sink unchanged.

use std::io::{self, Write};

use log::{debug, warn};

use crate::collector::Collector;
use crate::config::FilterConfig;
use crate::error::FilterError;
use crate::hooks::{Hooks, Scraper, Transformer};
use crate::streaming::{Lexeme, Tokenizer, Utf8Decoder};
use crate::telemetry::{
    event_binary_suspect, event_capacity_exceeded, event_closed, event_pass_by, FilterStats,
};

/// Sequential character sink with explicit close
pub trait CharWriter {
    fn write_char(&mut self, c: char) -> Result<(), FilterError>;

    fn write_str(&mut self, text: &str) -> Result<(), FilterError> {
        for c in text.chars() {
            self.write_char(c)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), FilterError>;

    /// Finish the stream; the sink is flushed and released
    fn close(&mut self) -> Result<(), FilterError>;
}

/// Control characters other than tab, LF, VT, FF and CR
pub fn is_binary_hint(c: char) -> bool {
    (c as u32) <= 31 && !matches!(c, '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r')
}

/// Single-pass markup filter writing to `W`
pub struct MarkupFilter<'a, W: Write> {
    sink: Option<W>,
    config: FilterConfig,
    hooks: Hooks<'a>,
    tokenizer: Tokenizer,
    collector: Collector,
    decoder: Utf8Decoder,
    /// Reused buffer for decoded byte input
    decoded: String,
    binary_suspect: bool,
    passing_by: bool,
    chars_in: usize,
    sentences: usize,
    comments: usize,
}

impl<'a, W: Write> MarkupFilter<'a, W> {
    /// Create a filter without hooks
    pub fn new(sink: W, config: FilterConfig) -> Self {
        Self {
            sink: Some(sink),
            tokenizer: Tokenizer::new(config.max_buffer_size, config.initial_buffer_size),
            collector: Collector::new(config.max_buffer_size),
            decoder: Utf8Decoder::new(config.decode_policy),
            decoded: String::new(),
            hooks: Hooks::new(),
            config,
            binary_suspect: false,
            passing_by: false,
            chars_in: 0,
            sentences: 0,
            comments: 0,
        }
    }

    /// Attach a scraper
    pub fn with_scraper(mut self, scraper: &'a mut dyn Scraper) -> Self {
        self.hooks.scraper = Some(scraper);
        self
    }

    /// Attach a transformer
    pub fn with_transformer(mut self, transformer: &'a mut dyn Transformer) -> Self {
        self.hooks.transformer = Some(transformer);
        self
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Whether a disallowed control character has been seen
    pub fn binary_suspect(&self) -> bool {
        self.binary_suspect
    }

    /// Whether the filter has switched to verbatim copying
    pub fn is_passing_by(&self) -> bool {
        self.passing_by
    }

    pub fn is_closed(&self) -> bool {
        self.sink.is_none()
    }

    /// Get the sink, `None` once closed
    pub fn get_ref(&self) -> Option<&W> {
        self.sink.as_ref()
    }

    /// Snapshot of the instance counters
    pub fn stats(&self) -> FilterStats {
        let recovered = self.tokenizer.recovered();
        let counts = self.collector.counts();
        FilterStats {
            chars_in: self.chars_in,
            sentences: self.sentences,
            tags: counts.tags,
            text_runs: counts.texts,
            comments: self.comments,
            collections_opened: counts.collections_opened,
            collections_closed: counts.collections_closed,
            stray_brackets: recovered.stray_brackets,
            recovered_tags: recovered.missing_brackets + recovered.unterminated_quotes,
            binary_suspect: self.binary_suspect,
            passed_by: self.passing_by,
        }
    }

    /// Feed one character
    pub fn write_char(&mut self, c: char) -> Result<(), FilterError> {
        if self.sink.is_none() {
            return Err(FilterError::Closed);
        }
        let position = self.chars_in;
        self.chars_in += 1;

        if self.passing_by {
            return self.emit_char(c);
        }

        if !self.binary_suspect && is_binary_hint(c) {
            self.binary_suspect = true;
            if self.config.log_events {
                event_binary_suspect(position, c).emit();
            }
            if self.config.pass_by_if_binary_suspect {
                self.enter_pass_by(position)?;
                return self.emit_char(c);
            }
        }

        let result = match self.tokenizer.push(c) {
            Ok(Some(lexeme)) => self.dispatch(lexeme),
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        };
        if let Err(FilterError::CapacityExceeded { capacity }) = &result {
            if self.config.log_events {
                event_capacity_exceeded(position, *capacity).emit();
            } else {
                warn!("unit at character {} exceeds {} characters", position, capacity);
            }
        }
        result
    }

    /// Feed a run of characters
    pub fn write_str(&mut self, text: &str) -> Result<(), FilterError> {
        for c in text.chars() {
            self.write_char(c)?;
        }
        Ok(())
    }

    /// Feed exactly `len` characters of `chars` starting at `offset`
    pub fn write_chars(&mut self, chars: &[char], offset: usize, len: usize) -> Result<(), FilterError> {
        let end = match offset.checked_add(len) {
            Some(end) if end <= chars.len() => end,
            _ => {
                return Err(FilterError::OutOfRange {
                    offset,
                    len,
                    available: chars.len(),
                })
            }
        };
        for &c in &chars[offset..end] {
            self.write_char(c)?;
        }
        Ok(())
    }

    /// Feed UTF-8 bytes; sequences may be split across calls
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), FilterError> {
        if self.sink.is_none() {
            return Err(FilterError::Closed);
        }
        if self.passing_by {
            return self.copy_bytes(bytes);
        }

        // Binary hints are ASCII, so the switch point is found on raw bytes
        // and everything after it is copied without decoding
        let switch = if self.config.pass_by_if_binary_suspect {
            bytes.iter().position(|&b| is_binary_hint(char::from(b)))
        } else {
            None
        };
        let Some(at) = switch else {
            return self.decode_and_write(bytes);
        };

        self.decode_and_write(&bytes[..at])?;
        self.write_char(char::from(bytes[at]))?;
        let rest = &bytes[at + 1..];
        if self.passing_by {
            self.copy_bytes(rest)
        } else {
            self.decode_and_write(rest)
        }
    }

    fn decode_and_write(&mut self, bytes: &[u8]) -> Result<(), FilterError> {
        if bytes.is_empty() {
            return Ok(());
        }
        let mut decoded = std::mem::take(&mut self.decoded);
        decoded.clear();
        let result = self
            .decoder
            .decode(bytes, &mut decoded)
            .and_then(|()| self.write_str(&decoded));
        self.decoded = decoded;
        result
    }

    /// Flush the sink and notify the scraper; buffered units stay pending
    pub fn flush(&mut self) -> Result<(), FilterError> {
        self.sink_mut()?.flush()?;
        self.hooks.finish();
        Ok(())
    }

    /// Emit everything still pending, then flush and release the sink.
    /// Closing twice is a no-op.
    pub fn close(&mut self) -> Result<(), FilterError> {
        if self.sink.is_none() {
            return Ok(());
        }
        self.shutdown().map(drop)
    }

    /// Close and hand back the sink
    pub fn finish(mut self) -> Result<W, FilterError> {
        if self.sink.is_none() {
            return Err(FilterError::Closed);
        }
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<W, FilterError> {
        self.flush()?;

        if !self.passing_by {
            let mut tail = String::new();
            self.decoder.finish(&mut tail)?;
            self.write_str(&tail)?;
        }

        if !self.passing_by {
            let quote = self.tokenizer.quote_char();
            if let Some(lexeme) = self.tokenizer.finish() {
                self.dispatch(lexeme)?;
            }
            let finalized = self.collector.finalize(quote, &mut self.hooks)?;
            self.emit_str(&finalized)?;
        }

        let mut sink = self.sink.take().ok_or(FilterError::Closed)?;
        sink.flush()?;
        self.tokenizer.close();
        self.collector.discard();
        self.decoded = String::new();
        self.hooks.finish();

        if self.config.log_events {
            event_closed(self.stats()).emit();
        }
        Ok(sink)
    }

    fn dispatch(&mut self, lexeme: Lexeme) -> Result<(), FilterError> {
        match lexeme {
            Lexeme::Stray(c) => self.emit_char(c),
            Lexeme::Comment(comment) => {
                self.comments += 1;
                self.hooks.scrape_comment(&comment)?;
                self.emit_str(&comment)
            }
            Lexeme::Sentence(sentence) => {
                self.sentences += 1;
                let filtered = self.collector.filter_sentence(&sentence, &mut self.hooks)?;
                self.emit_str(&filtered)
            }
        }
    }

    fn enter_pass_by(&mut self, position: usize) -> Result<(), FilterError> {
        let discarded = self.tokenizer.pending().chars().count();
        if let Some(name) = self.collector.collecting() {
            debug!("pass-by drops open collection <{}>", name);
        }
        self.tokenizer.discard();
        self.collector.discard();
        self.passing_by = true;
        if self.config.log_events {
            event_pass_by(position, discarded).emit();
        } else {
            warn!("binary content at character {}, passing input through", position);
        }

        // A split sequence held back by the decoder precedes the switch point
        let pending = self.decoder.take_pending();
        self.copy_bytes(&pending)
    }

    fn sink_mut(&mut self) -> Result<&mut W, FilterError> {
        self.sink.as_mut().ok_or(FilterError::Closed)
    }

    fn emit_char(&mut self, c: char) -> Result<(), FilterError> {
        let mut utf8 = [0u8; 4];
        self.sink_mut()?.write_all(c.encode_utf8(&mut utf8).as_bytes())?;
        Ok(())
    }

    fn emit_str(&mut self, text: &str) -> Result<(), FilterError> {
        if text.is_empty() {
            return Ok(());
        }
        self.sink_mut()?.write_all(text.as_bytes())?;
        Ok(())
    }

    fn copy_bytes(&mut self, bytes: &[u8]) -> Result<(), FilterError> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.sink_mut()?.write_all(bytes)?;
        Ok(())
    }
}

impl<W: Write> CharWriter for MarkupFilter<'_, W> {
    fn write_char(&mut self, c: char) -> Result<(), FilterError> {
        MarkupFilter::write_char(self, c)
    }

    fn write_str(&mut self, text: &str) -> Result<(), FilterError> {
        MarkupFilter::write_str(self, text)
    }

    fn flush(&mut self) -> Result<(), FilterError> {
        MarkupFilter::flush(self)
    }

    fn close(&mut self) -> Result<(), FilterError> {
        MarkupFilter::close(self)
    }
}

/// Byte-oriented entry point, e.g. for `io::copy`
impl<W: Write> Write for MarkupFilter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        MarkupFilter::flush(self)?;
        Ok(())
    }
}
