//! Character-level markup tokenizer
//!
//! One character in, at most one lexical unit out. The tokenizer never looks
//! ahead: every decision is made from the current character and the unit
//! buffered so far. Malformed input is repaired locally:
//! - a stray `>` outside any unit is passed through untouched
//! - a `<` inside an unfinished tag ends that tag (missing `>`)
//! - a `>` inside an unfinished quote ends the tag (missing quote)

use log::debug;

use super::char_buffer::CharBuffer;
use crate::error::FilterError;

pub const LB: char = '<';
pub const RB: char = '>';
pub const SINGLE_QUOTE: char = '\'';
pub const DOUBLE_QUOTE: char = '"';

const COMMENT_OPEN_PREFIX: &str = "<!-";
const COMMENT_CLOSE: &str = "-->";
/// Shortest complete comment is `<!---->`
const MIN_COMMENT_LEN: usize = 7;

/// Lexical sub-state of the tokenizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexMode {
    /// Outside tags: buffer empty or holding a text run
    Plain,
    /// Buffer holds an unfinished tag
    InTag,
    InSingleQuote,
    InDoubleQuote,
    InComment,
}

impl LexMode {
    /// Quote character used when re-serializing a unit finished in this mode
    pub fn quote_char(self) -> char {
        match self {
            LexMode::InSingleQuote => SINGLE_QUOTE,
            _ => DOUBLE_QUOTE,
        }
    }
}

/// A complete lexical unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lexeme {
    /// A `>` that belongs to no unit
    Stray(char),
    /// A tag or a text run, with the quote char for re-serialization
    Sentence(Sentence),
    /// A full comment including delimiters
    Comment(String),
}

/// A tag or text run ready for classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub text: String,
    pub quote: char,
}

/// What a sentence turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceKind<'s> {
    Text(&'s str),
    Tag {
        /// Lowercased tag name, may be empty
        name: &'s str,
        opening: bool,
        /// Inner text after the name, without the closing `>`
        raw: &'s str,
    },
}

impl Sentence {
    pub fn new(text: impl Into<String>, quote: char) -> Self {
        Self {
            text: text.into(),
            quote,
        }
    }

    /// Split into tag name and raw content, or report plain text.
    ///
    /// Tag names are ASCII letters, digits, `!` and `-`; the name is
    /// returned as written, callers lowercase it.
    pub fn classify(&self) -> SentenceKind<'_> {
        let text = self.text.as_str();
        let Some(body) = text.strip_prefix(LB) else {
            return SentenceKind::Text(text);
        };
        if text.chars().nth(2).is_none() {
            // `<` or `<x`: too short to be a tag
            return SentenceKind::Text(text);
        }

        let (opening, rest) = match body.strip_prefix('/') {
            Some(rest) => (false, rest),
            None => (true, body),
        };
        let rest = rest.strip_suffix(RB).unwrap_or(rest);
        let end = rest
            .find(|c: char| !is_tag_name_char(c))
            .unwrap_or(rest.len());

        SentenceKind::Tag {
            name: &rest[..end],
            opening,
            raw: &rest[end..],
        }
    }
}

/// Characters accepted in a tag name
pub fn is_tag_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '!' || c == '-'
}

/// Counters for the recovery heuristics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryCounts {
    pub stray_brackets: usize,
    pub missing_brackets: usize,
    pub unterminated_quotes: usize,
}

/// Streaming tokenizer over single characters
#[derive(Debug)]
pub struct Tokenizer {
    /// Pending unit
    buffer: CharBuffer,
    mode: LexMode,
    recovered: RecoveryCounts,
}

impl Tokenizer {
    pub fn new(max_chars: usize, initial_capacity: usize) -> Self {
        Self {
            buffer: CharBuffer::new(max_chars, initial_capacity),
            mode: LexMode::Plain,
            recovered: RecoveryCounts::default(),
        }
    }

    pub fn mode(&self) -> LexMode {
        self.mode
    }

    /// The unit buffered so far
    pub fn pending(&self) -> &str {
        self.buffer.as_str()
    }

    pub fn recovered(&self) -> RecoveryCounts {
        self.recovered
    }

    /// Quote character in effect for the pending unit
    pub fn quote_char(&self) -> char {
        self.mode.quote_char()
    }

    /// Advance by one character
    pub fn push(&mut self, c: char) -> Result<Option<Lexeme>, FilterError> {
        match self.mode {
            LexMode::InSingleQuote | LexMode::InDoubleQuote => self.push_quoted(c),
            LexMode::InComment => self.push_comment(c),
            LexMode::InTag => self.push_tag(c),
            LexMode::Plain => self.push_plain(c),
        }
    }

    fn push_quoted(&mut self, c: char) -> Result<Option<Lexeme>, FilterError> {
        let quote = self.mode.quote_char();
        self.buffer.append(c)?;
        if c == quote {
            self.mode = LexMode::InTag;
        }
        if c == RB && self.buffer.first() == Some(LB) {
            // An unescaped `>` inside a quote is taken as the real tag end
            if self.mode != LexMode::InTag {
                self.recovered.unterminated_quotes += 1;
                debug!("unterminated {} quote, closing tag at '>'", quote);
            }
            return Ok(Some(self.take_sentence(quote)));
        }
        Ok(None)
    }

    fn push_comment(&mut self, c: char) -> Result<Option<Lexeme>, FilterError> {
        self.buffer.append(c)?;
        if c == RB && self.buffer.len() >= MIN_COMMENT_LEN && self.buffer.ends_with(COMMENT_CLOSE) {
            let comment = self.buffer.contents();
            self.buffer.reset();
            self.mode = LexMode::Plain;
            return Ok(Some(Lexeme::Comment(comment)));
        }
        Ok(None)
    }

    fn push_tag(&mut self, c: char) -> Result<Option<Lexeme>, FilterError> {
        match c {
            SINGLE_QUOTE => {
                self.buffer.append(c)?;
                self.mode = LexMode::InSingleQuote;
                Ok(None)
            }
            DOUBLE_QUOTE => {
                self.buffer.append(c)?;
                self.mode = LexMode::InDoubleQuote;
                Ok(None)
            }
            '-' if self.buffer.as_str() == COMMENT_OPEN_PREFIX => {
                self.buffer.append(c)?;
                self.mode = LexMode::InComment;
                Ok(None)
            }
            RB => {
                self.buffer.append(c)?;
                Ok(Some(self.take_sentence(DOUBLE_QUOTE)))
            }
            LB => {
                // Missing `>`: emit what we have and start over
                self.recovered.missing_brackets += 1;
                debug!("missing '>' before new tag, recovering: {:?}", self.buffer.as_str());
                let sentence = self.take_sentence(DOUBLE_QUOTE);
                self.start_unit(c)?;
                Ok(Some(sentence))
            }
            _ => {
                self.buffer.append(c)?;
                Ok(None)
            }
        }
    }

    fn push_plain(&mut self, c: char) -> Result<Option<Lexeme>, FilterError> {
        if self.buffer.is_empty() {
            if c == RB {
                self.recovered.stray_brackets += 1;
                debug!("stray '>' passed through");
                return Ok(Some(Lexeme::Stray(c)));
            }
            self.start_unit(c)?;
            return Ok(None);
        }

        if c == LB {
            // The text run ends here
            let sentence = self.take_sentence(DOUBLE_QUOTE);
            self.start_unit(c)?;
            return Ok(Some(sentence));
        }
        self.buffer.append(c)?;
        Ok(None)
    }

    fn start_unit(&mut self, c: char) -> Result<(), FilterError> {
        self.buffer.append(c)?;
        self.mode = if c == LB { LexMode::InTag } else { LexMode::Plain };
        Ok(())
    }

    fn take_sentence(&mut self, quote: char) -> Lexeme {
        let sentence = Sentence::new(self.buffer.contents(), quote);
        self.buffer.reset();
        self.mode = LexMode::Plain;
        Lexeme::Sentence(sentence)
    }

    /// Drain the pending unit at end of stream
    pub fn finish(&mut self) -> Option<Lexeme> {
        if self.buffer.is_empty() {
            self.mode = LexMode::Plain;
            return None;
        }
        if self.mode == LexMode::InComment {
            let comment = self.buffer.contents();
            self.buffer.reset();
            self.mode = LexMode::Plain;
            return Some(Lexeme::Comment(comment));
        }
        let quote = self.mode.quote_char();
        Some(self.take_sentence(quote))
    }

    /// Drop the pending unit without emitting it
    pub fn discard(&mut self) {
        self.buffer.reset();
        self.mode = LexMode::Plain;
    }

    /// Release the buffer
    pub fn close(&mut self) {
        self.buffer.close();
        self.mode = LexMode::Plain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Lexeme> {
        let mut tokenizer = Tokenizer::new(1024, 16);
        let mut out = Vec::new();
        for c in input.chars() {
            if let Some(lexeme) = tokenizer.push(c).unwrap() {
                out.push(lexeme);
            }
        }
        out.extend(tokenizer.finish());
        out
    }

    fn sentence(text: &str) -> Lexeme {
        Lexeme::Sentence(Sentence::new(text, DOUBLE_QUOTE))
    }

    #[test]
    fn test_text_and_tags() {
        assert_eq!(
            lex("hello <b>world</b>"),
            vec![
                sentence("hello "),
                sentence("<b>"),
                sentence("world"),
                sentence("</b>"),
            ]
        );
    }

    #[test]
    fn test_comment() {
        assert_eq!(
            lex("a<!-- x > y -->b"),
            vec![
                sentence("a"),
                Lexeme::Comment("<!-- x > y -->".to_string()),
                sentence("b"),
            ]
        );
    }

    #[test]
    fn test_minimal_comment() {
        assert_eq!(lex("<!---->"), vec![Lexeme::Comment("<!---->".to_string())]);
    }

    #[test]
    fn test_quote_hides_brackets() {
        assert_eq!(
            lex(r#"<a title="x<y">"#),
            vec![sentence(r#"<a title="x<y">"#)]
        );
    }

    #[test]
    fn test_stray_bracket() {
        assert_eq!(lex(">a"), vec![Lexeme::Stray('>'), sentence("a")]);
    }

    #[test]
    fn test_missing_closing_bracket() {
        let mut tokenizer = Tokenizer::new(1024, 16);
        let mut out = Vec::new();
        for c in "<a href=x<b>".chars() {
            out.extend(tokenizer.push(c).unwrap());
        }
        assert_eq!(out, vec![sentence("<a href=x"), sentence("<b>")]);
        assert_eq!(tokenizer.recovered().missing_brackets, 1);
    }

    #[test]
    fn test_unterminated_quote_ends_at_bracket() {
        let mut tokenizer = Tokenizer::new(1024, 16);
        let mut out = Vec::new();
        for c in "<a href='x>text".chars() {
            out.extend(tokenizer.push(c).unwrap());
        }
        assert_eq!(
            out,
            vec![Lexeme::Sentence(Sentence::new("<a href='x>", SINGLE_QUOTE))]
        );
        assert_eq!(tokenizer.recovered().unterminated_quotes, 1);
        assert_eq!(tokenizer.mode(), LexMode::Plain);
    }

    #[test]
    fn test_quote_chars_in_text_are_plain() {
        assert_eq!(lex("it's \"fine\""), vec![sentence("it's \"fine\"")]);
    }

    #[test]
    fn test_finish_reports_mode_quote() {
        let mut tokenizer = Tokenizer::new(1024, 16);
        for c in "<a href='x".chars() {
            assert!(tokenizer.push(c).unwrap().is_none());
        }
        assert_eq!(tokenizer.quote_char(), SINGLE_QUOTE);
        assert_eq!(
            tokenizer.finish(),
            Some(Lexeme::Sentence(Sentence::new("<a href='x", SINGLE_QUOTE)))
        );
        assert_eq!(tokenizer.finish(), None);
    }

    #[test]
    fn test_unterminated_comment_at_finish() {
        assert_eq!(
            lex("<!-- never closed"),
            vec![Lexeme::Comment("<!-- never closed".to_string())]
        );
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut tokenizer = Tokenizer::new(8, 8);
        let mut result = Ok(None);
        for c in "<aaaaaaaaaaaa".chars() {
            result = tokenizer.push(c);
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(FilterError::CapacityExceeded { capacity: 8 })));
    }

    #[test]
    fn test_classify() {
        let tag = Sentence::new(r#"<A href="x">"#, DOUBLE_QUOTE);
        assert_eq!(
            tag.classify(),
            SentenceKind::Tag { name: "A", opening: true, raw: r#" href="x""# }
        );

        let close = Sentence::new("</title>", DOUBLE_QUOTE);
        assert_eq!(
            close.classify(),
            SentenceKind::Tag { name: "title", opening: false, raw: "" }
        );

        let doctype = Sentence::new("<!DOCTYPE html>", DOUBLE_QUOTE);
        assert_eq!(
            doctype.classify(),
            SentenceKind::Tag { name: "!DOCTYPE", opening: true, raw: " html" }
        );

        assert_eq!(Sentence::new("<>", DOUBLE_QUOTE).classify(), SentenceKind::Text("<>"));
        assert_eq!(Sentence::new("plain", DOUBLE_QUOTE).classify(), SentenceKind::Text("plain"));
        assert_eq!(
            Sentence::new("</>", DOUBLE_QUOTE).classify(),
            SentenceKind::Tag { name: "", opening: false, raw: "" }
        );
    }
}
