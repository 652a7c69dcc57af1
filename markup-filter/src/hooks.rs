//! Scraper and transformer hooks
//!
//! The filter never decides what a tag means. It asks two optional
//! collaborators: a [`Scraper`] that observes structural events and a
//! [`Transformer`] that may replace the markup written to the sink. Both are
//! borrowed for the lifetime of the filter and called synchronously.
//!
//! Classification is queried per occurrence:
//! - `is_tag0`: standalone tag, handled atomically
//! - `is_tag1`: container tag, body collected until the matching close

use crate::error::HookError;
use crate::markup::Attributes;

/// Result type for hook callbacks
pub type HookResult<T = ()> = Result<T, HookError>;

/// Observer of structural events
pub trait Scraper {
    /// Is `name` a standalone tag for this scraper?
    fn is_tag0(&self, name: &str) -> bool;

    /// Is `name` a container tag for this scraper?
    fn is_tag1(&self, name: &str) -> bool;

    /// A text run; `enclosing` is the container being collected, if any
    fn scrape_text(&mut self, text: &str, enclosing: Option<&str>) -> HookResult {
        let _ = (text, enclosing);
        Ok(())
    }

    fn scrape_tag0(&mut self, name: &str, attributes: &Attributes) -> HookResult {
        let _ = (name, attributes);
        Ok(())
    }

    fn scrape_tag1(&mut self, name: &str, attributes: &Attributes, body: &str) -> HookResult {
        let _ = (name, attributes, body);
        Ok(())
    }

    /// A complete comment including `<!--` and `-->`
    fn scrape_comment(&mut self, comment: &str) -> HookResult {
        let _ = comment;
        Ok(())
    }

    /// Called on every flush and once more on close; must tolerate repeats
    fn finish(&mut self) {}
}

/// Rewriter of the emitted markup
pub trait Transformer {
    fn is_tag0(&self, name: &str) -> bool;

    fn is_tag1(&self, name: &str) -> bool;

    /// Replacement for a text run
    fn transform_text(&mut self, text: &str) -> HookResult<String> {
        Ok(text.to_string())
    }

    /// Replacement markup for a standalone tag
    fn transform_tag0(
        &mut self,
        name: &str,
        attributes: &Attributes,
        quote: char,
    ) -> HookResult<String>;

    /// Replacement markup for a collected container
    fn transform_tag1(
        &mut self,
        name: &str,
        attributes: &Attributes,
        body: &str,
        quote: char,
    ) -> HookResult<String>;
}

/// The pair of optional collaborators consulted by the collector
#[derive(Default)]
pub struct Hooks<'a> {
    pub scraper: Option<&'a mut dyn Scraper>,
    pub transformer: Option<&'a mut dyn Transformer>,
}

impl Hooks<'_> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scraper_is_tag0(&self, name: &str) -> bool {
        self.scraper.as_deref().is_some_and(|s| s.is_tag0(name))
    }

    pub fn scraper_is_tag1(&self, name: &str) -> bool {
        self.scraper.as_deref().is_some_and(|s| s.is_tag1(name))
    }

    pub fn transformer_is_tag0(&self, name: &str) -> bool {
        self.transformer.as_deref().is_some_and(|t| t.is_tag0(name))
    }

    pub fn transformer_is_tag1(&self, name: &str) -> bool {
        self.transformer.as_deref().is_some_and(|t| t.is_tag1(name))
    }

    /// Container according to either collaborator
    pub fn is_container(&self, name: &str) -> bool {
        self.scraper_is_tag1(name) || self.transformer_is_tag1(name)
    }

    pub fn has_transformer(&self) -> bool {
        self.transformer.is_some()
    }

    pub fn scrape_text(&mut self, text: &str, enclosing: Option<&str>) -> HookResult {
        match self.scraper.as_deref_mut() {
            Some(scraper) if !text.is_empty() => scraper.scrape_text(text, enclosing),
            _ => Ok(()),
        }
    }

    pub fn scrape_tag0(&mut self, name: &str, attributes: &Attributes) -> HookResult {
        match self.scraper.as_deref_mut() {
            Some(scraper) => scraper.scrape_tag0(name, attributes),
            None => Ok(()),
        }
    }

    pub fn scrape_tag1(&mut self, name: &str, attributes: &Attributes, body: &str) -> HookResult {
        match self.scraper.as_deref_mut() {
            Some(scraper) => scraper.scrape_tag1(name, attributes, body),
            None => Ok(()),
        }
    }

    pub fn scrape_comment(&mut self, comment: &str) -> HookResult {
        match self.scraper.as_deref_mut() {
            Some(scraper) => scraper.scrape_comment(comment),
            None => Ok(()),
        }
    }

    pub fn finish(&mut self) {
        if let Some(scraper) = self.scraper.as_deref_mut() {
            scraper.finish();
        }
    }

    /// Transformed text, or `text` unchanged without a transformer
    pub fn transform_text(&mut self, text: &str) -> HookResult<String> {
        match self.transformer.as_deref_mut() {
            Some(transformer) => transformer.transform_text(text),
            None => Ok(text.to_string()),
        }
    }

    /// `None` when there is no transformer
    pub fn transform_tag0(
        &mut self,
        name: &str,
        attributes: &Attributes,
        quote: char,
    ) -> HookResult<Option<String>> {
        match self.transformer.as_deref_mut() {
            Some(transformer) => transformer.transform_tag0(name, attributes, quote).map(Some),
            None => Ok(None),
        }
    }

    /// `None` when there is no transformer
    pub fn transform_tag1(
        &mut self,
        name: &str,
        attributes: &Attributes,
        body: &str,
        quote: char,
    ) -> HookResult<Option<String>> {
        match self.transformer.as_deref_mut() {
            Some(transformer) => transformer
                .transform_tag1(name, attributes, body, quote)
                .map(Some),
            None => Ok(None),
        }
    }
}
