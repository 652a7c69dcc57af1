//! Tag-content collector
//!
//! Groups a container tag and everything up to its matching close into one
//! unit. While a container is open every other sentence becomes literal
//! body content: nothing is emitted until the close tag (or the end of the
//! stream) finalizes the collection. Only one collection exists at a time;
//! nested containers are never collected.

use log::debug;

use crate::error::FilterError;
use crate::hooks::Hooks;
use crate::markup::{render_container, render_standalone, Attributes};
use crate::streaming::{CharBuffer, Sentence, SentenceKind};

/// Minimum allocation for a fresh body buffer
const MIN_BODY_CAPACITY: usize = 100;

/// An open container and its body so far
#[derive(Debug)]
pub struct Collection {
    pub name: String,
    pub attributes: Attributes,
    pub body: CharBuffer,
}

/// Collector state
#[derive(Debug, Default)]
pub enum CollectorState {
    #[default]
    Idle,
    Collecting(Collection),
}

/// Outcome counters, read by telemetry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorCounts {
    pub tags: usize,
    pub texts: usize,
    pub collections_opened: usize,
    pub collections_closed: usize,
}

/// The collector state machine
#[derive(Debug)]
pub struct Collector {
    state: CollectorState,
    max_chars: usize,
    counts: CollectorCounts,
}

impl Collector {
    pub fn new(max_chars: usize) -> Self {
        Self {
            state: CollectorState::Idle,
            max_chars,
            counts: CollectorCounts::default(),
        }
    }

    pub fn state(&self) -> &CollectorState {
        &self.state
    }

    /// Name of the container being collected
    pub fn collecting(&self) -> Option<&str> {
        match &self.state {
            CollectorState::Collecting(collection) => Some(&collection.name),
            CollectorState::Idle => None,
        }
    }

    pub fn counts(&self) -> CollectorCounts {
        self.counts
    }

    /// Route one sentence; returns the markup to emit now (possibly empty)
    pub fn filter_sentence(
        &mut self,
        sentence: &Sentence,
        hooks: &mut Hooks<'_>,
    ) -> Result<String, FilterError> {
        let quote = sentence.quote;
        match sentence.classify() {
            SentenceKind::Text(text) => {
                self.counts.texts += 1;
                self.on_text(text, hooks)
            }
            SentenceKind::Tag { name, opening, raw } => {
                self.counts.tags += 1;
                let name = name.to_ascii_lowercase();
                if name == "!" && self.collecting().is_some() {
                    // `<![CDATA[...]]>` and friends are body text
                    self.counts.texts += 1;
                    return self.on_text(&sentence.text, hooks);
                }
                if opening {
                    self.on_opening(&name, raw, quote, hooks)
                } else {
                    self.on_closing(&name, raw, quote, hooks)
                }
            }
        }
    }

    fn on_text(&mut self, text: &str, hooks: &mut Hooks<'_>) -> Result<String, FilterError> {
        match &mut self.state {
            CollectorState::Idle => {
                hooks.scrape_text(text, None)?;
                Ok(hooks.transform_text(text)?)
            }
            CollectorState::Collecting(collection) => {
                hooks.scrape_text(text, Some(&collection.name))?;
                let text = hooks.transform_text(text)?;
                collection.body.append_str(&text)?;
                Ok(String::new())
            }
        }
    }

    fn on_opening(
        &mut self,
        name: &str,
        raw: &str,
        quote: char,
        hooks: &mut Hooks<'_>,
    ) -> Result<String, FilterError> {
        if let CollectorState::Collecting(collection) = &mut self.state {
            // No nesting: the tag is literal body content
            let rendered = if hooks.scraper_is_tag0(name) || hooks.transformer_is_tag0(name) {
                standalone(name, raw, quote, hooks)?
            } else {
                render_standalone(name, true, raw)
            };
            collection.body.append_str(&rendered)?;
            return Ok(String::new());
        }

        if name.is_empty() {
            return Ok(render_standalone(name, true, raw));
        }

        // The scraper sees a tag0 either way; the transformer's tag0 decides
        // the emission path ahead of any container classification
        let scraper_tag0 = hooks.scraper_is_tag0(name);
        let transformer_tag0 = hooks.transformer_is_tag0(name);
        let container = !transformer_tag0 && hooks.is_container(name);
        if !(scraper_tag0 || transformer_tag0 || container) {
            return Ok(render_standalone(name, true, raw));
        }

        let attributes = Attributes::parse(raw);
        if scraper_tag0 {
            hooks.scrape_tag0(name, &attributes)?;
        }
        if transformer_tag0 {
            let markup = hooks.transform_tag0(name, &attributes, quote)?;
            return Ok(markup.unwrap_or_else(|| render_standalone(name, true, raw)));
        }

        if container {
            let body = CharBuffer::new(self.max_chars, raw.len().max(MIN_BODY_CAPACITY));
            debug!("collecting <{}>", name);
            self.counts.collections_opened += 1;
            self.state = CollectorState::Collecting(Collection {
                name: name.to_string(),
                attributes,
                body,
            });
            return Ok(String::new());
        }

        Ok(render_standalone(name, true, raw))
    }

    fn on_closing(
        &mut self,
        name: &str,
        raw: &str,
        quote: char,
        hooks: &mut Hooks<'_>,
    ) -> Result<String, FilterError> {
        let matching = match &self.state {
            // Unmatched closer, passed through
            CollectorState::Idle => return Ok(render_standalone(name, false, raw)),
            CollectorState::Collecting(collection) => collection.name.eq_ignore_ascii_case(name),
        };
        if matching {
            return self.close_collection(quote, hooks);
        }
        if let CollectorState::Collecting(collection) = &mut self.state {
            collection.body.append_str(&render_standalone(name, false, raw))?;
        }
        Ok(String::new())
    }

    /// Force-close an open collection at end of stream
    pub fn finalize(&mut self, quote: char, hooks: &mut Hooks<'_>) -> Result<String, FilterError> {
        if let Some(name) = self.collecting() {
            debug!("stream ended inside <{}>, finalizing", name);
        }
        self.close_collection(quote, hooks)
    }

    /// Drop an open collection without reporting it
    pub fn discard(&mut self) {
        self.state = CollectorState::Idle;
    }

    fn close_collection(
        &mut self,
        quote: char,
        hooks: &mut Hooks<'_>,
    ) -> Result<String, FilterError> {
        let CollectorState::Collecting(collection) = std::mem::take(&mut self.state) else {
            return Ok(String::new());
        };
        self.counts.collections_closed += 1;
        debug!("collected <{}>, {} body chars", collection.name, collection.body.len());

        let body = collection.body.as_str();
        hooks.scrape_tag1(&collection.name, &collection.attributes, body)?;
        let replaced =
            hooks.transform_tag1(&collection.name, &collection.attributes, body, quote)?;
        let markup = replaced.unwrap_or_else(|| {
            render_container(&collection.name, &collection.attributes, body, quote)
        });
        Ok(markup)
    }
}

/// Standalone path: scrape, then transform or pass through raw
fn standalone(
    name: &str,
    raw: &str,
    quote: char,
    hooks: &mut Hooks<'_>,
) -> Result<String, FilterError> {
    let attributes = Attributes::parse(raw);
    if hooks.scraper_is_tag0(name) {
        hooks.scrape_tag0(name, &attributes)?;
    }
    if hooks.transformer_is_tag0(name) {
        if let Some(markup) = hooks.transform_tag0(name, &attributes, quote)? {
            return Ok(markup);
        }
    }
    Ok(render_standalone(name, true, raw))
}
