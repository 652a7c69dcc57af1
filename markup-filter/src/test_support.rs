//! Test doubles for the scraper and transformer hooks

use crate::error::HookError;
use crate::hooks::{HookResult, Scraper, Transformer};
use crate::markup::Attributes;

/// One observed scraper callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Text(String, Option<String>),
    Tag0(String, Vec<(String, String)>),
    Tag1(String, Vec<(String, String)>, String),
    Comment(String),
}

fn owned(attributes: &Attributes) -> Vec<(String, String)> {
    attributes
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Scraper that records every callback
#[derive(Debug, Default)]
pub struct RecordingScraper {
    tag0: Vec<String>,
    tag1: Vec<String>,
    pub events: Vec<Event>,
    pub finish_calls: usize,
    /// Fail `scrape_tag1` calls with this message
    pub fail_tag1: Option<String>,
}

impl RecordingScraper {
    pub fn new(tag0: &[&str], tag1: &[&str]) -> Self {
        Self {
            tag0: tag0.iter().map(|s| s.to_string()).collect(),
            tag1: tag1.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn count_tag1(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Tag1(..)))
            .count()
    }

    pub fn comments(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Comment(c) => Some(c.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Scraper for RecordingScraper {
    fn is_tag0(&self, name: &str) -> bool {
        self.tag0.iter().any(|t| t == name)
    }

    fn is_tag1(&self, name: &str) -> bool {
        self.tag1.iter().any(|t| t == name)
    }

    fn scrape_text(&mut self, text: &str, enclosing: Option<&str>) -> HookResult {
        self.events
            .push(Event::Text(text.to_string(), enclosing.map(str::to_string)));
        Ok(())
    }

    fn scrape_tag0(&mut self, name: &str, attributes: &Attributes) -> HookResult {
        self.events.push(Event::Tag0(name.to_string(), owned(attributes)));
        Ok(())
    }

    fn scrape_tag1(&mut self, name: &str, attributes: &Attributes, body: &str) -> HookResult {
        if let Some(message) = &self.fail_tag1 {
            return Err(HookError::new(message.clone()));
        }
        self.events.push(Event::Tag1(
            name.to_string(),
            owned(attributes),
            body.to_string(),
        ));
        Ok(())
    }

    fn scrape_comment(&mut self, comment: &str) -> HookResult {
        self.events.push(Event::Comment(comment.to_string()));
        Ok(())
    }

    fn finish(&mut self) {
        self.finish_calls += 1;
    }
}

/// Transformer that uppercases text and replaces tags with bracketed names
#[derive(Debug, Default)]
pub struct UpperTransformer {
    tag0: Vec<String>,
    tag1: Vec<String>,
    pub quotes: Vec<char>,
}

impl UpperTransformer {
    pub fn new(tag0: &[&str], tag1: &[&str]) -> Self {
        Self {
            tag0: tag0.iter().map(|s| s.to_string()).collect(),
            tag1: tag1.iter().map(|s| s.to_string()).collect(),
            quotes: Vec::new(),
        }
    }
}

impl Transformer for UpperTransformer {
    fn is_tag0(&self, name: &str) -> bool {
        self.tag0.iter().any(|t| t == name)
    }

    fn is_tag1(&self, name: &str) -> bool {
        self.tag1.iter().any(|t| t == name)
    }

    fn transform_text(&mut self, text: &str) -> HookResult<String> {
        Ok(text.to_uppercase())
    }

    fn transform_tag0(
        &mut self,
        name: &str,
        _attributes: &Attributes,
        quote: char,
    ) -> HookResult<String> {
        self.quotes.push(quote);
        Ok(format!("[{}]", name.to_uppercase()))
    }

    fn transform_tag1(
        &mut self,
        name: &str,
        _attributes: &Attributes,
        body: &str,
        quote: char,
    ) -> HookResult<String> {
        self.quotes.push(quote);
        Ok(format!("[{}:{}]", name.to_uppercase(), body))
    }
}
