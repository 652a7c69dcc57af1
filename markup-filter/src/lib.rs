//! Streaming markup filter
//!
//! Consumes HTML/XML-ish text one character at a time and writes it to an
//! output sink, unchanged unless told otherwise. Along the way it splits the
//! stream into tags, text runs and comments and reports them to an optional
//! [`Scraper`], while an optional [`Transformer`] may replace the markup that
//! reaches the sink.
//!
//! Tags come in two kinds, decided per occurrence by the hooks:
//! - standalone (`tag0`): handled on its own, e.g. `<img>`
//! - container (`tag1`): the tag and everything up to its matching close is
//!   collected and delivered as one unit, e.g. `<title>...</title>`
//!
//! Malformed markup never fails the stream: stray `>`, missing `>` and
//! unterminated quotes are repaired locally. Memory is bounded by
//! [`FilterConfig::max_buffer_size`].
//!
//! ```
//! use markup_filter::{Attributes, FilterConfig, HookResult, MarkupFilter, Scraper};
//!
//! #[derive(Default)]
//! struct Titles(Vec<String>);
//!
//! impl Scraper for Titles {
//!     fn is_tag0(&self, _name: &str) -> bool {
//!         false
//!     }
//!
//!     fn is_tag1(&self, name: &str) -> bool {
//!         name == "title"
//!     }
//!
//!     fn scrape_tag1(&mut self, _name: &str, _attributes: &Attributes, body: &str) -> HookResult {
//!         self.0.push(body.to_string());
//!         Ok(())
//!     }
//! }
//!
//! let mut titles = Titles::default();
//! let mut filter =
//!     MarkupFilter::new(Vec::new(), FilterConfig::default()).with_scraper(&mut titles);
//! filter.write_str("<html><title>Hello</title></html>")?;
//! let out = filter.finish()?;
//! assert_eq!(out, b"<html><title>Hello</title></html>");
//! assert_eq!(titles.0, ["Hello"]);
//! # Ok::<(), markup_filter::FilterError>(())
//! ```

pub mod collector;
pub mod config;
pub mod error;
pub mod hooks;
pub mod markup;
pub mod streaming;
pub mod telemetry;
pub mod writer;

#[cfg(test)]
mod test_support;

pub use config::{ConfigError, DecodePolicy, FilterConfig};
pub use error::{FilterError, HookError};
pub use hooks::{HookResult, Hooks, Scraper, Transformer};
pub use markup::{render_attributes, render_container, render_opening, render_standalone, Attributes};
pub use telemetry::{FilterEvent, FilterEventType, FilterStats};
pub use writer::{is_binary_hint, CharWriter, MarkupFilter};

/// System-wide ceiling for a single buffer, in characters (40 Mi)
pub const MAX_BUFFER_SIZE: usize = 40 * 1024 * 1024;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Event, RecordingScraper, UpperTransformer};

    const PAGE: &str = "<!doctype html>\n\
        <html><head><title>Demo</title>\n\
        <!-- generated --></head>\n\
        <body><a href=\"/x\">link</a> > <img src='p.png' alt=\"pic\"></body></html>";

    #[test]
    fn test_page_passthrough_with_scraper() {
        let mut scraper = RecordingScraper::new(&["img"], &["title"]);
        let mut filter =
            MarkupFilter::new(Vec::new(), FilterConfig::default()).with_scraper(&mut scraper);
        filter.write_str(PAGE).unwrap();
        let out = filter.finish().unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), PAGE);
        assert_eq!(scraper.comments(), vec!["<!-- generated -->"]);
        assert!(scraper
            .events
            .contains(&Event::Tag1("title".into(), vec![], "Demo".into())));
        assert!(scraper.events.contains(&Event::Tag0(
            "img".into(),
            vec![("src".into(), "p.png".into()), ("alt".into(), "pic".into())]
        )));
    }

    #[test]
    fn test_scraper_and_transformer_together() {
        let mut scraper = RecordingScraper::new(&[], &["title"]);
        let mut transformer = UpperTransformer::new(&["img"], &[]);
        let mut filter = MarkupFilter::new(Vec::new(), FilterConfig::default())
            .with_scraper(&mut scraper)
            .with_transformer(&mut transformer);
        filter.write_str("<title>t</title><img>").unwrap();
        let out = filter.finish().unwrap();

        // A container named by either hook is collected; the transformer
        // then has the last word on its markup
        assert_eq!(String::from_utf8(out).unwrap(), "[TITLE:T][IMG]");
        assert_eq!(scraper.count_tag1(), 1);
    }

    #[test]
    fn test_config_from_json_drives_filter() {
        let config = FilterConfig::from_bytes(br#"{"pass_by_if_binary_suspect": true}"#).unwrap();
        let mut filter = MarkupFilter::new(Vec::new(), config);
        filter.write_bytes(b"<p>\x00<b").unwrap();
        assert!(filter.is_passing_by());
        assert_eq!(filter.finish().unwrap(), b"<p>\x00<b");
    }
}
