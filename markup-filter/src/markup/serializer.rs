//! Markup rendering
//!
//! Canonical reconstruction of tags from their parts. These are the default
//! output path when no transformer supplies replacement markup.

use super::attributes::Attributes;

/// Wrap raw inner tag text verbatim: `<name raw>` or `</name raw>`
pub fn render_standalone(name: &str, opening: bool, raw: &str) -> String {
    let mut out = String::with_capacity(name.len() + raw.len() + 3);
    out.push('<');
    if !opening {
        out.push('/');
    }
    out.push_str(name);
    out.push_str(raw);
    out.push('>');
    out
}

/// Render an opening tag from parsed attributes: `<name a="v">`
pub fn render_opening(name: &str, attributes: &Attributes, quote: char) -> String {
    let mut out = String::with_capacity(name.len() + attributes.len() * 16 + 2);
    out.push('<');
    out.push_str(name);
    if !attributes.is_empty() {
        out.push(' ');
        out.push_str(&render_attributes(attributes, quote));
    }
    out.push('>');
    out
}

/// Render a container with its body: `<name a="v">body</name>`
pub fn render_container(name: &str, attributes: &Attributes, body: &str, quote: char) -> String {
    let mut out = render_opening(name, attributes, quote);
    out.reserve(body.len() + name.len() + 3);
    out.push_str(body);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
    out
}

/// Space-join `key=<q>value<q>` pairs in map order
pub fn render_attributes(attributes: &Attributes, quote: char) -> String {
    let mut out = String::new();
    for (key, value) in attributes.iter() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(key);
        out.push('=');
        out.push(quote);
        out.push_str(value);
        out.push(quote);
    }
    out
}
