//! Markup model: attribute maps and canonical rendering

pub mod attributes;
pub mod serializer;

pub use attributes::Attributes;
pub use serializer::{render_attributes, render_container, render_opening, render_standalone};
