//! Tag engine (static default tags + regex-driven dynamic extraction).
//!
//! Dynamic tags are carved out of flat dotted metric names: each extractor's
//! first capture group marks the text to remove from the reported name, and
//! the optional second group is the tag value.

pub mod extractor;
pub mod option;
pub mod producer;

pub use extractor::TagExtractor;
pub use option::{TagExtractStrategy, TagOption};
pub use producer::{remove_characters, TagProducer};

/// Namespace separator inside metric names.
pub const SEPARATOR: char = '.';

/// A `{name, value}` pair attached to a metric.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
