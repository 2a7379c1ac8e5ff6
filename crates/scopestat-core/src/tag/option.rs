use crate::error::Result;

use super::{Tag, TagExtractor, TagProducer};

/// One dynamic tag rule: a named regex plus an optional literal pre-check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagExtractStrategy {
    pub name: String,
    pub regex: String,
    pub substr: Option<String>,
}

impl TagExtractStrategy {
    pub fn new(name: impl Into<String>, regex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            regex: regex.into(),
            substr: None,
        }
    }

    pub fn with_substr(mut self, substr: impl Into<String>) -> Self {
        self.substr = Some(substr.into());
        self
    }
}

/// Controls how tags are set on newly created metrics.
#[derive(Debug, Clone, Default)]
pub struct TagOption {
    pub default_tags: Vec<Tag>,
    pub strategies: Vec<TagExtractStrategy>,
}

impl TagOption {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_tags<K, V>(mut self, tags: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.default_tags = tags.into_iter().map(|(k, v)| Tag::new(k, v)).collect();
        self
    }

    pub fn with_strategies(mut self, strategies: impl IntoIterator<Item = TagExtractStrategy>) -> Self {
        self.strategies = strategies.into_iter().collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.default_tags.is_empty() && self.strategies.is_empty()
    }

    /// Compile every strategy. Fails as a whole on the first bad pattern.
    pub fn build_producer(&self) -> Result<Option<TagProducer>> {
        if self.is_empty() {
            return Ok(None);
        }
        let mut producer = TagProducer::new(self.default_tags.clone());
        for s in &self.strategies {
            producer.add_extractor(TagExtractor::new(&s.name, &s.regex, s.substr.as_deref())?);
        }
        Ok(Some(producer))
    }
}
