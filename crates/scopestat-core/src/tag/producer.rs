use std::collections::HashMap;

use crate::intervalset::IntervalSet;

use super::{Tag, TagExtractor, SEPARATOR};

/// Produces `(tag_extracted_name, tags)` for metric names.
///
/// Extractors with a static prefix token are indexed by that token and only
/// run for names whose first path segment equals it.
#[derive(Debug, Default, Clone)]
pub struct TagProducer {
    default_tags: Vec<Tag>,
    normal: Vec<TagExtractor>,
    by_prefix: HashMap<String, Vec<TagExtractor>>,
}

impl TagProducer {
    pub fn new(default_tags: Vec<Tag>) -> Self {
        Self {
            default_tags,
            normal: Vec::new(),
            by_prefix: HashMap::new(),
        }
    }

    pub fn add_extractor(&mut self, extractor: TagExtractor) {
        match extractor.prefix_token() {
            Some(token) => self
                .by_prefix
                .entry(token.to_string())
                .or_default()
                .push(extractor),
            None => self.normal.push(extractor),
        }
    }

    pub fn default_tags(&self) -> &[Tag] {
        &self.default_tags
    }

    /// Number of extractors that are always evaluated.
    pub fn normal_extractors(&self) -> usize {
        self.normal.len()
    }

    /// Number of extractors that are only evaluated for their prefix token.
    pub fn prefix_extractors(&self) -> usize {
        self.by_prefix.values().map(Vec::len).sum()
    }

    /// Resolve tags for `metric_name`. Pure: the producer is not mutated.
    pub fn produce(&self, metric_name: &str) -> (String, Vec<Tag>) {
        let mut tags = self.default_tags.clone();
        let mut remove = IntervalSet::new();

        for extractor in &self.normal {
            extractor.extract(metric_name, &mut tags, &mut remove);
        }

        let token = metric_name
            .split_once(SEPARATOR)
            .map_or(metric_name, |(first, _)| first);
        if let Some(extractors) = self.by_prefix.get(token) {
            for extractor in extractors {
                extractor.extract(metric_name, &mut tags, &mut remove);
            }
        }

        (remove_characters(metric_name, &remove), tags)
    }
}

/// Splice every span of `remove` out of `s`, left to right.
pub fn remove_characters(s: &str, remove: &IntervalSet) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pos = 0;
    for span in remove.all_intervals() {
        let left = span.left.min(s.len());
        if left > pos {
            out.push_str(s.get(pos..left).unwrap_or_default());
        }
        pos = pos.max(span.right.min(s.len()));
    }
    if pos < s.len() {
        out.push_str(s.get(pos..).unwrap_or_default());
    }
    out
}
