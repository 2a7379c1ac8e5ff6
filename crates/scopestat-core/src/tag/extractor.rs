use regex::Regex;

use crate::error::{Result, StatsError};
use crate::intervalset::IntervalSet;

use super::Tag;

/// Compiled tag extraction rule.
#[derive(Debug, Clone)]
pub struct TagExtractor {
    name: String,
    re: Regex,
    substr: Option<String>,
    prefix: Option<String>,
}

impl TagExtractor {
    /// Compile an extractor. `substr` is a cheap literal pre-check; an empty
    /// string disables it.
    pub fn new(name: &str, regex: &str, substr: Option<&str>) -> Result<Self> {
        let re = Regex::new(regex).map_err(|e| StatsError::InvalidTagExtractor {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        if re.captures_len() < 2 {
            return Err(StatsError::InvalidTagExtractor {
                name: name.to_string(),
                reason: "pattern must have at least one capturing group".into(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            re,
            substr: substr.filter(|s| !s.is_empty()).map(str::to_string),
            prefix: regex_prefix(regex),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Static first path segment this extractor is anchored to, if any.
    pub fn prefix_token(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Try to extract one tag from `metric_name`.
    ///
    /// On a match the tag is appended to `tags`, the removal span (group 1)
    /// is recorded in `remove`, and `true` is returned.
    pub fn extract(&self, metric_name: &str, tags: &mut Vec<Tag>, remove: &mut IntervalSet) -> bool {
        if let Some(substr) = &self.substr {
            if !metric_name.contains(substr.as_str()) {
                return false;
            }
        }

        let Some(caps) = self.re.captures(metric_name) else {
            return false;
        };
        let Some(remove_span) = caps.get(1) else {
            return false;
        };
        // group 2 usually sits inside group 1 and drops separators from the value
        let value_span = caps.get(2).unwrap_or(remove_span);

        tags.push(Tag::new(self.name.as_str(), value_span.as_str()));
        remove.insert(remove_span.start(), remove_span.end());
        true
    }
}

/// Derive the literal first segment of an anchored pattern.
///
/// `^prefix\.` / `^prefix(?:\.)` yield `prefix`; anything else yields `None`
/// and the extractor is evaluated against every name.
fn regex_prefix(regex: &str) -> Option<String> {
    let rest = regex.strip_prefix('^')?;
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }

    let (token, tail) = rest.split_at(end);
    if tail.starts_with("\\.") || tail.starts_with("(?:\\.)") {
        Some(token.to_string())
    } else {
        None
    }
}
