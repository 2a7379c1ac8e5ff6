use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use scopestat_core::error::{Result, StatsError};
use scopestat_core::{StoreOption, TagExtractStrategy, TagOption};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub version: u32,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub tags: TagsSection,

    #[serde(default)]
    pub statsd: Option<StatsdSection>,

    #[serde(default)]
    pub http: Option<HttpSection>,

    #[serde(default)]
    pub runtime: Option<RuntimeSection>,
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(StatsError::BadConfig(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.store.validate()?;
        self.tags.validate()?;
        if let Some(statsd) = &self.statsd {
            statsd.validate()?;
        }
        if let Some(http) = &self.http {
            http.validate()?;
        }
        if let Some(runtime) = &self.runtime {
            runtime.validate()?;
        }
        Ok(())
    }

    /// Store options; sinks are attached by the caller.
    pub fn store_option(&self) -> StoreOption {
        let opt = StoreOption::new()
            .with_flush_interval(Duration::from_millis(self.store.flush_interval_ms));
        match self.store.histogram_shards {
            Some(shards) => opt.with_histogram_shards(shards),
            None => opt,
        }
    }

    pub fn tag_option(&self) -> TagOption {
        TagOption::new()
            .with_default_tags(self.tags.default.clone())
            .with_strategies(self.tags.extractors.iter().map(|e| {
                let s = TagExtractStrategy::new(e.name.as_str(), e.regex.as_str());
                match &e.substr {
                    Some(sub) => s.with_substr(sub.as_str()),
                    None => s,
                }
            }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    #[serde(default)]
    pub histogram_shards: Option<usize>,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            flush_interval_ms: default_flush_interval_ms(),
            histogram_shards: None,
        }
    }
}

impl StoreSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=600_000).contains(&self.flush_interval_ms) {
            return Err(StatsError::BadConfig(
                "store.flush_interval_ms must be between 100 and 600000".into(),
            ));
        }
        if let Some(shards) = self.histogram_shards {
            if !(1..=1024).contains(&shards) {
                return Err(StatsError::BadConfig(
                    "store.histogram_shards must be between 1 and 1024".into(),
                ));
            }
        }
        Ok(())
    }
}

fn default_flush_interval_ms() -> u64 {
    5000
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TagsSection {
    #[serde(default)]
    pub default: BTreeMap<String, String>,

    #[serde(default)]
    pub extractors: Vec<ExtractorConfig>,
}

impl TagsSection {
    pub fn validate(&self) -> Result<()> {
        for e in &self.extractors {
            if e.name.is_empty() {
                return Err(StatsError::BadConfig("tags.extractors[].name must not be empty".into()));
            }
            if e.regex.is_empty() {
                return Err(StatsError::BadConfig(format!(
                    "tags.extractors[{}].regex must not be empty",
                    e.name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractorConfig {
    pub name: String,
    pub regex: String,
    #[serde(default)]
    pub substr: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatsdSection {
    pub address: String,
    #[serde(default)]
    pub prefix: String,
}

impl StatsdSection {
    pub fn validate(&self) -> Result<()> {
        if self.address.is_empty() {
            return Err(StatsError::BadConfig("statsd.address must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl HttpSection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(StatsError::BadConfig(format!(
                "http.listen must be a valid SocketAddr: {}",
                self.listen
            )));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:9090".into()
}
fn default_namespace() -> String {
    "scopestat".into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSection {
    #[serde(default = "default_runtime_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_runtime_scope")]
    pub scope: String,
}

impl RuntimeSection {
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms < 100 {
            return Err(StatsError::BadConfig("runtime.interval_ms must be at least 100".into()));
        }
        Ok(())
    }
}

fn default_runtime_interval_ms() -> u64 {
    10000
}
fn default_runtime_scope() -> String {
    "runtime".into()
}
