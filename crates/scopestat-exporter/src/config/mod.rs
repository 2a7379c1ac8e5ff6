//! Exporter config loader (strict parsing).

pub mod schema;

use std::fs;

use scopestat_core::error::{Result, StatsError};

pub use schema::{
    ExporterConfig, ExtractorConfig, HttpSection, RuntimeSection, StatsdSection, StoreSection,
    TagsSection,
};

pub fn load_from_file(path: &str) -> Result<ExporterConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| StatsError::Io(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ExporterConfig> {
    let cfg: ExporterConfig = serde_yaml::from_str(s)
        .map_err(|e| StatsError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
