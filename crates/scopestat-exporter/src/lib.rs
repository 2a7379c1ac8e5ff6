//! scopestat exporter: collaborators around the core registry.
//!
//! This crate wires configuration, text formatters, HTTP exposition, the
//! statsd push sink and the runtime sampler onto a [`scopestat_core::Store`].

pub mod app;
pub mod config;
pub mod error;
pub mod format;
pub mod http;
pub mod runtime;
pub mod statsd;

pub use app::Exporter;
pub use error::{ExportError, Result};
