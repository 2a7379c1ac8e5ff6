//! Top-level facade crate for scopestat.
//!
//! Re-exports the core registry and the exporter so users can depend on a single crate.

pub mod core {
    pub use scopestat_core::*;
}

pub mod exporter {
    pub use scopestat_exporter::*;
}

pub use scopestat_core::{Counter, Gauge, Histogram, Scope, Store, StoreOption, TagOption};
