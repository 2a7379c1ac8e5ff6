use std::sync::Arc;

use scopestat_core::{Counter, Gauge, Histogram, Metric};

use super::Formatter;

/// `name: value` per metric, sorted by name. Histograms render their summary.
#[derive(Debug, Default)]
pub struct PlainFormatter;

impl PlainFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Formatter for PlainFormatter {
    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn format(
        &mut self,
        gauges: &[Arc<Gauge>],
        counters: &[Arc<Counter>],
        histograms: &[Arc<Histogram>],
    ) -> String {
        let mut lines: Vec<(&str, String)> =
            Vec::with_capacity(gauges.len() + counters.len() + histograms.len());
        lines.extend(gauges.iter().map(|g| (g.name(), g.value().to_string())));
        lines.extend(counters.iter().map(|c| (c.name(), c.value().to_string())));
        lines.extend(histograms.iter().map(|h| (h.name(), h.summary())));
        lines.sort_by(|a, b| a.0.cmp(b.0));

        let mut out = String::new();
        for (name, value) in lines {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(&value);
            out.push('\n');
        }
        out
    }
}
