//! Prometheus text exposition.
//!
//! Metric names are `<namespace>_<tag extracted name>` and tag names are
//! sanitized to `[a-zA-Z0-9_]`; tag values are quoted and escaped. Each family
//! gets a single `# TYPE` line. Histograms render their cumulative window as
//! cumulative `_bucket` series plus `_sum` and `_count`.

use std::collections::HashSet;
use std::fmt::Write;
use std::sync::Arc;

use scopestat_core::{Counter, Gauge, Histogram, HistogramStatistics, Metric, Tag};

use super::Formatter;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Replace every character outside `[a-zA-Z0-9_]` with `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

pub struct PrometheusFormatter {
    namespace: String,
    seen_types: HashSet<String>,
}

impl PrometheusFormatter {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            seen_types: HashSet::new(),
        }
    }

    fn metric_name(&self, m: &dyn Metric) -> String {
        sanitize_name(&format!("{}_{}", self.namespace, m.tag_extracted_name()))
    }

    /// Emit `# TYPE` the first time a family shows up.
    fn write_type(&mut self, out: &mut String, name: &str, kind: &str) {
        if self.seen_types.insert(name.to_string()) {
            let _ = writeln!(out, "# TYPE {name} {kind}");
        }
    }

    fn write_histogram(out: &mut String, name: &str, labels: &str, stats: &HistogramStatistics) {
        let prefix = if labels.is_empty() {
            String::new()
        } else {
            format!("{labels},")
        };
        for (le, count) in stats.supported_buckets().iter().zip(stats.computed_buckets()) {
            let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"{le}\"}} {count}");
        }
        let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"+Inf\"}} {}", stats.sample_count());
        let _ = writeln!(out, "{name}_sum{} {}", braces(labels), stats.sample_sum());
        let _ = writeln!(out, "{name}_count{} {}", braces(labels), stats.sample_count());
    }
}

fn format_tags(tags: &[Tag]) -> String {
    tags.iter()
        .map(|t| format!("{}=\"{}\"", sanitize_name(&t.name), escape_label(&t.value)))
        .collect::<Vec<_>>()
        .join(",")
}

fn braces(labels: &str) -> String {
    if labels.is_empty() {
        String::new()
    } else {
        format!("{{{labels}}}")
    }
}

/// Sort by formatted family name so every family's series are contiguous,
/// then by full name within a family.
fn sorted<'a, M: Metric>(f: &PrometheusFormatter, metrics: &'a [Arc<M>]) -> Vec<(String, &'a M)> {
    let mut v: Vec<(String, &M)> = metrics
        .iter()
        .map(|m| (f.metric_name(m.as_ref()), m.as_ref()))
        .collect();
    v.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name().cmp(b.1.name())));
    v
}

impl Formatter for PrometheusFormatter {
    fn content_type(&self) -> &'static str {
        "text/plain; version=0.0.4; charset=utf-8"
    }

    fn format(
        &mut self,
        gauges: &[Arc<Gauge>],
        counters: &[Arc<Counter>],
        histograms: &[Arc<Histogram>],
    ) -> String {
        self.seen_types.clear();
        let mut out = String::new();

        for (name, g) in sorted(self, gauges) {
            self.write_type(&mut out, &name, "gauge");
            let _ = writeln!(out, "{name}{} {}", braces(&format_tags(g.tags())), g.value());
        }

        for (name, c) in sorted(self, counters) {
            self.write_type(&mut out, &name, "counter");
            let _ = writeln!(out, "{name}{} {}", braces(&format_tags(c.tags())), c.value());
        }

        for (name, h) in sorted(self, histograms) {
            self.write_type(&mut out, &name, "histogram");
            let labels = format_tags(h.tags());
            Self::write_histogram(&mut out, &name, &labels, &h.cumulative_statistics());
        }

        out
    }
}
