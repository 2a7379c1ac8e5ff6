//! Process and async-runtime sampler.
//!
//! Periodically writes runtime gauges into a dedicated scope, plus a
//! `tick_lag_ms` histogram measuring how late the sampler's own timer fires
//! (scheduler latency). The scope is deleted when sampling stops.

use std::time::Duration;

use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use scopestat_core::{Scope, Store};

/// Used when the caller passes a zero interval.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(10);

/// Sample until `cancel` fires. Must run inside a tokio runtime.
pub async fn collect_runtime_metrics(
    store: Store,
    scope_name: &str,
    every: Duration,
    cancel: CancellationToken,
) {
    let every = if every.is_zero() {
        tracing::warn!("zero runtime sample interval; using default");
        DEFAULT_SAMPLE_INTERVAL
    } else {
        every
    };

    let scope = store.create_scope(scope_name);
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(scope = %scope.name(), interval_ms = every.as_millis() as u64, "runtime sampler started");
    loop {
        let scheduled = tokio::select! {
            _ = cancel.cancelled() => break,
            at = ticker.tick() => at,
        };
        let lag = Instant::now().saturating_duration_since(scheduled);
        scope.histogram("tick_lag_ms").record(lag.as_millis() as u64);
        sample(&scope);
    }

    store.delete_scope(&scope);
    tracing::info!("runtime sampler stopped");
}

/// Write one round of gauges.
pub fn sample(scope: &Scope) {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        let m = handle.metrics();
        scope.gauge("num_workers").set(m.num_workers() as u64);
        scope.gauge("num_alive_tasks").set(m.num_alive_tasks() as u64);
        scope.gauge("global_queue_depth").set(m.global_queue_depth() as u64);
    }

    if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
        if let Some(rss) = parse_kib_field(&status, "VmRSS:") {
            scope.gauge("rss_bytes").set(rss);
        }
        if let Some(vm) = parse_kib_field(&status, "VmSize:") {
            scope.gauge("vm_bytes").set(vm);
        }
    }

    if let Some((utime, stime)) = cpu_seconds() {
        scope.gauge("cpu_utime").set(utime);
        scope.gauge("cpu_stime").set(stime);
    }
}

/// Bytes of a `<field> <n> kB` line of `/proc/<pid>/status`.
pub fn parse_kib_field(status: &str, field: &str) -> Option<u64> {
    let line = status.lines().find(|line| line.starts_with(field))?;
    let value_kib = line
        .split_whitespace()
        .nth(1)
        .and_then(|value| value.parse::<u64>().ok())?;

    value_kib.checked_mul(1024)
}

/// `(utime, stime)` in clock ticks from a `/proc/<pid>/stat` line.
///
/// The command name may contain spaces and parentheses, so fields are
/// counted from the last `)`.
pub fn parse_cpu_ticks(stat: &str) -> Option<(u64, u64)> {
    let (_, rest) = stat.rsplit_once(')')?;
    // rest starts at field 3 (state); utime and stime are fields 14 and 15
    let mut fields = rest.split_whitespace().skip(11);
    let utime = fields.next()?.parse().ok()?;
    let stime = fields.next()?.parse().ok()?;
    Some((utime, stime))
}

#[cfg(target_os = "linux")]
fn cpu_seconds() -> Option<(u64, u64)> {
    // SAFETY: sysconf only reads a configuration value.
    let ticks_per_sec = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks_per_sec <= 0 {
        return None;
    }
    let ticks_per_sec = ticks_per_sec as u64;

    let stat = std::fs::read_to_string("/proc/self/stat").ok()?;
    let (utime, stime) = parse_cpu_ticks(&stat)?;
    Some((utime / ticks_per_sec, stime / ticks_per_sec))
}

#[cfg(not(target_os = "linux"))]
fn cpu_seconds() -> Option<(u64, u64)> {
    None
}
