#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use scopestat_core::metric::histogram::NO_VALUES;
use scopestat_core::metric::{SUPPORTED_BUCKETS, SUPPORTED_QUANTILES};
use scopestat_core::{Counter, Gauge, Histogram, Metric};

#[test]
fn gauge_goes_up_and_down() {
    let g = Gauge::new("foo.bar", "foo.bar", vec![]);
    assert!(!g.is_used());

    g.set(10);
    assert!(g.is_used());
    g.inc();
    g.add(4);
    assert_eq!(g.value(), 15);

    g.dec();
    g.sub(4);
    assert_eq!(g.value(), 10);
}

#[test]
fn gauge_sub_wraps_below_zero() {
    let g = Gauge::new("g", "g", vec![]);
    g.dec();
    assert_eq!(g.value(), u64::MAX);
}

#[test]
fn counter_latch_moves_pending_into_interval() {
    let c = Counter::new("foo.cx_total", "foo.cx_total", vec![]);
    assert!(!c.is_used());

    c.inc();
    c.add(2);
    assert!(c.is_used());
    assert_eq!(c.value(), 3);
    assert_eq!(c.interval_value(), 0);

    assert_eq!(c.latch(), 3);
    assert_eq!(c.interval_value(), 3);

    // interval value is stable until the next latch
    c.inc();
    assert_eq!(c.interval_value(), 3);
    assert_eq!(c.value(), 4);

    assert_eq!(c.latch(), 1);
    assert_eq!(c.latch(), 0);
    assert_eq!(c.interval_value(), 0);
    assert_eq!(c.value(), 4);
}

#[test]
fn counter_concurrent_adds_are_not_lost() {
    let c = Arc::new(Counter::new("c", "c", vec![]));
    std::thread::scope(|s| {
        for _ in 0..8 {
            let c = Arc::clone(&c);
            s.spawn(move || {
                for _ in 0..10_000 {
                    c.inc();
                }
            });
        }
    });
    assert_eq!(c.value(), 80_000);
    assert_eq!(c.latch(), 80_000);
}

#[test]
fn histogram_refresh_windows() {
    let h = Histogram::new("foo.bar", "foo", vec![], 4);
    assert_eq!(h.shard_count(), 4);
    assert!(h.summary().contains(NO_VALUES));
    assert_eq!(h.interval_statistics().sample_count(), 0);

    h.record(3);
    assert!(h.is_used());
    assert_eq!(h.interval_statistics().sample_count(), 0);

    h.refresh_interval_statistics();
    assert_eq!(h.interval_statistics().sample_count(), 1);
    assert_eq!(h.cumulative_statistics().sample_count(), 1);

    h.refresh_interval_statistics();
    assert_eq!(h.interval_statistics().sample_count(), 0);
    assert_eq!(h.cumulative_statistics().sample_count(), 1);

    let summary = h.summary();
    for p in ["P0(", "P25(", "P50(", "P90(", "P95(", "P99(", "P100("] {
        assert!(summary.contains(p), "{p} missing from {summary}");
    }
    assert!(summary.starts_with("P0(0,3)"), "{summary}");
}

#[test]
fn histogram_statistics_shape() {
    let h = Histogram::new("h", "h", vec![], 2);
    for v in 1..=100 {
        h.record(v);
    }
    h.refresh_interval_statistics();

    let stats = h.cumulative_statistics();
    assert_eq!(stats.supported_quantiles(), &SUPPORTED_QUANTILES);
    assert_eq!(stats.computed_quantiles().len(), SUPPORTED_QUANTILES.len());
    assert_eq!(stats.supported_buckets(), &SUPPORTED_BUCKETS);
    assert_eq!(stats.computed_buckets().len(), SUPPORTED_BUCKETS.len());

    assert_eq!(stats.sample_count(), 100);
    assert!((stats.sample_sum() - 5050.0).abs() < 50.0);

    let q = stats.computed_quantiles();
    assert_eq!(q[0], 1.0);
    assert!(q.windows(2).all(|w| w[0] <= w[1]), "{q:?}");

    let b = stats.computed_buckets();
    assert!(b.windows(2).all(|w| w[0] <= w[1]), "{b:?}");
    assert_eq!(b[0], 0); // le 0.5
    assert_eq!(b[1], 1); // le 1
    assert_eq!(*b.last().unwrap(), 100);
}

#[test]
fn histogram_empty_statistics_are_zeroed() {
    let h = Histogram::new("h", "h", vec![], 1);
    let stats = h.interval_statistics();
    assert_eq!(stats.sample_sum(), 0.0);
    assert!(stats.computed_quantiles().iter().all(|&q| q == 0.0));
    assert!(stats.computed_buckets().iter().all(|&b| b == 0));
}

#[test]
fn histogram_concurrent_records_land_in_one_window() {
    let h = Arc::new(Histogram::new("h", "h", vec![], 4));
    std::thread::scope(|s| {
        for t in 0..8u64 {
            let h = Arc::clone(&h);
            s.spawn(move || {
                for i in 0..1_000 {
                    h.record(t * 1_000 + i);
                }
            });
        }
    });
    h.refresh_interval_statistics();
    assert_eq!(h.interval_statistics().sample_count(), 8_000);
}

#[test]
fn histogram_keeps_values_across_the_bucket_table() {
    let values = [3u64, 120, 1_001, 45_000, 3_600_000];
    for shards in [1, 4] {
        let h = Histogram::new("lat", "lat", vec![], shards);
        for v in values {
            h.record(v);
        }
        h.refresh_interval_statistics();

        let stats = h.interval_statistics();
        assert_eq!(stats.sample_count(), 5);

        let expected_sum: u64 = values.iter().sum();
        let sum_err = (stats.sample_sum() - expected_sum as f64).abs() / expected_sum as f64;
        assert!(sum_err < 0.01, "sum {} vs {expected_sum}", stats.sample_sum());

        let q = stats.computed_quantiles();
        assert_eq!(q[0], 3.0);
        let p100 = *q.last().unwrap();
        assert!((p100 - 3_600_000.0).abs() / 3_600_000.0 < 0.01, "P100 = {p100}");

        // bounds: 0.5 1 5 10 25 50 100 250 500 1000 2500 5000 10000 30000 60000 ...
        let b = stats.computed_buckets();
        assert_eq!(b[2], 1, "le 5: {b:?}");
        assert_eq!(b[7], 2, "le 250: {b:?}");
        assert_eq!(b[8], 2, "le 500: {b:?}");
        assert_eq!(b[10], 3, "le 2500: {b:?}");
        assert_eq!(b[14], 4, "le 60000: {b:?}");
        assert_eq!(*b.last().unwrap(), 5, "le 3600000: {b:?}");
    }
}

#[test]
fn histogram_grows_past_the_bucket_table() {
    let h = Histogram::new("big", "big", vec![], 2);
    h.record(10_000_000_000);
    h.record(1);
    h.refresh_interval_statistics();

    let stats = h.cumulative_statistics();
    assert_eq!(stats.sample_count(), 2);
    let p100 = *stats.computed_quantiles().last().unwrap();
    assert!(p100 >= 9.9e9, "P100 = {p100}");
    assert_eq!(*stats.computed_buckets().last().unwrap(), 1);
}
