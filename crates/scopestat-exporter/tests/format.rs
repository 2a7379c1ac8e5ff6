#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use scopestat_core::{Store, TagExtractStrategy, TagOption};
use scopestat_exporter::format::{format_store, Formatter, PlainFormatter, PrometheusFormatter};

#[test]
fn plain_lists_used_metrics_sorted() {
    let store = Store::default();
    let scope = store.create_scope("svc");
    scope.counter("b_total").add(3);
    scope.gauge("a_gauge").set(7);
    scope.histogram("c_lat").record(5);
    scope.counter("unused");

    let out = format_store(&mut PlainFormatter::new(), &store);
    assert_eq!(
        out,
        "svc.a_gauge: 7\nsvc.b_total: 3\nsvc.c_lat: No recorded values\n"
    );

    scope.histogram("c_lat").refresh_interval_statistics();
    let out = format_store(&mut PlainFormatter::new(), &store);
    assert!(out.contains("svc.c_lat: P0(5,5) "), "{out}");
}

#[test]
fn prometheus_groups_families_by_extracted_name() {
    let store = Store::default();
    store
        .set_tag_option(
            &TagOption::new().with_strategies([TagExtractStrategy::new("service_name", "^service\\.((.*?)\\.)")]),
        )
        .unwrap();
    store.create_scope("service.b").counter("conn").add(2);
    store.create_scope("service.a").counter("conn").inc();
    store.create_scope("").gauge("up").set(1);

    let mut f = PrometheusFormatter::new("ns");
    assert_eq!(f.content_type(), "text/plain; version=0.0.4; charset=utf-8");
    let out = format_store(&mut f, &store);

    assert_eq!(out.matches("# TYPE ns_service_conn counter").count(), 1, "{out}");
    let a = out.find("ns_service_conn{service_name=\"a\"} 1").unwrap();
    let b = out.find("ns_service_conn{service_name=\"b\"} 2").unwrap();
    assert!(a < b);

    assert!(out.contains("# TYPE ns_up gauge\nns_up 1\n"), "{out}");
}

#[test]
fn prometheus_histogram_series() {
    let store = Store::default();
    let h = store.create_scope("").histogram("lat");
    for v in 1..=10 {
        h.record(v);
    }
    h.refresh_interval_statistics();

    let out = format_store(&mut PrometheusFormatter::new("ns"), &store);
    assert!(out.contains("# TYPE ns_lat histogram\n"), "{out}");
    assert!(out.contains("ns_lat_bucket{le=\"0.5\"} 0\n"), "{out}");
    assert!(out.contains("ns_lat_bucket{le=\"1\"} 1\n"), "{out}");
    assert!(out.contains("ns_lat_bucket{le=\"10\"} 10\n"), "{out}");
    assert!(out.contains("ns_lat_bucket{le=\"+Inf\"} 10\n"), "{out}");
    assert!(out.contains("ns_lat_count 10\n"), "{out}");
    assert!(out.contains("ns_lat_sum "), "{out}");
}

#[test]
fn prometheus_escapes_label_values_and_sanitizes_names() {
    let store = Store::default();
    store
        .set_tag_option(&TagOption::new().with_default_tags([("deploy-env", "a\"b\\c")]))
        .unwrap();
    store.create_scope("cx-pool").gauge("open.count").set(3);

    let out = format_store(&mut PrometheusFormatter::new("ns"), &store);
    assert!(
        out.contains("ns_cx_pool_open_count{deploy_env=\"a\\\"b\\\\c\"} 3\n"),
        "{out}"
    );
}

#[test]
fn reused_formatter_emits_type_lines_every_time() {
    let store = Store::default();
    store.create_scope("").counter("hits").inc();

    let mut f = PrometheusFormatter::new("ns");
    let first = format_store(&mut f, &store);
    let second = format_store(&mut f, &store);
    assert_eq!(first, second);
    assert!(second.starts_with("# TYPE ns_hits counter\n"));
}

#[test]
fn prometheus_histogram_places_large_values_in_their_buckets() {
    let store = Store::default();
    let h = store.create_scope("").histogram("lat");
    for v in [3, 120, 1_001, 45_000, 3_600_000] {
        h.record(v);
    }
    h.refresh_interval_statistics();

    let out = format_store(&mut PrometheusFormatter::new("ns"), &store);
    assert!(out.contains("ns_lat_bucket{le=\"1\"} 0\n"), "{out}");
    assert!(out.contains("ns_lat_bucket{le=\"5\"} 1\n"), "{out}");
    assert!(out.contains("ns_lat_bucket{le=\"250\"} 2\n"), "{out}");
    assert!(out.contains("ns_lat_bucket{le=\"2500\"} 3\n"), "{out}");
    assert!(out.contains("ns_lat_bucket{le=\"60000\"} 4\n"), "{out}");
    assert!(out.contains("ns_lat_bucket{le=\"3600000\"} 5\n"), "{out}");
    assert!(out.contains("ns_lat_bucket{le=\"+Inf\"} 5\n"), "{out}");
    assert!(out.contains("ns_lat_count 5\n"), "{out}");

    let sum: f64 = out
        .lines()
        .find_map(|l| l.strip_prefix("ns_lat_sum "))
        .unwrap()
        .parse()
        .unwrap();
    assert!((sum - 3_646_124.0).abs() / 3_646_124.0 < 0.01, "{out}");
}
