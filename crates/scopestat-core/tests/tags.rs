#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use scopestat_core::tag::remove_characters;
use scopestat_core::{IntervalSet, Metric, Store, Tag, TagExtractStrategy, TagExtractor, TagOption, TagProducer};

fn prefix_of(regex: &str) -> Option<String> {
    TagExtractor::new("foo", regex, None)
        .unwrap()
        .prefix_token()
        .map(str::to_string)
}

#[test]
fn prefix_token_from_anchored_patterns() {
    assert_eq!(prefix_of("^prefix\\.(foo)").as_deref(), Some("prefix"));
    assert_eq!(prefix_of("^prefix_optional(?:\\.)(.*)").as_deref(), Some("prefix_optional"));
    assert_eq!(prefix_of("(prefix)"), None);
    assert_eq!(prefix_of("^(prefix)"), None);
    assert_eq!(prefix_of("^prefix(foo)"), None);
    assert_eq!(prefix_of("prefix(foo)"), None);
    // only a literal separator ends the token
    assert_eq!(prefix_of("^prefix$|(foo)"), None);
}

#[test]
fn extractor_requires_a_capturing_group() {
    let err = TagExtractor::new("plain", "^prefix$", None).unwrap_err();
    assert_eq!(err.code(), "INVALID_TAG_EXTRACTOR");

    let err = TagExtractor::new("broken", "([a-z", None).unwrap_err();
    assert_eq!(err.code(), "INVALID_TAG_EXTRACTOR");
}

#[test]
fn remove_characters_splices_spans() {
    let s = "hello, kimmy & hello, jimmy";
    let mut remove = IntervalSet::new();
    remove.insert(0, 7);
    remove.insert(14, 21);
    assert_eq!(remove_characters(s, &remove), "kimmy & jimmy");

    assert_eq!(remove_characters(s, &IntervalSet::new()), s);
}

#[test]
fn extract_service_name() {
    let e = TagExtractor::new("service_name", "^service\\.((.*?)\\.)", Some("service")).unwrap();

    let mut tags = Vec::new();
    let mut remove = IntervalSet::new();
    // substring pre-check rejects without touching the outputs
    assert!(!e.extract("broker.zk.available", &mut tags, &mut remove));
    assert!(tags.is_empty());
    assert!(remove.is_empty());

    let name = "service.corvus_111.downstream_cx_total";
    assert!(e.extract(name, &mut tags, &mut remove));
    assert_eq!(remove_characters(name, &remove), "service.downstream_cx_total");
    assert_eq!(tags, vec![Tag::new("service_name", "corvus_111")]);
}

#[test]
fn produce_with_default_and_prefixed_extractors() {
    let mut p = TagProducer::new(vec![Tag::new("tag1", "hhm"), Tag::new("tag2", "wm")]);
    p.add_extractor(TagExtractor::new("service_name", "^service\\.((.*?)\\.)", Some("service")).unwrap());
    p.add_extractor(
        TagExtractor::new("redis_cmd", "^service(?:\\.).*?\\.redis\\.((.*?)\\.)", Some(".redis.")).unwrap(),
    );
    assert_eq!(p.prefix_extractors(), 2);
    assert_eq!(p.normal_extractors(), 0);

    let (name, tags) = p.produce("service.corvus_111.downstream_cx_total");
    assert_eq!(name, "service.downstream_cx_total");
    assert_eq!(tags.len(), 3);
    assert_eq!(tags[2], Tag::new("service_name", "corvus_111"));

    let (name, tags) = p.produce("service.corvus_111.redis.get.total");
    assert_eq!(name, "service.redis.total");
    assert_eq!(tags.len(), 4);
    assert_eq!(tags[3], Tag::new("redis_cmd", "get"));

    // prefixed extractors never run for other first segments
    let (name, tags) = p.produce("listener.service.x.total");
    assert_eq!(name, "listener.service.x.total");
    assert_eq!(tags.len(), 2);
}

#[test]
fn produce_is_deterministic() {
    let mut p = TagProducer::default();
    p.add_extractor(TagExtractor::new("cmd", "\\.cmd\\.((\\w+)\\.)", None).unwrap());
    assert_eq!(p.normal_extractors(), 1);

    let a = p.produce("proxy.cmd.get.latency");
    let b = p.produce("proxy.cmd.get.latency");
    assert_eq!(a, b);
    assert_eq!(a.0, "proxy.cmd.latency");
}

#[test]
fn store_applies_default_tags() {
    let store = Store::default();
    store
        .set_tag_option(&TagOption::new().with_default_tags([("tag1", "value1")]))
        .unwrap();

    let c = store.create_scope("service").counter("corvus_111");
    assert_eq!(c.tag_extracted_name(), "service.corvus_111");
    assert_eq!(c.tags(), &[Tag::new("tag1", "value1")]);
}

#[test]
fn store_applies_dynamic_tags() {
    let store = Store::default();
    store
        .set_tag_option(
            &TagOption::new().with_strategies([TagExtractStrategy::new("service_name", "^service\\.((.*?)\\.)")]),
        )
        .unwrap();

    let c = store.create_scope("service.corvus_111").counter("conn_total");
    assert_eq!(c.name(), "service.corvus_111.conn_total");
    assert_eq!(c.tag_extracted_name(), "service.conn_total");
    assert_eq!(c.tags(), &[Tag::new("service_name", "corvus_111")]);
}

#[test]
fn invalid_strategy_leaves_active_option_untouched() {
    let store = Store::default();
    store
        .set_tag_option(&TagOption::new().with_default_tags([("env", "prod")]))
        .unwrap();

    let bad = TagOption::new().with_strategies([
        TagExtractStrategy::new("ok", "^service\\.((.*?)\\.)"),
        TagExtractStrategy::new("lookbehind", "(?<!\\d )(\\d+)"),
    ]);
    let err = store.set_tag_option(&bad).unwrap_err();
    assert_eq!(err.code(), "INVALID_TAG_EXTRACTOR");

    let g = store.create_scope("service.a").gauge("up");
    assert_eq!(g.tag_extracted_name(), "service.a.up");
    assert_eq!(g.tags(), &[Tag::new("env", "prod")]);
}
