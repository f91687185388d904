#[path = "common/mod.rs"]
mod common;

use common::*;
use dumpfilter::{FilterCriteria, LineFault, MatchMode, Record, Verdict};
use serde_json::json;

fn record(v: serde_json::Value) -> Record {
    Record::parse(&v.to_string()).unwrap()
}

fn wide_range() -> FilterCriteria {
    FilterCriteria::date_range(day(2005, 1, 1), day(2030, 12, 31))
}

#[test]
fn parse_extracts_known_fields_and_keeps_the_rest() {
    let r = record(json!({
        "id": "abc", "created_utc": 1609459200, "author": "Watchful1", "score": 12,
        "is_self": true, "title": null, "subreddit": "redditdev", "edited": false
    }));
    assert_eq!(r.id.as_deref(), Some("abc"));
    assert_eq!(r.created_utc, 1609459200);
    assert_eq!(r.author.as_deref(), Some("Watchful1"));
    assert_eq!(r.score, Some(12));
    assert_eq!(r.is_self, Some(true));
    assert_eq!(r.title, None);
    assert_eq!(r.extra.get("subreddit"), Some(&json!("redditdev")));

    // `title: null` survives re-serialization through the overflow map.
    let back: serde_json::Value = serde_json::from_str(&r.to_json().unwrap()).unwrap();
    assert_eq!(back["title"], serde_json::Value::Null);
    assert_eq!(back["edited"], json!(false));
    assert_eq!(back["created_utc"], json!(1609459200));
}

#[test]
fn created_utc_accepts_strings_and_floats() {
    assert_eq!(record(json!({"created_utc": "1609459200"})).created_utc, 1609459200);
    assert_eq!(record(json!({"created_utc": 1609459200.0})).created_utc, 1609459200);
}

#[test]
fn parse_failures_are_classified() {
    assert!(Record::parse("{not json").unwrap_err().is_parse());
    assert!(Record::parse("").unwrap_err().is_parse());
    assert!(Record::parse("[1,2,3]").unwrap_err().is_parse());

    assert_eq!(Record::parse(r#"{"id":"x"}"#).unwrap_err(), LineFault::Schema("created_utc".into()));
    assert_eq!(
        Record::parse(r#"{"id":"x","created_utc":"yesterday"}"#).unwrap_err(),
        LineFault::Schema("created_utc".into())
    );
}

#[test]
fn field_text_covers_typed_and_overflow_fields() {
    let r = record(json!({"created_utc": 1, "score": -3, "num_comments": 40, "subreddit": "Rust", "gone": null}));
    assert_eq!(r.field_text("score").as_deref(), Some("-3"));
    assert_eq!(r.field_text("num_comments").as_deref(), Some("40"));
    assert_eq!(r.field_text("subreddit").as_deref(), Some("Rust"));
    assert_eq!(r.field_text("gone"), None);
    assert_eq!(r.field_text("author"), None);
}

/// Three records dated 2021-01-01, 2019-01-01, 2021-06-01 against [2020-01-01, 2022-01-01].
#[test]
fn date_range_scenario() {
    let criteria = FilterCriteria::date_range(day(2020, 1, 1), day(2022, 1, 1));
    let verdicts: Vec<Verdict> = [ts(2021, 1, 1), ts(2019, 1, 1), ts(2021, 6, 1)]
        .iter()
        .map(|&t| criteria.evaluate(&record(json!({"id": "x", "created_utc": t}))))
        .collect();
    assert_eq!(verdicts, vec![Verdict::Accept, Verdict::Reject, Verdict::Accept]);
}

#[test]
fn date_bounds_are_inclusive() {
    let criteria = FilterCriteria::date_range(day(2020, 1, 1), day(2020, 1, 31));
    let at = |t: i64| criteria.evaluate(&record(json!({"created_utc": t})));
    assert_eq!(at(ts(2020, 1, 1)), Verdict::Accept);
    assert_eq!(at(ts(2020, 1, 31)), Verdict::Accept);
    assert_eq!(at(ts(2020, 1, 1) - 1), Verdict::Reject);
    assert_eq!(at(ts(2020, 1, 31) + 1), Verdict::Reject);
}

#[test]
fn substring_match_is_case_insensitive_and_missing_field_is_bad() {
    let criteria = wide_range().with_field("selftext", ["hack"], MatchMode::Substring);

    let hit = record(json!({"id": "a", "created_utc": ts(2021, 1, 1), "selftext": "This is a HACK attempt"}));
    let miss = record(json!({"id": "b", "created_utc": ts(2021, 1, 1), "selftext": "nothing to see"}));
    let absent = record(json!({"id": "c", "created_utc": ts(2021, 1, 1)}));

    assert_eq!(criteria.evaluate(&hit), Verdict::Accept);
    assert_eq!(criteria.evaluate(&miss), Verdict::Reject);
    assert_eq!(criteria.evaluate(&absent), Verdict::Bad(LineFault::Schema("selftext".into())));
}

#[test]
fn exact_match_requires_equality() {
    let criteria = wide_range().with_field("author", ["Watchful1", "spez"], MatchMode::Exact);
    let by = |a: &str| criteria.evaluate(&record(json!({"created_utc": ts(2021, 1, 1), "author": a})));

    assert_eq!(by("watchful1"), Verdict::Accept);
    assert_eq!(by("SPEZ"), Verdict::Accept);
    assert_eq!(by("watchful12"), Verdict::Reject);
    assert_eq!(by("not_spez"), Verdict::Reject);
}

#[test]
fn configured_values_are_lowercased_once() {
    let criteria = wide_range().with_field("title", ["StONk", "MOON"], MatchMode::Substring);
    assert_eq!(criteria.values(), ["stonk".to_string(), "moon".to_string()]);
    assert!(criteria.matches_value("to the moon!"));
    assert!(!criteria.matches_value("to the MOON!"), "callers pass already-lowercased text");
}

/// Prefixed ids like `t3_abc` need substring mode to match a bare id list.
#[test]
fn link_id_substring_match() {
    let criteria = wide_range().with_field("link_id", ["abc"], MatchMode::Substring);
    let r = record(json!({"created_utc": ts(2021, 1, 1), "link_id": "t3_abc"}));
    assert_eq!(criteria.evaluate(&r), Verdict::Accept);

    let exact = wide_range().with_field("link_id", ["abc"], MatchMode::Exact);
    assert_eq!(exact.evaluate(&r), Verdict::Reject);
}

#[test]
fn out_of_range_rejects_regardless_of_field() {
    let criteria = FilterCriteria::date_range(day(2020, 1, 1), day(2020, 12, 31))
        .with_field("selftext", ["hack"], MatchMode::Substring);
    let matching_but_old = record(json!({"created_utc": ts(2019, 5, 5), "selftext": "hack"}));
    let missing_and_old = record(json!({"created_utc": ts(2019, 5, 5)}));
    assert_eq!(criteria.evaluate(&matching_but_old), Verdict::Reject);
    assert_eq!(criteria.evaluate(&missing_and_old), Verdict::Reject);
}

/// An empty value matches any present field in substring mode.
#[test]
fn empty_value_matches_any_present_field() {
    let criteria = wide_range().with_field("body", [""], MatchMode::Substring);
    assert_eq!(criteria.evaluate(&record(json!({"created_utc": 5_000_000_000i64, "body": "x"}))), Verdict::Reject);
    assert_eq!(criteria.evaluate(&record(json!({"created_utc": ts(2010, 1, 1), "body": "x"}))), Verdict::Accept);
}
