//! Typed view of one archive line.
//!
//! Known Reddit fields get explicit optional slots; everything else (and any known key
//! whose JSON type is unexpected, e.g. `"title": null`) stays in `extra`, so
//! re-serialization does not lose data.

use crate::error::LineFault;
use serde::Serialize;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Submission vs. comment. Decided from the archive's file name, not the record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Submission,
    Comment,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Parsed creation time, used for filtering and dates.
    #[serde(skip)]
    pub created_utc: i64,
    /// `created_utc` exactly as it appeared in the line.
    #[serde(rename = "created_utc")]
    pub created_raw: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selftext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_self: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Remove `key` if it holds the expected type; otherwise leave it in the map untouched.
fn take_as<T>(map: &mut Map<String, Value>, key: &str, conv: impl Fn(&Value) -> Option<T>) -> Option<T> {
    let v = conv(map.get(key)?)?;
    map.remove(key);
    Some(v)
}

fn as_string(v: &Value) -> Option<String> {
    v.as_str().map(str::to_owned)
}

/// Integers, floats (truncated) and decimal-integer strings are all seen in the dumps.
fn as_timestamp(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn borrowed(s: &Option<String>) -> Option<Cow<'_, str>> {
    s.as_deref().map(Cow::Borrowed)
}

/// Text form of a JSON value for matching and single-field output. `null` counts as absent.
fn value_text(v: &Value) -> Option<Cow<'_, str>> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        other => Some(Cow::Owned(other.to_string())),
    }
}

impl Record {
    /// Parse one raw line. Syntax errors and non-object documents are `Parse` faults;
    /// a missing or non-numeric `created_utc` is a `Schema` fault.
    pub fn parse(line: &str) -> Result<Record, LineFault> {
        let value: Value = serde_json::from_str(line).map_err(|e| LineFault::Parse(e.to_string()))?;
        let mut map = match value {
            Value::Object(m) => m,
            other => return Err(LineFault::Parse(format!("expected a JSON object, found {}", kind_name(&other)))),
        };

        let created_raw = map.remove("created_utc").unwrap_or(Value::Null);
        let created_utc =
            as_timestamp(&created_raw).ok_or_else(|| LineFault::Schema("created_utc".to_string()))?;

        Ok(Record {
            id: take_as(&mut map, "id", as_string),
            created_utc,
            created_raw,
            author: take_as(&mut map, "author", as_string),
            title: take_as(&mut map, "title", as_string),
            body: take_as(&mut map, "body", as_string),
            selftext: take_as(&mut map, "selftext", as_string),
            score: take_as(&mut map, "score", Value::as_i64),
            permalink: take_as(&mut map, "permalink", as_string),
            url: take_as(&mut map, "url", as_string),
            is_self: take_as(&mut map, "is_self", Value::as_bool),
            link_id: take_as(&mut map, "link_id", as_string),
            parent_id: take_as(&mut map, "parent_id", as_string),
            extra: map,
        })
    }

    /// Look up any field by name as text. Known typed fields are rendered the way they
    /// appear in JSON; unknown ones come from the overflow map.
    pub fn field_text(&self, name: &str) -> Option<Cow<'_, str>> {
        let known = match name {
            "id" => borrowed(&self.id),
            "created_utc" => value_text(&self.created_raw),
            "author" => borrowed(&self.author),
            "title" => borrowed(&self.title),
            "body" => borrowed(&self.body),
            "selftext" => borrowed(&self.selftext),
            "score" => self.score.map(|s| Cow::Owned(s.to_string())),
            "permalink" => borrowed(&self.permalink),
            "url" => borrowed(&self.url),
            "is_self" => self.is_self.map(|b| Cow::Owned(b.to_string())),
            "link_id" => borrowed(&self.link_id),
            "parent_id" => borrowed(&self.parent_id),
            _ => None,
        };
        known.or_else(|| self.extra.get(name).and_then(value_text))
    }

    /// `id` for diagnostics, or a placeholder.
    pub fn id_or_unknown(&self) -> &str {
        self.id.as_deref().unwrap_or("<no id>")
    }

    /// Canonical compact single-line JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn kind_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
