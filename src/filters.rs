//! Record-level predicate: inclusive date bounds plus an optional field/value match.

use crate::date::Day;
use crate::error::LineFault;
use crate::record::Record;
use ahash::AHashSet;

/// Exact equality or substring containment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MatchMode {
    Exact,
    #[default]
    Substring,
}

/// Outcome of evaluating one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    /// Well-formed but outside the date range or not matching any value.
    Reject,
    /// The configured field is missing; counted as a bad line.
    Bad(LineFault),
}

/// Immutable filter configuration. All values are lowercased at construction.
#[derive(Clone, Debug)]
pub struct FilterCriteria {
    field: Option<String>,
    values: Vec<String>,
    exact: AHashSet<String>,
    mode: MatchMode,
    from: i64,
    to: i64,
}

impl FilterCriteria {
    /// Date range only, accepting every field value.
    pub fn date_range(from: Day, to: Day) -> Self {
        Self::from_timestamps(from.unix_timestamp(), to.unix_timestamp())
    }

    /// Inclusive `[from, to]` in Unix seconds.
    pub fn from_timestamps(from: i64, to: i64) -> Self {
        Self { field: None, values: Vec::new(), exact: AHashSet::new(), mode: MatchMode::default(), from, to }
    }

    /// Restrict to records whose `field` matches one of `values` (case-insensitive).
    pub fn with_field<I, S>(mut self, field: impl Into<String>, values: I, mode: MatchMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.field = Some(field.into());
        self.values = values.into_iter().map(|v| v.as_ref().to_lowercase()).collect();
        self.exact = if mode == MatchMode::Exact { self.values.iter().cloned().collect() } else { AHashSet::new() };
        self.mode = mode;
        self
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
    pub fn values(&self) -> &[String] {
        &self.values
    }
    pub fn mode(&self) -> MatchMode {
        self.mode
    }
    pub fn bounds(&self) -> (i64, i64) {
        (self.from, self.to)
    }

    #[inline]
    pub fn within_dates(&self, created_utc: i64) -> bool {
        created_utc >= self.from && created_utc <= self.to
    }

    /// Does an already lowercased field value match the configured values?
    pub fn matches_value(&self, lowered: &str) -> bool {
        match self.mode {
            MatchMode::Exact => self.exact.contains(lowered),
            MatchMode::Substring => self.values.iter().any(|v| lowered.contains(v.as_str())),
        }
    }

    pub fn evaluate(&self, record: &Record) -> Verdict {
        if !self.within_dates(record.created_utc) {
            return Verdict::Reject;
        }
        let Some(field) = self.field.as_deref() else {
            return Verdict::Accept;
        };
        match record.field_text(field) {
            None => Verdict::Bad(LineFault::Schema(field.to_string())),
            Some(text) if self.matches_value(&text.to_lowercase()) => Verdict::Accept,
            Some(_) => Verdict::Reject,
        }
    }
}
