//! Output encoders. The variant is fixed when the sink is built; each accepted record is
//! written through the same variant for the whole file.

use crate::date::format_day;
use crate::error::FilterError;
use crate::ndjson::NdjsonWriter;
use crate::record::{Record, RecordKind};
use crate::util::create_with_backoff;
use anyhow::{Context, Result};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;
use zstd::stream::write::Encoder as ZstdEncoder;

pub const REDDIT_BASE_URL: &str = "https://www.reddit.com";
const ZSTD_LEVEL: i32 = 3;

/// Output container format, also the output file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// zstd-compressed NDJSON, original line bytes.
    Zst,
    /// Plain NDJSON (or one value per line in single-field mode).
    Txt,
    /// Comma-separated rows.
    Csv,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Zst => "zst",
            OutputFormat::Txt => "txt",
            OutputFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = FilterError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zst" => Ok(OutputFormat::Zst),
            "txt" => Ok(OutputFormat::Txt),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(FilterError::config(format!("unsupported output format {other:?}"))),
        }
    }
}

/// Where and how to write accepted records.
#[derive(Clone, Debug)]
pub struct OutputSpec {
    pub format: OutputFormat,
    /// Destination without extension; `.{format}` is appended.
    pub base: PathBuf,
    pub single_field: Option<String>,
}

impl OutputSpec {
    /// Single-field extraction always writes plain text.
    pub fn effective_format(&self) -> OutputFormat {
        if self.single_field.is_some() { OutputFormat::Txt } else { self.format }
    }

    pub fn path(&self) -> PathBuf {
        let mut name = self.base.as_os_str().to_os_string();
        name.push(".");
        name.push(self.effective_format().extension());
        PathBuf::from(name)
    }
}

pub enum Sink<W: Write> {
    Raw(ZstdEncoder<'static, BufWriter<W>>),
    Ndjson(NdjsonWriter<W>),
    SingleField { out: NdjsonWriter<W>, field: String },
    Tabular { out: csv::Writer<W>, kind: RecordKind },
}

impl Sink<File> {
    /// Create the destination file for `spec` and build the matching sink.
    pub fn create(spec: &OutputSpec, kind: RecordKind, buf_bytes: usize) -> Result<(Self, PathBuf)> {
        let path = spec.path();
        let file = create_with_backoff(&path, 16, 50).with_context(|| format!("create {}", path.display()))?;
        let sink = Sink::new(file, spec.effective_format(), spec.single_field.as_deref(), kind, buf_bytes)?;
        Ok((sink, path))
    }
}

impl<W: Write> Sink<W> {
    pub fn new(
        inner: W,
        format: OutputFormat,
        single_field: Option<&str>,
        kind: RecordKind,
        buf_bytes: usize,
    ) -> Result<Self> {
        if let Some(field) = single_field {
            return Ok(Sink::SingleField { out: NdjsonWriter::new(inner, buf_bytes), field: field.to_string() });
        }
        Ok(match format {
            OutputFormat::Zst => {
                let buffered = BufWriter::with_capacity(buf_bytes.max(8 * 1024), inner);
                Sink::Raw(ZstdEncoder::new(buffered, ZSTD_LEVEL)?)
            }
            OutputFormat::Txt => Sink::Ndjson(NdjsonWriter::new(inner, buf_bytes)),
            OutputFormat::Csv => Sink::Tabular {
                out: csv::WriterBuilder::new().has_headers(false).from_writer(inner),
                kind,
            },
        })
    }

    /// Write one accepted record. `raw` is the original (trimmed) line.
    /// Returns a diagnostic when fields had to be substituted with empty values.
    pub fn write(&mut self, raw: &str, record: &Record) -> Result<Option<String>> {
        match self {
            Sink::Raw(enc) => {
                enc.write_all(raw.as_bytes())?;
                enc.write_all(b"\n")?;
                Ok(None)
            }
            Sink::Ndjson(out) => {
                out.write_line(&record.to_json()?)?;
                Ok(None)
            }
            Sink::SingleField { out, field } => match record.field_text(field) {
                Some(v) => {
                    out.write_line(&v)?;
                    Ok(None)
                }
                None => {
                    out.write_line("")?;
                    Ok(Some(format!("{} not in object {}", field, record.id_or_unknown())))
                }
            },
            Sink::Tabular { out, kind } => {
                let (row, missing) = tabular_row(record, *kind);
                out.write_record(&row)?;
                if missing.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(format!("{} not in object {}", missing.join(","), record.id_or_unknown())))
                }
            }
        }
    }

    /// Flush/finish the encoder and return the underlying writer.
    pub fn finish(self) -> Result<W> {
        Ok(match self {
            Sink::Raw(enc) => enc.finish()?.into_inner().map_err(|e| e.into_error())?,
            Sink::Ndjson(out) | Sink::SingleField { out, .. } => out.finish()?,
            Sink::Tabular { out, .. } => out
                .into_inner()
                .map_err(|e| anyhow::anyhow!("flush csv output: {}", e.error()))?,
        })
    }
}

/// Fixed-schema row: score, date, [title], u/author, permalink URL, then self-text or URL
/// (submissions) or body (comments). Returns the names of fields that were missing.
///
/// Columns go through `Record::field_text`, so a value with an unexpected JSON type
/// (`"score": "5"`) is written as its text rather than dropped.
pub fn tabular_row(record: &Record, kind: RecordKind) -> (Vec<String>, Vec<&'static str>) {
    let mut missing = Vec::new();
    let mut text = |name: &'static str| -> String {
        match record.field_text(name) {
            Some(v) => v.into_owned(),
            None => {
                missing.push(name);
                String::new()
            }
        }
    };

    let mut row = Vec::with_capacity(6);
    row.push(text("score"));
    row.push(format_day(record.created_utc));
    if kind == RecordKind::Submission {
        row.push(text("title"));
    }
    row.push(format!("u/{}", text("author")));
    row.push(format!("{}{}", REDDIT_BASE_URL, text("permalink")));
    match kind {
        RecordKind::Submission if is_self_post(record) => {
            row.push(record.field_text("selftext").map(Cow::into_owned).unwrap_or_default());
        }
        RecordKind::Submission => row.push(text("url")),
        RecordKind::Comment => row.push(text("body")),
    }
    (row, missing)
}

/// `is_self` with JSON truthiness for non-boolean values. Missing means a link post.
fn is_self_post(record: &Record) -> bool {
    if let Some(b) = record.is_self {
        return b;
    }
    match record.extra.get("is_self") {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Null) | None => false,
    }
}
