use crate::date::Day;
use crate::error::FilterError;
use crate::filters::{FilterCriteria, MatchMode};
use crate::ndjson::NdjsonReader;
use crate::sink::OutputFormat;
use crate::zstd_jsonl::FrameOptions;
use std::path::{Path, PathBuf};
use time::macros::date;

/// Emit a progress line every this many input lines.
pub const DEFAULT_PROGRESS_EVERY: u64 = 100_000;

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct FilterOptions {
    pub input: PathBuf,               // one .zst file or a directory of them
    pub output: PathBuf,              // output base (file input) or directory (dir input)
    pub format: String,               // "zst" | "txt" | "csv"; validated by `resolve`
    pub single_field: Option<String>, // forces txt output when set
    pub field: Option<String>,
    pub values: Vec<String>,
    pub values_file: Option<PathBuf>, // overrides `values` when set
    pub match_mode: MatchMode,
    pub from: Day,                    // inclusive, midnight UTC
    pub to: Day,                      // inclusive, midnight UTC
    pub write_bad_lines: bool,
    pub progress: bool,               // show a byte progress bar
    pub progress_every: u64,

    // IO tuning
    pub frame: FrameOptions,
    pub write_buffer_bytes: usize,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input.zst"),
            output: PathBuf::from("output"),
            format: OutputFormat::Zst.to_string(),
            single_field: None,
            field: None,
            values: Vec::new(),
            values_file: None,
            match_mode: MatchMode::Substring,
            from: Day::from_date(date!(2005 - 01 - 01)),
            to: Day::from_date(date!(2030 - 12 - 31)),
            write_bad_lines: false,
            progress: false,
            progress_every: DEFAULT_PROGRESS_EVERY,
            frame: FrameOptions::default(),
            write_buffer_bytes: 256 * 1024,
        }
    }
}

impl FilterOptions {
    pub fn with_input(mut self, path: impl AsRef<Path>) -> Self {
        self.input = path.as_ref().to_path_buf();
        self
    }
    pub fn with_output(mut self, path: impl AsRef<Path>) -> Self {
        self.output = path.as_ref().to_path_buf();
        self
    }
    pub fn with_format(mut self, format: impl ToString) -> Self {
        self.format = format.to_string();
        self
    }
    pub fn with_single_field(mut self, field: impl Into<String>) -> Self {
        self.single_field = Some(field.into());
        self
    }
    pub fn with_field_values<I, S>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field = Some(field.into());
        self.values = values.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_values_file(mut self, path: impl AsRef<Path>) -> Self {
        self.values_file = Some(path.as_ref().to_path_buf());
        self
    }
    pub fn with_exact_match(mut self, yes: bool) -> Self {
        self.match_mode = if yes { MatchMode::Exact } else { MatchMode::Substring };
        self
    }
    pub fn with_date_range(mut self, from: Day, to: Day) -> Self {
        self.from = from;
        self.to = to;
        self
    }
    pub fn with_write_bad_lines(mut self, yes: bool) -> Self {
        self.write_bad_lines = yes;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_every(mut self, lines: u64) -> Self {
        self.progress_every = lines.max(1);
        self
    }
    pub fn with_frame_options(mut self, frame: FrameOptions) -> Self {
        self.frame = frame;
        self
    }
    pub fn with_write_buffer(mut self, bytes: usize) -> Self {
        self.write_buffer_bytes = bytes.max(8 * 1024);
        self
    }

    /// Validate and freeze the options. Every configuration error surfaces here,
    /// before any archive is opened.
    pub fn resolve(&self) -> Result<RunPlan, FilterError> {
        let requested: OutputFormat = self.format.parse()?;
        let format = if self.single_field.is_some() { OutputFormat::Txt } else { requested };

        if self.from > self.to {
            return Err(FilterError::config(format!("from date {} is after to date {}", self.from, self.to)));
        }

        if self.field.is_none() && (!self.values.is_empty() || self.values_file.is_some()) {
            return Err(FilterError::config("values were given without a field to match them against"));
        }

        let mut criteria = FilterCriteria::date_range(self.from, self.to);
        let mut loaded_from_file = None;
        if let Some(field) = &self.field {
            let values = match &self.values_file {
                Some(path) => {
                    let v = load_values_file(path)?;
                    loaded_from_file = Some((path.clone(), v.len()));
                    v
                }
                None => self.values.clone(),
            };
            criteria = criteria.with_field(field.clone(), values, self.match_mode);
        }

        Ok(RunPlan {
            criteria,
            format,
            requested_format: requested,
            single_field: self.single_field.clone(),
            loaded_from_file,
            write_bad_lines: self.write_bad_lines,
            progress: self.progress,
            progress_every: self.progress_every.max(1),
            frame: self.frame,
            write_buffer_bytes: self.write_buffer_bytes,
        })
    }
}

/// One value per line, trimmed and lowercased. Blank lines are skipped.
pub fn load_values_file(path: &Path) -> Result<Vec<String>, FilterError> {
    let mut rdr = NdjsonReader::open(path, 64 * 1024)
        .map_err(|e| FilterError::config(format!("cannot open values file {}: {e}", path.display())))?;
    let mut values = Vec::new();
    let mut buf = String::new();
    loop {
        let n = rdr
            .read_line(&mut buf)
            .map_err(|e| FilterError::config(format!("cannot read values file {}: {e}", path.display())))?;
        if n == 0 {
            break;
        }
        let v = buf.trim().to_lowercase();
        if !v.is_empty() {
            values.push(v);
        }
    }
    Ok(values)
}

/// Validated, immutable run configuration.
#[derive(Clone, Debug)]
pub struct RunPlan {
    pub criteria: FilterCriteria,
    /// Format actually written (txt when single-field is set).
    pub format: OutputFormat,
    pub requested_format: OutputFormat,
    pub single_field: Option<String>,
    pub loaded_from_file: Option<(PathBuf, usize)>,
    pub write_bad_lines: bool,
    pub progress: bool,
    pub progress_every: u64,
    pub frame: FrameOptions,
    pub write_buffer_bytes: usize,
}

impl RunPlan {
    /// Log the effective configuration once, before processing.
    pub fn log_summary(&self) {
        if self.single_field.is_some() && self.requested_format != OutputFormat::Txt {
            tracing::info!("Single field output mode, changing output file format to txt");
        }
        if let Some((path, n)) = &self.loaded_from_file {
            tracing::info!("Loaded {} from values file {}", n, path.display());
        }
        tracing::info!("Filtering field: {}", self.criteria.field().unwrap_or("None"));
        let values = self.criteria.values();
        if values.len() <= 20 {
            tracing::info!("On values: {}", values.join(","));
        } else {
            tracing::info!("On values:");
            for v in values {
                tracing::info!("{}", v);
            }
        }
        tracing::info!(
            "Exact match {}. Single field {}.",
            if self.criteria.mode() == MatchMode::Exact { "on" } else { "off" },
            self.single_field.as_deref().unwrap_or("None")
        );
        let (from, to) = self.criteria.bounds();
        tracing::info!(
            "From date {} to date {}",
            crate::date::format_day(from),
            crate::date::format_day(to)
        );
        tracing::info!("Output format set to {}", self.format);
    }
}
