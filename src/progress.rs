//! Progress state, the observer interface the pipeline reports through, and the default
//! `tracing`-backed observer (optionally with an `indicatif` byte progress bar).

use crate::date::format_datetime;
use crate::error::LineFault;
use crate::paths::FileJob;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Per-file counters. `total == matched + filtered + bad` once a file completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub total: u64,
    pub matched: u64,
    /// Well-formed lines rejected by the date range or the value match.
    pub filtered: u64,
    pub bad: u64,
    pub bytes_consumed: u64,
    pub total_bytes: u64,
    pub last_created: Option<i64>,
}

impl Counters {
    pub fn new(total_bytes: u64) -> Self {
        Self { total_bytes, ..Default::default() }
    }

    /// Percentage of compressed input consumed, rounded down, capped at 100.
    pub fn percent(&self) -> u64 {
        if self.total_bytes == 0 {
            return 100;
        }
        (self.bytes_consumed.saturating_mul(100) / self.total_bytes).min(100)
    }

    pub fn is_balanced(&self) -> bool {
        self.matched + self.filtered + self.bad == self.total
    }

    /// Fold a finished file into batch totals.
    pub fn absorb(&mut self, other: &Counters) {
        self.total += other.total;
        self.matched += other.matched;
        self.filtered += other.filtered;
        self.bad += other.bad;
        self.bytes_consumed += other.bytes_consumed;
        self.total_bytes += other.total_bytes;
        self.last_created = other.last_created.or(self.last_created);
    }
}

/// Receives everything the pipeline wants to report. All methods default to no-ops.
pub trait Observer {
    fn file_started(&mut self, _job: &FileJob, _output: &Path, _total_bytes: u64) {}
    /// Called whenever the consumed-byte offset advances.
    fn bytes_consumed(&mut self, _offset: u64) {}
    /// Called every `progress_every` lines.
    fn progress(&mut self, _counters: &Counters) {}
    fn bad_line(&mut self, _line: &str, _fault: &LineFault) {}
    /// Output-side diagnostics such as a missing single field.
    fn notice(&mut self, _message: &str) {}
    fn file_finished(&mut self, _job: &FileJob, _counters: &Counters) {}
}

/// Silently drops all reports.
pub struct NullObserver;
impl Observer for NullObserver {}

/// Logs through `tracing`, in the `date : total : matched : bad : bytes:pct%` shape.
pub struct TracingObserver {
    write_bad_lines: bool,
    show_bar: bool,
    bar: Option<ProgressBar>,
}

impl TracingObserver {
    pub fn new(write_bad_lines: bool, show_bar: bool) -> Self {
        Self { write_bad_lines, show_bar, bar: None }
    }
}

impl Observer for TracingObserver {
    fn file_started(&mut self, job: &FileJob, output: &Path, total_bytes: u64) {
        tracing::info!(
            "Input: {} : Output: {} : Is submission {}",
            job.input.display(),
            output.display(),
            job.kind == crate::record::RecordKind::Submission
        );
        if self.show_bar {
            let label = job.input.file_name().map(|n| n.to_string_lossy().into_owned());
            self.bar = Some(make_progress_bar_labeled(total_bytes, label.as_deref()));
        }
    }

    fn bytes_consumed(&mut self, offset: u64) {
        if let Some(pb) = &self.bar {
            pb.set_position(offset);
        }
    }

    fn progress(&mut self, c: &Counters) {
        let created = c.last_created.map(format_datetime).unwrap_or_else(|| "-".to_string());
        tracing::info!(
            "{} : {} : {} : {} : {}:{}%",
            created, c.total, c.matched, c.bad, c.bytes_consumed, c.percent()
        );
    }

    fn bad_line(&mut self, line: &str, fault: &LineFault) {
        if self.write_bad_lines {
            tracing::warn!("{}", fault);
            tracing::warn!("{}", line);
        }
    }

    fn notice(&mut self, message: &str) {
        tracing::info!("{}", message);
    }

    fn file_finished(&mut self, _job: &FileJob, c: &Counters) {
        if let Some(pb) = self.bar.take() {
            pb.finish_with_message("done");
        }
        tracing::info!("Complete : {} : {} : {} : {}", c.total, c.matched, c.filtered, c.bad);
    }
}

pub fn make_progress_bar_labeled(total_bytes: u64, label: Option<&str>) -> ProgressBar {
    let pb = ProgressBar::new(total_bytes);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} {msg} {bytes:>10}/{total_bytes:<10} [{bar:.cyan/blue}] {percent:>3}%  \
         {bytes_per_sec}  elapsed: {elapsed_precise}  eta: {eta_precise}",
    ) {
        pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
    }
    if let Some(msg) = label {
        pb.set_message(msg.to_string());
    }
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
