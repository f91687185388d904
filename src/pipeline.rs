//! Orchestration: Frame Reader → Record Parser → Filter Predicate → Sink, per file and
//! across a batch, with counters reported through an injected `Observer`.

use crate::config::{FilterOptions, RunPlan};
use crate::date::Day;
use crate::error::{FilterError, LineFault};
use crate::filters::{FilterCriteria, Verdict};
use crate::logging::init_tracing_once;
use crate::paths::{plan_jobs, FileJob};
use crate::progress::{Counters, Observer, TracingObserver};
use crate::record::Record;
use crate::sink::{OutputSpec, Sink};
use crate::util::file_size;
use crate::zstd_jsonl::{FrameOptions, FrameReader};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Lifecycle of one input file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileState {
    Init,
    Reading,
    Finalizing,
    Done,
    Failed,
}

fn transition(state: &mut FileState, next: FileState, job: &FileJob) {
    tracing::debug!(file = %job.input.display(), from = ?*state, to = ?next, "file state");
    *state = next;
}

/// Builder facade over `FilterOptions`.
#[derive(Clone, Default)]
pub struct DumpFilter {
    pub(crate) opts: FilterOptions,
}

impl DumpFilter {
    pub fn new() -> Self {
        Self { opts: FilterOptions::default() }
    }
    pub fn from_options(opts: FilterOptions) -> Self {
        Self { opts }
    }

    // -------- Builder methods --------
    pub fn input(mut self, path: impl AsRef<Path>) -> Self { self.opts = self.opts.with_input(path); self }
    pub fn output(mut self, path: impl AsRef<Path>) -> Self { self.opts = self.opts.with_output(path); self }
    pub fn format(mut self, format: impl ToString) -> Self { self.opts = self.opts.with_format(format); self }
    pub fn single_field(mut self, field: impl Into<String>) -> Self { self.opts = self.opts.with_single_field(field); self }
    pub fn field_values<I, S>(mut self, field: impl Into<String>, values: I) -> Self where I: IntoIterator<Item = S>, S: Into<String> { self.opts = self.opts.with_field_values(field, values); self }
    pub fn field(mut self, field: impl Into<String>) -> Self { self.opts = self.opts.with_field(field); self }
    pub fn values<I, S>(mut self, values: I) -> Self where I: IntoIterator<Item = S>, S: Into<String> { self.opts = self.opts.with_values(values); self }
    pub fn values_file(mut self, path: impl AsRef<Path>) -> Self { self.opts = self.opts.with_values_file(path); self }
    pub fn exact_match(mut self, yes: bool) -> Self { self.opts = self.opts.with_exact_match(yes); self }
    pub fn date_range(mut self, from: Day, to: Day) -> Self { self.opts = self.opts.with_date_range(from, to); self }
    pub fn write_bad_lines(mut self, yes: bool) -> Self { self.opts = self.opts.with_write_bad_lines(yes); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_every(mut self, lines: u64) -> Self { self.opts = self.opts.with_progress_every(lines); self }
    pub fn frame_options(mut self, frame: FrameOptions) -> Self { self.opts = self.opts.with_frame_options(frame); self }
    pub fn write_buffer(mut self, bytes: usize) -> Self { self.opts = self.opts.with_write_buffer(bytes); self }

    pub fn options(&self) -> &FilterOptions {
        &self.opts
    }

    /// Run with the default `tracing` observer. Returns batch totals.
    pub fn run(self) -> Result<Counters> {
        init_tracing_once();
        let mut observer = TracingObserver::new(self.opts.write_bad_lines, self.opts.progress);
        self.run_with(&mut observer)
    }

    /// Run with a caller-supplied observer.
    pub fn run_with(self, observer: &mut dyn Observer) -> Result<Counters> {
        let plan = self.opts.resolve()?;
        plan.log_summary();

        let jobs = plan_jobs(&self.opts.input, &self.opts.output)?;
        tracing::info!("Processing {} files", jobs.len());
        process_batch(&jobs, &plan, observer)
    }
}

/// Process every job in order. The first fatal error aborts the remaining batch.
pub fn process_batch(jobs: &[FileJob], plan: &RunPlan, observer: &mut dyn Observer) -> Result<Counters> {
    let mut totals = Counters::default();
    for job in jobs {
        let c = process_file(job, plan, observer).with_context(|| format!("processing {}", job.input.display()))?;
        totals.absorb(&c);
    }
    Ok(totals)
}

/// Filter one archive into its output file. The sink is finished on every exit path.
pub fn process_file(job: &FileJob, plan: &RunPlan, observer: &mut dyn Observer) -> Result<Counters> {
    let mut state = FileState::Init;

    let total_bytes = file_size(&job.input);
    let reader = match FrameReader::open(&job.input, plan.frame) {
        Ok(r) => r,
        Err(e) => {
            transition(&mut state, FileState::Failed, job);
            return Err(e).with_context(|| format!("open {}", job.input.display()));
        }
    };
    let spec = OutputSpec {
        format: plan.format,
        base: job.output_base.clone(),
        single_field: plan.single_field.clone(),
    };
    let (mut sink, out_path) = match Sink::create(&spec, job.kind, plan.write_buffer_bytes) {
        Ok(s) => s,
        Err(e) => {
            transition(&mut state, FileState::Failed, job);
            return Err(e);
        }
    };
    observer.file_started(job, &out_path, total_bytes);

    let mut counters = Counters::new(total_bytes);
    transition(&mut state, FileState::Reading, job);
    let pumped = filter_lines(reader, &mut sink, &plan.criteria, plan.progress_every, observer, &mut counters);

    match pumped {
        Ok(()) => {
            transition(&mut state, FileState::Finalizing, job);
            sink.finish().with_context(|| format!("finish {}", out_path.display()))?;
            transition(&mut state, FileState::Done, job);
            observer.file_finished(job, &counters);
            Ok(counters)
        }
        Err(e) => {
            transition(&mut state, FileState::Failed, job);
            if let Err(close) = sink.finish() {
                tracing::warn!(path = %out_path.display(), error = %close, "failed to close output after error");
            }
            tracing::error!(
                "Failed after {} lines : {} : {} : {}",
                counters.total, counters.matched, counters.filtered, counters.bad
            );
            Err(e)
        }
    }
}

/// How one line was classified.
enum LineOutcome {
    Matched(Record),
    Filtered,
    Bad(LineFault),
}

fn classify(line: &str, criteria: &FilterCriteria, counters: &mut Counters) -> LineOutcome {
    let record = match Record::parse(line) {
        Ok(r) => r,
        Err(fault) => return LineOutcome::Bad(fault),
    };
    counters.last_created = Some(record.created_utc);
    match criteria.evaluate(&record) {
        Verdict::Accept => LineOutcome::Matched(record),
        Verdict::Reject => LineOutcome::Filtered,
        Verdict::Bad(fault) => LineOutcome::Bad(fault),
    }
}

/// Pull loop over `(line, offset)` pairs. Bad lines are counted and reported; a frame
/// error stops the loop and is returned.
pub fn filter_lines<I, W>(
    lines: I,
    sink: &mut Sink<W>,
    criteria: &FilterCriteria,
    progress_every: u64,
    observer: &mut dyn Observer,
    counters: &mut Counters,
) -> Result<()>
where
    I: IntoIterator<Item = Result<(String, u64), FilterError>>,
    W: Write,
{
    let every = progress_every.max(1);
    for item in lines {
        let (line, offset) = item?;
        counters.total += 1;
        if offset != counters.bytes_consumed {
            counters.bytes_consumed = offset;
            observer.bytes_consumed(offset);
        }
        match classify(&line, criteria, counters) {
            LineOutcome::Matched(record) => {
                counters.matched += 1;
                if let Some(note) = sink.write(&line, &record)? {
                    observer.notice(&note);
                }
            }
            LineOutcome::Filtered => counters.filtered += 1,
            LineOutcome::Bad(fault) => {
                counters.bad += 1;
                observer.bad_line(&line, &fault);
            }
        }
        if counters.total % every == 0 {
            observer.progress(counters);
        }
    }
    Ok(())
}
