mod config;
mod date;
mod error;
mod paths;
mod zstd_jsonl;

mod record;
mod filters;
mod sink;
mod ndjson;
mod progress;
mod pipeline;

mod logging;
mod util;

pub use crate::config::{load_values_file, FilterOptions, RunPlan, DEFAULT_PROGRESS_EVERY};
pub use crate::date::{format_datetime, format_day, Day};
pub use crate::error::{FilterError, LineFault};
pub use crate::pipeline::{filter_lines, process_batch, process_file, DumpFilter, FileState};

// Frame reader and its tuning knobs.
pub use crate::zstd_jsonl::{
    read_all_lines, FrameOptions, FrameReader, DEFAULT_CHUNK_SIZE, DEFAULT_RETRY_CEILING, DEFAULT_WINDOW_LOG_MAX,
};

// Records, predicate and sinks.
pub use crate::record::{Record, RecordKind};
pub use crate::filters::{FilterCriteria, MatchMode, Verdict};
pub use crate::sink::{tabular_row, OutputFormat, OutputSpec, Sink, REDDIT_BASE_URL};
pub use crate::ndjson::{NdjsonReader, NdjsonWriter};

// Job planning.
pub use crate::paths::{kind_from_path, output_stem, plan_jobs, FileJob, ARCHIVE_EXTENSION};

// Observation and logging setup for binaries.
pub use crate::progress::{make_progress_bar_labeled, Counters, NullObserver, Observer, TracingObserver};
pub use crate::logging::{
    init_tracing_once, init_tracing_with_file, RotatingFile, RotatingLog, DEFAULT_LOG_BACKUPS, DEFAULT_LOG_MAX_BYTES,
};
