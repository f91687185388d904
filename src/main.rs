use anyhow::Result;
use clap::Parser;
use dumpfilter::{
    init_tracing_with_file, Day, DumpFilter, FrameOptions, TracingObserver, DEFAULT_CHUNK_SIZE, DEFAULT_LOG_BACKUPS,
    DEFAULT_LOG_MAX_BYTES, DEFAULT_WINDOW_LOG_MAX,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dumpfilter", version)]
#[command(about = "Filter zstd-compressed Reddit NDJSON dumps by date range and field value")]
struct Cli {
    /// A .zst archive, or a directory of them
    #[arg(short, long)]
    input: PathBuf,

    /// Output base name (extension is added), or output directory for a directory input
    #[arg(short, long)]
    output: PathBuf,

    /// zst, txt or csv
    #[arg(short, long, default_value = "zst")]
    format: String,

    /// Field to filter on, e.g. author, title, selftext, body, link_id
    #[arg(long)]
    field: Option<String>,

    /// Comma-separated values to match (case-insensitive)
    #[arg(long, value_delimiter = ',')]
    values: Vec<String>,

    /// File with one value per line; overrides --values
    #[arg(long)]
    values_file: Option<PathBuf>,

    /// Require the whole field to equal a value instead of containing it
    #[arg(long)]
    exact_match: bool,

    /// Only records created on or after this day (YYYY-MM-DD, UTC)
    #[arg(long, default_value = "2005-01-01")]
    from: Day,

    /// Only records created on or before midnight of this day (YYYY-MM-DD, UTC)
    #[arg(long, default_value = "2030-12-31")]
    to: Day,

    /// Write only this field, one value per line (forces txt output)
    #[arg(long)]
    single_field: Option<String>,

    /// Log every bad line with the reason
    #[arg(long)]
    write_bad_lines: bool,

    /// Show a byte progress bar per file
    #[arg(long)]
    progress: bool,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Decompressed bytes per read
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Largest zstd window accepted, as a power of two
    #[arg(long, default_value_t = DEFAULT_WINDOW_LOG_MAX)]
    window_log_max: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing_with_file(&cli.log_dir, DEFAULT_LOG_MAX_BYTES, DEFAULT_LOG_BACKUPS);

    let mut filter = DumpFilter::new()
        .input(&cli.input)
        .output(&cli.output)
        .format(&cli.format)
        .exact_match(cli.exact_match)
        .date_range(cli.from, cli.to)
        .write_bad_lines(cli.write_bad_lines)
        .progress(cli.progress)
        .frame_options(
            FrameOptions::default()
                .with_chunk_size(cli.chunk_size)
                .with_window_log_max(cli.window_log_max),
        );

    if let Some(field) = cli.field {
        filter = filter.field(field);
    }
    if !cli.values.is_empty() {
        filter = filter.values(cli.values);
    }
    if let Some(path) = cli.values_file {
        filter = filter.values_file(path);
    }
    if let Some(single) = cli.single_field {
        filter = filter.single_field(single);
    }

    let mut observer = TracingObserver::new(cli.write_bad_lines, cli.progress);
    let totals = filter.run_with(&mut observer)?;
    tracing::info!(
        "All files complete : {} : {} : {} : {}",
        totals.total, totals.matched, totals.filtered, totals.bad
    );
    Ok(())
}
