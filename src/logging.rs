//! Process-wide `tracing` setup: console output plus an optional size-rotated log file.

use parking_lot::{Mutex, MutexGuard};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_MAX_BYTES: u64 = 16 * 1024 * 1024;
pub const DEFAULT_LOG_BACKUPS: usize = 5;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Console-only subscriber (`RUST_LOG`, default `info`). Safe to call repeatedly.
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter()).try_init();
    });
}

/// Console plus `dir/bot.log`, rotated at `max_bytes` with `backups` old files kept
/// (`bot.log.1` is the newest backup). Falls back to console-only if the file cannot be
/// opened.
pub fn init_tracing_with_file(dir: &Path, max_bytes: u64, backups: usize) {
    INIT_ONCE.call_once(|| {
        let file_layer = match RotatingFile::open(dir.join("bot.log"), max_bytes, backups) {
            Ok(rf) => Some(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(RotatingLog::new(rf))),
            Err(e) => {
                eprintln!("cannot open log file in {}: {e}", dir.display());
                None
            }
        };
        let _ = tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_subscriber::fmt::layer())
            .with(file_layer)
            .try_init();
    });
}

/// Append-only file that rolls over once it would exceed `max_bytes`.
pub struct RotatingFile {
    path: PathBuf,
    file: File,
    size: u64,
    max_bytes: u64,
    backups: usize,
}

impl RotatingFile {
    pub fn open(path: PathBuf, max_bytes: u64, backups: usize) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok(Self { path, file, size, max_bytes: max_bytes.max(1), backups })
    }

    fn backup_path(&self, n: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{n}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.backups > 0 {
            let oldest = self.backup_path(self.backups);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for n in (1..self.backups).rev() {
                let src = self.backup_path(n);
                if src.exists() {
                    fs::rename(&src, self.backup_path(n + 1))?;
                }
            }
            fs::rename(&self.path, self.backup_path(1))?;
            self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        } else {
            self.file = OpenOptions::new().create(true).write(true).truncate(true).open(&self.path)?;
        }
        self.size = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.size > 0 && self.size + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.size += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// `MakeWriter` handing out locked access to a shared `RotatingFile`.
pub struct RotatingLog {
    inner: Mutex<RotatingFile>,
}

impl RotatingLog {
    pub fn new(file: RotatingFile) -> Self {
        Self { inner: Mutex::new(file) }
    }
}

pub struct RotatingLogWriter<'a>(MutexGuard<'a, RotatingFile>);

impl Write for RotatingLogWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }
    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingLog {
    type Writer = RotatingLogWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingLogWriter(self.inner.lock())
    }
}
