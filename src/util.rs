//! Robust file open/create with retries for transient I/O errors (AV scanners, NAS
//! hiccups, sharing violations on Windows).

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

/// Return true for transient/retriable I/O errors often seen on Windows when
/// filter drivers (AV/backup), USB/NAS volumes, or sharing violations occur.
fn is_retriable_io_error(e: &io::Error) -> bool {
    // 5 access denied, 21 device not ready, 32 sharing violation, 33 lock violation,
    // 225 AV block, 433 missing device, 1006 volume altered, 1117 device error,
    // 1224 user-mapped section open.
    matches!(e.raw_os_error(), Some(5 | 21 | 32 | 33 | 225 | 433 | 1006 | 1117 | 1224))
}

/// Run `op` up to `tries` times, sleeping `delay_ms * attempt` between transient failures.
fn with_backoff<T>(
    what: &str,
    tries: usize,
    delay_ms: u64,
    mut op: impl FnMut() -> io::Result<T>,
) -> io::Result<T> {
    let mut last_err: Option<io::Error> = None;
    for i in 0..tries.max(1) {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if is_retriable_io_error(&e) => {
                tracing::debug!(attempt = i + 1, error = %e, "transient I/O error during {}", what);
                last_err = Some(e);
                sleep(Duration::from_millis(delay_ms.saturating_mul((i + 1) as u64)));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, format!("{what} failed"))))
}

/// Open a file with retries/backoff for transient errors.
pub fn open_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    with_backoff("open", tries, delay_ms, || File::open(path))
}

/// Create (truncate) a file with retries/backoff for transient errors.
pub fn create_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    with_backoff("create", tries, delay_ms, || File::create(path))
}

/// Size of a file on disk, 0 if it cannot be stat'ed.
pub fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
