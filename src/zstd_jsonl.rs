//! Chunked zstd decompression and line framing.
//!
//! `FrameReader` pulls fixed-size chunks of decompressed bytes, decodes them to UTF-8
//! (retrying across chunk boundaries that split a character), and reassembles
//! newline-terminated logical lines. Each line is paired with the number of compressed
//! bytes consumed so far, which drives progress reporting.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use zstd::stream::read::Decoder;

use crate::error::FilterError;
use crate::util::open_with_backoff;

/// 128 MiB of decompressed text per read.
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 27;
/// Allow frames that need up to a 2 GiB window.
pub const DEFAULT_WINDOW_LOG_MAX: u32 = 31;
/// Give up on a chunk boundary after 1 GiB of undecodable accumulation.
pub const DEFAULT_RETRY_CEILING: u64 = 1 << 30;

/// Tuning knobs for `FrameReader`.
#[derive(Clone, Copy, Debug)]
pub struct FrameOptions {
    pub chunk_size: usize,
    pub window_log_max: u32,
    pub retry_ceiling: u64,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            window_log_max: DEFAULT_WINDOW_LOG_MAX,
            retry_ceiling: DEFAULT_RETRY_CEILING,
        }
    }
}

impl FrameOptions {
    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes.max(1);
        self
    }
    pub fn with_window_log_max(mut self, log: u32) -> Self {
        self.window_log_max = log;
        self
    }
    pub fn with_retry_ceiling(mut self, bytes: u64) -> Self {
        self.retry_ceiling = bytes;
        self
    }
}

/// A `Read` wrapper that counts compressed bytes read.
struct CountingReader<R: Read> {
    inner: R,
    counter: Arc<AtomicU64>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.counter.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

/// Lazy, non-restartable sequence of `(line, compressed_bytes_consumed)` pairs.
///
/// Lines are trimmed of surrounding whitespace. A trailing segment that is never
/// terminated by `\n` is discarded at end of stream. After the first error the
/// iterator yields `None`.
pub struct FrameReader<R: Read> {
    decoder: Decoder<'static, BufReader<CountingReader<R>>>,
    consumed: Arc<AtomicU64>,
    opts: FrameOptions,
    carry: String,
    ready: VecDeque<String>,
    offset: u64,
    done: bool,
}

impl FrameReader<File> {
    /// Open a `.zst` archive from disk.
    pub fn open(path: &Path, opts: FrameOptions) -> Result<Self, FilterError> {
        let file = open_with_backoff(path, 16, 50)?;
        Self::new(file, opts)
    }
}

impl<R: Read> FrameReader<R> {
    pub fn new(source: R, opts: FrameOptions) -> Result<Self, FilterError> {
        let consumed = Arc::new(AtomicU64::new(0));
        let cnt = CountingReader { inner: source, counter: consumed.clone() };
        let mut decoder = Decoder::new(cnt)?;
        decoder.window_log_max(opts.window_log_max)?;
        Ok(Self {
            decoder,
            consumed,
            opts,
            carry: String::new(),
            ready: VecDeque::new(),
            offset: 0,
            done: false,
        })
    }

    /// Compressed bytes pulled from the source so far.
    pub fn bytes_consumed(&self) -> u64 {
        self.consumed.load(Ordering::Relaxed)
    }

    /// Read up to one chunk of decompressed bytes. Empty means end of stream.
    fn read_chunk(&mut self, into: &mut Vec<u8>) -> Result<usize, FilterError> {
        let before = into.len();
        (&mut self.decoder)
            .take(self.opts.chunk_size as u64)
            .read_to_end(into)
            .map_err(FilterError::Frame)?;
        Ok(into.len() - before)
    }

    /// Read one chunk and decode it to text, pulling more chunks while the tail is not
    /// valid UTF-8. Returns `None` at end of stream.
    ///
    /// Each byte is validated once: after a failed attempt only the bytes past the
    /// valid prefix are checked again, together with the newly read chunk.
    fn read_and_decode(&mut self) -> Result<Option<String>, FilterError> {
        let mut buf = Vec::new();
        let mut bytes_read = self.read_chunk(&mut buf)? as u64;
        if bytes_read == 0 {
            return Ok(None);
        }

        // `buf[..checked]` is known to be valid UTF-8 and ends on a char boundary.
        let mut checked = 0;
        loop {
            match std::str::from_utf8(&buf[checked..]) {
                Ok(_) => {
                    // SAFETY: `buf[..checked]` and `buf[checked..]` were both just validated,
                    // and `checked` is a char boundary, so all of `buf` is valid UTF-8.
                    return Ok(Some(unsafe { String::from_utf8_unchecked(buf) }));
                }
                Err(e) => {
                    checked += e.valid_up_to();
                    if bytes_read > self.opts.retry_ceiling {
                        return Err(FilterError::Decode { bytes_read });
                    }
                    tracing::info!("Decoding error with {} bytes, reading another chunk", bytes_read);
                    let n = self.read_chunk(&mut buf)?;
                    if n == 0 {
                        return Err(FilterError::Decode { bytes_read });
                    }
                    bytes_read += n as u64;
                }
            }
        }
    }

    fn fill(&mut self) -> Result<bool, FilterError> {
        while self.ready.is_empty() {
            let chunk = match self.read_and_decode()? {
                Some(c) => c,
                None => {
                    if !self.carry.trim().is_empty() {
                        tracing::debug!(bytes = self.carry.len(), "Discarding unterminated trailing line");
                    }
                    self.carry.clear();
                    return Ok(false);
                }
            };
            self.offset = self.bytes_consumed();

            let mut joined = std::mem::take(&mut self.carry);
            joined.push_str(&chunk);
            let mut parts = joined.split('\n');
            let mut last = parts.next().unwrap_or_default();
            for next in parts {
                self.ready.push_back(last.trim().to_string());
                last = next;
            }
            self.carry = last.to_string();
        }
        Ok(true)
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<(String, u64), FilterError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.fill() {
            Ok(true) => self.ready.pop_front().map(|line| Ok((line, self.offset))),
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Convenience: read every logical line of an archive. Meant for small files and tests.
pub fn read_all_lines(path: &Path, opts: FrameOptions) -> Result<Vec<String>, FilterError> {
    FrameReader::open(path, opts)?
        .map(|r| r.map(|(line, _)| line))
        .collect()
}
