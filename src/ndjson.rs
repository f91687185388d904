use crate::util::open_with_backoff;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Buffered line reader. Strips trailing `\r?\n`.
pub struct NdjsonReader<R: Read> {
    rdr: BufReader<R>,
}

impl NdjsonReader<File> {
    pub fn open(path: &Path, buf_bytes: usize) -> io::Result<Self> {
        let f = open_with_backoff(path, 16, 50)?;
        Ok(Self::new(f, buf_bytes))
    }
}

impl<R: Read> NdjsonReader<R> {
    pub fn new(inner: R, buf_bytes: usize) -> Self {
        Self { rdr: BufReader::with_capacity(buf_bytes.max(8 * 1024), inner) }
    }

    /// Read the next line into `buf`. Returns the number of bytes read (0 on EOF).
    pub fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        buf.clear();
        let n = self.rdr.read_line(buf)?;
        if n == 0 { return Ok(0); }
        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') { buf.pop(); }
        }
        Ok(n)
    }
}

/// Buffered `\n`-terminated line writer used by the text outputs.
pub struct NdjsonWriter<W: Write> {
    w: BufWriter<W>,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(inner: W, buf_bytes: usize) -> Self {
        Self { w: BufWriter::with_capacity(buf_bytes.max(8 * 1024), inner) }
    }

    #[inline]
    pub fn write_line(&mut self, s: &str) -> io::Result<()> {
        self.w.write_all(s.as_bytes())?;
        self.w.write_all(b"\n")
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        self.w.into_inner().map_err(|e| e.into_error())
    }
}
