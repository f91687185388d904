//! Error taxonomy: fatal run/file errors (`FilterError`) and per-line faults (`LineFault`).

use std::io;
use thiserror::Error;

/// Errors that stop a file (decode) or the whole run (config).
#[derive(Debug, Error)]
pub enum FilterError {
    /// Decompressed bytes are not valid UTF-8 even after growing the retry buffer.
    #[error("unable to decode frame after reading {bytes_read} bytes")]
    Decode { bytes_read: u64 },

    /// The zstd stream itself is corrupt or needs a larger window than allowed.
    #[error("zstd frame error: {0}")]
    Frame(#[source] io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl FilterError {
    pub fn config(msg: impl Into<String>) -> Self {
        FilterError::Config(msg.into())
    }

    /// True for errors that abort the current file because its stream cannot be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(self, FilterError::Decode { .. } | FilterError::Frame(_))
    }
}

/// Why a single line was counted as bad. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineFault {
    #[error("line decoding failed: {0}")]
    Parse(String),

    #[error("key {0} is not in the object")]
    Schema(String),
}

impl LineFault {
    pub fn is_parse(&self) -> bool {
        matches!(self, LineFault::Parse(_))
    }
}
