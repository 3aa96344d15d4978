//! Error types for the split/fan-out pipeline.

use crate::split::ByteRange;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions. Per-line handler failures never show up here; they are
/// counted in the run's [`Tally`](crate::Tally) instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Bad configuration or planner input, detected before any thread starts.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown compression type: {0}")]
    UnsupportedCompression(String),

    #[error("open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Mid-stream read or decompression failure inside one range.
    #[error("read {path} [{range}]: {source}")]
    Read {
        path: PathBuf,
        range: ByteRange,
        #[source]
        source: io::Error,
    },

    #[error("write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The run was cancelled because another unit failed first.
    #[error("aborted: {0}")]
    Aborted(String),

    /// A concurrent unit went away without reporting.
    #[error("{0} exited without reporting a result")]
    WorkerLost(&'static str),
}

impl PipelineError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
