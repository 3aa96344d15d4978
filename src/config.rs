use crate::compression::{resolve_compression, CompressionInfo};
use crate::error::PipelineError;
use std::path::PathBuf;

/// What to do when a file fails mid-read (I/O or decompression error).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReadErrorPolicy {
    /// Cancel the whole run and return the first error.
    #[default]
    Abort,
    /// Log the file as failed, keep the lines it already produced, go on.
    SkipFile,
}

/// Where handler output goes: `shards` files named `{prefix}{NNN}{ext}`.
#[derive(Clone, Debug)]
pub struct OutputOptions {
    pub prefix: PathBuf,
    pub shards: usize,
    pub compression: String, // "none" | "gzip" | "zstd"
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self { prefix: PathBuf::from("out-"), shards: 5, compression: "none".to_string() }
    }
}

/// Run options with builder chaining. Validation happens once, up front.
#[derive(Clone, Debug)]
pub struct PipelineOptions {
    pub workers: usize,
    pub in_split: usize,        // ranges per input file
    pub min_block_size: u64,    // floor for a range's length
    pub log_every: u64,         // progress cadence, in lines
    pub line_capacity: Option<usize>,   // None = workers
    pub record_capacity: Option<usize>, // None = output shards
    pub output: Option<OutputOptions>,
    pub on_read_error: ReadErrorPolicy,
    pub progress: bool,

    // IO tuning
    pub read_buffer_bytes: usize,
    pub write_buffer_bytes: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            workers: 32,
            in_split: 8,
            min_block_size: 4 * 1024,
            log_every: 100_000,
            line_capacity: None,
            record_capacity: None,
            output: None,
            on_read_error: ReadErrorPolicy::Abort,
            progress: false,
            read_buffer_bytes: 256 * 1024,
            write_buffer_bytes: 256 * 1024,
        }
    }
}

impl PipelineOptions {
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }
    pub fn with_in_split(mut self, n: usize) -> Self {
        self.in_split = n;
        self
    }
    pub fn with_min_block_size(mut self, bytes: u64) -> Self {
        self.min_block_size = bytes;
        self
    }
    pub fn with_log_every(mut self, lines: u64) -> Self {
        self.log_every = lines;
        self
    }
    pub fn with_line_capacity(mut self, cap: usize) -> Self {
        self.line_capacity = Some(cap);
        self
    }
    pub fn with_record_capacity(mut self, cap: usize) -> Self {
        self.record_capacity = Some(cap);
        self
    }
    pub fn with_output(mut self, prefix: impl Into<PathBuf>, shards: usize, compression: impl Into<String>) -> Self {
        self.output = Some(OutputOptions { prefix: prefix.into(), shards, compression: compression.into() });
        self
    }
    pub fn with_read_error_policy(mut self, policy: ReadErrorPolicy) -> Self {
        self.on_read_error = policy;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }

    // IO buffers tuning
    pub fn with_io_buffers(mut self, read_bytes: usize, write_bytes: usize) -> Self {
        self.read_buffer_bytes = read_bytes.max(8 * 1024);
        self.write_buffer_bytes = write_bytes.max(8 * 1024);
        self
    }

    /// Bounded capacity of the shared line channel.
    pub fn line_capacity(&self) -> usize {
        self.line_capacity.unwrap_or(self.workers).max(1)
    }

    /// Bounded capacity of the shared output-record channel.
    pub fn record_capacity(&self) -> usize {
        let shards = self.output.as_ref().map(|o| o.shards).unwrap_or(1);
        self.record_capacity.unwrap_or(shards).max(1)
    }

    /// Check every knob and resolve the output compression. Nothing is
    /// opened or spawned before this succeeds.
    pub fn validate(&self) -> Result<Option<CompressionInfo>, PipelineError> {
        if self.workers == 0 {
            return Err(PipelineError::invalid("worker count must be >= 1"));
        }
        if self.in_split == 0 {
            return Err(PipelineError::invalid("in-split must be >= 1"));
        }
        if self.log_every == 0 {
            return Err(PipelineError::invalid("log interval must be >= 1"));
        }
        match &self.output {
            None => Ok(None),
            Some(out) => {
                if out.shards == 0 {
                    return Err(PipelineError::invalid("out-split must be >= 1"));
                }
                resolve_compression(&out.compression).map(Some)
            }
        }
    }
}
