mod cleanup;
mod compression;
mod config;
mod error;
mod split;
mod tally;

mod observe;
mod progress;
mod util;

mod range_reader;
mod loader;
mod ingest;
mod workers;
mod handlers;
mod writer;
mod pipeline;

pub use crate::config::{OutputOptions, PipelineOptions, ReadErrorPolicy};
pub use crate::error::PipelineError;
pub use crate::pipeline::{Pipeline, RunReport};
pub use crate::tally::Tally;

// Planner and the per-range reader, for callers that drive their own sources.
pub use crate::split::{ByteRange, SplitPlanner, DEFAULT_MIN_BLOCK_SIZE};
pub use crate::range_reader::{LineSink, RangeReader};
pub use crate::loader::SplitFileLoader;

// Fan-in / fan-out stages.
pub use crate::ingest::{IngestSummary, Ingestion};
pub use crate::workers::{run_workers, LineHandler, RecordOut};
pub use crate::handlers::BuiltinHandler;
pub use crate::writer::{shard_path, ShardStats, ShardedWriterPool};

// Compression names and filters.
pub use crate::compression::{
    decorate_reader, resolve_compression, CompressionInfo, CompressionKind, EncodedWriter, InputEncoding,
};

// Scoped release actions.
pub use crate::cleanup::CleanupStack;

// Observation hooks and progress display.
pub use crate::observe::{NoopObserver, Observer, TracingObserver};
pub use crate::progress::ProgressObserver;

// File helpers the binary uses.
pub use crate::util::{create_with_backoff, expand_inputs, init_tracing_once, open_with_backoff};
