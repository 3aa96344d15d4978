use crate::config::PipelineOptions;
use crate::error::PipelineError;
use crate::ingest::Ingestion;
use crate::observe::{Observer, TracingObserver};
use crate::progress::ProgressObserver;
use crate::util::{create_with_backoff, expand_inputs, init_tracing_once};
use crate::workers::{run_workers, LineHandler};
use crate::writer::{ShardStats, ShardedWriterPool};
use anyhow::{Context, Result};
use crossbeam_channel::bounded;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Aggregate outcome of one run.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub started_at: String,
    pub elapsed_ms: u64,
    #[serde(skip)]
    pub elapsed: Duration,
    /// Lines produced by the range readers.
    pub lines_read: u64,
    /// Lines that reached a handler.
    pub lines_handled: u64,
    pub succeeded: u64,
    pub bad: u64,
    pub records_written: u64,
    pub per_file: Vec<(PathBuf, u64)>,
    pub failed_files: Vec<(PathBuf, String)>,
    pub shards: Vec<ShardStats>,
    pub errors: BTreeMap<String, u64>,
}

impl RunReport {
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let f = create_with_backoff(path, 16, 50).with_context(|| format!("create {}", path.display()))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, self)?;
        w.write_all(b"\n")?;
        w.flush()?;
        Ok(())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lines: {}, Got: {}, Bad: {}, Elapsed: {:?}, Errors: {:?}",
            self.lines_read, self.lines_handled, self.bad, self.elapsed, self.errors
        )
    }
}

/// One configured run: inputs → range readers → workers → shard writers.
#[derive(Clone)]
pub struct Pipeline {
    opts: PipelineOptions,
    observer: Option<Arc<dyn Observer>>,
}

impl Pipeline {
    pub fn new(opts: PipelineOptions) -> Self {
        Self { opts, observer: None }
    }

    /// Replace the default observer (tracing, or a progress bar when enabled).
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.opts
    }

    /// Run every line of `inputs` through a handler built per worker by `factory`.
    ///
    /// Configuration and setup errors (bad options, missing inputs, uncreatable
    /// shards) are returned before any thread starts.
    pub fn run<P, F, H>(&self, inputs: &[P], factory: F) -> Result<RunReport>
    where
        P: AsRef<Path>,
        F: Fn(usize) -> H + Sync,
        H: LineHandler,
    {
        init_tracing_once();
        let opts = &self.opts;
        opts.validate()?;

        let files = expand_inputs(inputs)?;
        if files.is_empty() {
            return Err(PipelineError::invalid("no input files").into());
        }
        tracing::info!(files = files.len(), workers = opts.workers, in_split = opts.in_split, "starting run");

        let started_at = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
        let clock = Instant::now();
        let cancel = Arc::new(AtomicBool::new(false));

        let bar = if opts.progress && self.observer.is_none() {
            Some(Arc::new(ProgressObserver::new("Handling", opts.workers)))
        } else {
            None
        };
        let observer: Arc<dyn Observer> = match (&self.observer, &bar) {
            (Some(o), _) => Arc::clone(o),
            (None, Some(b)) => Arc::clone(b) as Arc<dyn Observer>,
            (None, None) => Arc::new(TracingObserver),
        };

        let (record_tx, writers) = match &opts.output {
            Some(out) => {
                let (tx, rx) = bounded::<String>(opts.record_capacity());
                let pool = ShardedWriterPool::start(
                    out.shards,
                    &out.prefix,
                    &out.compression,
                    rx,
                    opts.write_buffer_bytes,
                    Arc::clone(&cancel),
                )?;
                (Some(tx), Some(pool))
            }
            None => (None, None),
        };

        let (lines_rx, ingestion) = Ingestion::start(files, opts, Arc::clone(&observer), Arc::clone(&cancel));
        let tally = run_workers(opts.workers, lines_rx, record_tx, factory, opts.log_every, &*observer, &cancel);

        // The record channel closed when the workers returned; wait for the flush.
        let shards = writers.map(ShardedWriterPool::wait).transpose();
        let ingest = ingestion.join();

        if let Some(b) = &bar {
            b.finish("done");
        }

        let shards = shards?.unwrap_or_default();
        let ingest = ingest?;
        let tally = tally?;

        let elapsed = clock.elapsed();
        let report = RunReport {
            started_at,
            elapsed_ms: elapsed.as_millis() as u64,
            elapsed,
            lines_read: ingest.lines,
            lines_handled: tally.lines,
            succeeded: tally.succeeded(),
            bad: tally.bad,
            records_written: shards.iter().map(|s| s.records).sum(),
            per_file: ingest.per_file,
            failed_files: ingest.failed_files,
            shards,
            errors: tally.sorted_errors(),
        };
        tracing::info!("{}", report);
        Ok(report)
    }
}
