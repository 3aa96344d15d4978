//! Fan-in: every input file feeds one bounded line channel.
//!
//! A single coordinator thread owns the sending half. Loaders only borrow it,
//! and it is dropped (closing the channel) after exactly one completion per
//! file has been received.

use crate::config::{PipelineOptions, ReadErrorPolicy};
use crate::error::PipelineError;
use crate::loader::SplitFileLoader;
use crate::observe::Observer;
use crate::split::SplitPlanner;
use crossbeam_channel::{bounded, unbounded, Receiver};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Per-run ingestion totals.
#[derive(Clone, Debug, Default, Serialize)]
pub struct IngestSummary {
    pub lines: u64,
    pub per_file: Vec<(PathBuf, u64)>,
    /// Files given up under [`ReadErrorPolicy::SkipFile`], with the reason.
    pub failed_files: Vec<(PathBuf, String)>,
}

/// Handle on the running ingestion; [`Ingestion::join`] yields the summary.
pub struct Ingestion {
    handle: JoinHandle<Result<IngestSummary, PipelineError>>,
}

impl Ingestion {
    /// Start one loader per file and return the consuming end of the line channel.
    pub fn start(
        files: Vec<PathBuf>,
        opts: &PipelineOptions,
        observer: Arc<dyn Observer>,
        cancel: Arc<AtomicBool>,
    ) -> (Receiver<String>, Ingestion) {
        let (line_tx, line_rx) = bounded::<String>(opts.line_capacity());
        let planner = SplitPlanner::new(opts.min_block_size);
        let split_count = opts.in_split;
        let log_every = opts.log_every;
        let buffer_bytes = opts.read_buffer_bytes;
        let policy = opts.on_read_error;

        let handle = thread::spawn(move || {
            let loader = SplitFileLoader {
                planner,
                split_count,
                log_every,
                buffer_bytes,
                observer: &*observer,
                cancel: &cancel,
            };
            let (done_tx, done_rx) = unbounded();

            let res = thread::scope(|s| {
                for (i, path) in files.iter().enumerate() {
                    let done_tx = done_tx.clone();
                    let loader = &loader;
                    let line_tx = &line_tx;
                    s.spawn(move || {
                        let _ = done_tx.send((i, loader.load_file(i, path, line_tx)));
                    });
                }
                drop(done_tx);

                let mut summary = IngestSummary::default();
                let mut first_err = None;
                for _ in 0..files.len() {
                    let (i, res) = done_rx.recv().map_err(|_| PipelineError::WorkerLost("file loader"))?;
                    match res {
                        Ok(n) => {
                            summary.lines += n;
                            summary.per_file.push((files[i].clone(), n));
                        }
                        Err(e) if policy == ReadErrorPolicy::SkipFile && first_err.is_none() => {
                            tracing::warn!(path = %files[i].display(), error = %e, "skipping file after read error");
                            summary.failed_files.push((files[i].clone(), e.to_string()));
                        }
                        Err(e) => {
                            if first_err.is_none() {
                                tracing::error!(path = %files[i].display(), error = %e, "aborting run");
                                cancel.store(true, Ordering::Relaxed);
                                first_err = Some(e);
                            }
                        }
                    }
                }
                match first_err {
                    Some(e) => Err(e),
                    None => Ok(summary),
                }
            });

            drop(line_tx);
            res
        });

        (line_rx, Ingestion { handle })
    }

    pub fn join(self) -> Result<IngestSummary, PipelineError> {
        self.handle.join().map_err(|_| PipelineError::WorkerLost("ingestion coordinator"))?
    }
}
