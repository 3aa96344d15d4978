//! Fan-out: W workers drain the shared line channel and call a handler per line.

use crate::error::PipelineError;
use crate::observe::Observer;
use crate::tally::Tally;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

/// Per-line collaborator. One instance per worker, built by the pool's factory
/// on the worker's own thread, so it may hold non-`Send` state (a client, a buffer).
///
/// An `Err` is counted in the worker's [`Tally`] under its message; it never
/// stops the worker.
pub trait LineHandler {
    fn handle(&mut self, line: &str, out: &mut RecordOut<'_>) -> anyhow::Result<()>;
}

impl<F> LineHandler for F
where
    F: FnMut(&str, &mut RecordOut<'_>) -> anyhow::Result<()>,
{
    fn handle(&mut self, line: &str, out: &mut RecordOut<'_>) -> anyhow::Result<()> {
        self(line, out)
    }
}

/// Where a handler pushes its output records.
pub struct RecordOut<'a> {
    tx: Option<&'a Sender<String>>,
    pushed: u64,
    closed: bool,
}

impl<'a> RecordOut<'a> {
    pub(crate) fn new(tx: Option<&'a Sender<String>>) -> Self {
        Self { tx, pushed: 0, closed: false }
    }

    /// Queue one record for the shard writers, blocking while the channel is
    /// full. Without configured output the record is dropped.
    pub fn push(&mut self, record: impl Into<String>) -> Result<(), PipelineError> {
        let Some(tx) = self.tx else {
            return Ok(());
        };
        if tx.send(record.into()).is_err() {
            self.closed = true;
            return Err(PipelineError::Aborted("output writers are gone".to_string()));
        }
        self.pushed += 1;
        Ok(())
    }

    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Run `count` workers until the line channel is closed and drained, then fold
/// their tallies. Dropping `output` at the end closes the record channel.
pub fn run_workers<F, H>(
    count: usize,
    lines: Receiver<String>,
    output: Option<Sender<String>>,
    factory: F,
    log_every: u64,
    observer: &dyn Observer,
    cancel: &AtomicBool,
) -> Result<Tally, PipelineError>
where
    F: Fn(usize) -> H + Sync,
    H: LineHandler,
{
    let log_every = log_every.max(1);
    let (done_tx, done_rx) = bounded::<Tally>(count);

    let total = thread::scope(|s| {
        for worker in 0..count {
            let done_tx = done_tx.clone();
            let lines = &lines;
            let output = output.as_ref();
            let factory = &factory;
            s.spawn(move || {
                let started = Instant::now();
                let mut handler = factory(worker);
                let mut out = RecordOut::new(output);
                let mut tally = Tally::new();

                for line in lines.iter() {
                    if cancel.load(Ordering::Relaxed) {
                        break;
                    }
                    tally.lines += 1;
                    if let Err(e) = handler.handle(&line, &mut out) {
                        tally.add_error(e.to_string());
                    }
                    if tally.lines % log_every == 0 {
                        observer.lines_handled(worker, tally.lines);
                    }
                    if out.is_closed() {
                        cancel.store(true, Ordering::Relaxed);
                        break;
                    }
                }

                tracing::debug!(worker, records = out.pushed(), "worker output");
                observer.worker_finished(worker, &tally, started.elapsed());
                let _ = done_tx.send(tally);
            });
        }
        drop(done_tx);

        let mut total = Tally::new();
        for _ in 0..count {
            let part = done_rx.recv().map_err(|_| PipelineError::WorkerLost("worker"))?;
            total = total.combine(part);
        }
        Ok(total)
    });

    drop(output);
    drop(lines);
    total
}
