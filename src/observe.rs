//! Injected observation hooks. The pipeline never logs through globals; it
//! reports to an [`Observer`] handed in by the caller.

use crate::split::ByteRange;
use crate::tally::Tally;
use std::path::Path;
use std::time::Duration;

/// Progress callbacks. Every method defaults to a no-op, so implementors pick
/// what they care about. Calls arrive concurrently from many threads.
pub trait Observer: Send + Sync {
    fn range_started(&self, _file: usize, _range_index: usize, _range: ByteRange) {}

    /// Called every `log_every` lines emitted by one range reader.
    fn lines_read(&self, _file: usize, _range_index: usize, _lines: u64) {}

    fn range_finished(&self, _file: usize, _range_index: usize, _lines: u64) {}

    fn file_finished(&self, _file: usize, _path: &Path, _lines: u64) {}

    /// Called every `log_every` lines handled by one worker.
    fn lines_handled(&self, _worker: usize, _lines: u64) {}

    fn worker_finished(&self, _worker: usize, _tally: &Tally, _elapsed: Duration) {}
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

/// Structured `tracing` events for every hook.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn range_started(&self, file: usize, range_index: usize, range: ByteRange) {
        tracing::debug!(file, range = range_index, begin = range.begin, end = range.end, "range started");
    }

    fn lines_read(&self, file: usize, range_index: usize, lines: u64) {
        tracing::info!(file, range = range_index, lines, "reading");
    }

    fn range_finished(&self, file: usize, range_index: usize, lines: u64) {
        tracing::debug!(file, range = range_index, lines, "range finished");
    }

    fn file_finished(&self, file: usize, path: &Path, lines: u64) {
        tracing::info!(file, path = %path.display(), lines, "file loaded");
    }

    fn lines_handled(&self, worker: usize, lines: u64) {
        tracing::info!(worker, lines, "handling");
    }

    fn worker_finished(&self, worker: usize, tally: &Tally, elapsed: Duration) {
        tracing::info!(worker, lines = tally.lines, bad = tally.bad, ?elapsed, "worker finished");
    }
}
