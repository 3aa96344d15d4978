//! Terminal progress: a count-style bar of handled lines, driven through the
//! [`Observer`] hooks.

use crate::observe::{Observer, TracingObserver};
use crate::split::ByteRange;
use crate::tally::Tally;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

fn new_count_bar(total: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} {msg} {pos} lines  it/s: {per_sec}  elapsed: {elapsed_precise}",
    ) {
        pb.set_style(style);
    }
    if !label.is_empty() {
        pb.set_message(label.to_string());
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Shows handled lines on a spinner bar; everything is also forwarded to
/// [`TracingObserver`].
pub struct ProgressObserver {
    pb: ProgressBar,
    // Last count each worker reported; the bar advances by the difference.
    reported: Vec<AtomicU64>,
    inner: TracingObserver,
}

impl ProgressObserver {
    pub fn new(label: &str, workers: usize) -> Self {
        Self {
            pb: new_count_bar(0, label),
            reported: (0..workers).map(|_| AtomicU64::new(0)).collect(),
            inner: TracingObserver,
        }
    }

    fn advance(&self, worker: usize, lines: u64) {
        if let Some(slot) = self.reported.get(worker) {
            let prev = slot.swap(lines, Ordering::Relaxed);
            self.pb.inc(lines.saturating_sub(prev));
        }
    }

    pub fn finish<T: Into<String>>(&self, msg: T) {
        self.pb.finish_with_message(msg.into());
    }
}

impl Observer for ProgressObserver {
    fn range_started(&self, file: usize, range_index: usize, range: ByteRange) {
        self.inner.range_started(file, range_index, range);
    }

    fn lines_read(&self, file: usize, range_index: usize, lines: u64) {
        self.pb.suspend(|| self.inner.lines_read(file, range_index, lines));
    }

    fn range_finished(&self, file: usize, range_index: usize, lines: u64) {
        self.inner.range_finished(file, range_index, lines);
    }

    fn file_finished(&self, file: usize, path: &Path, lines: u64) {
        self.pb.suspend(|| self.inner.file_finished(file, path, lines));
    }

    fn lines_handled(&self, worker: usize, lines: u64) {
        self.advance(worker, lines);
    }

    fn worker_finished(&self, worker: usize, tally: &Tally, elapsed: Duration) {
        self.advance(worker, tally.lines);
        self.pb.suspend(|| self.inner.worker_finished(worker, tally, elapsed));
    }
}
