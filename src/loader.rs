//! One file: plan its ranges, read them concurrently, report the line total.

use crate::compression::{decorate_reader, InputEncoding};
use crate::error::PipelineError;
use crate::observe::Observer;
use crate::range_reader::{LineSink, RangeReader};
use crate::split::SplitPlanner;
use crate::util::open_with_backoff;
use crossbeam_channel::bounded;
use std::fs;
use std::io::{self, BufReader, Read, Seek};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::thread;

/// Splits one input into ranges and runs a reader thread per range.
///
/// The loader never closes the sink: several loaders share it, and only the
/// ingestion coordinator knows when all of them are done.
pub struct SplitFileLoader<'a> {
    pub planner: SplitPlanner,
    pub split_count: usize,
    pub log_every: u64,
    pub buffer_bytes: usize,
    pub observer: &'a dyn Observer,
    pub cancel: &'a AtomicBool,
}

impl SplitFileLoader<'_> {
    /// Load a file from disk. Compressed files are decoded as one stream.
    pub fn load_file(&self, file: usize, path: &Path, sink: &dyn LineSink) -> Result<u64, PipelineError> {
        let encoding = InputEncoding::from_path(path);
        if encoding.is_splittable() {
            let size = fs::metadata(path)
                .map_err(|source| PipelineError::Open { path: path.to_path_buf(), source })?
                .len();
            return self.load_source(file, path, size, || open_with_backoff(path, 16, 50), sink);
        }

        let open_err = |source: io::Error| PipelineError::Open { path: path.to_path_buf(), source };
        let raw = open_with_backoff(path, 16, 50).map_err(open_err)?;
        let decoded = decorate_reader(encoding, raw).map_err(open_err)?;
        let lines = self
            .range_reader(file, path, sink)
            .read_stream(0, BufReader::with_capacity(self.buffer_bytes.max(8 * 1024), decoded))?;
        self.observer.file_finished(file, path, lines);
        Ok(lines)
    }

    /// Load `size` bytes from any seekable source. `open` is called once per
    /// range so that every reader owns a private seek position.
    pub fn load_source<R, F>(
        &self,
        file: usize,
        path: &Path,
        size: u64,
        open: F,
        sink: &dyn LineSink,
    ) -> Result<u64, PipelineError>
    where
        R: Read + Seek,
        F: Fn() -> io::Result<R> + Sync,
    {
        if size == 0 {
            self.observer.file_finished(file, path, 0);
            return Ok(0);
        }

        let ranges = self.planner.plan(self.split_count, size)?;
        tracing::debug!(file, path = %path.display(), size, ranges = ranges.len(), "planned");

        let (done_tx, done_rx) = bounded::<Result<u64, PipelineError>>(ranges.len());
        let outcome = thread::scope(|s| {
            for (index, range) in ranges.iter().copied().enumerate() {
                let done_tx = done_tx.clone();
                let open = &open;
                s.spawn(move || {
                    let res = self.range_reader(file, path, sink).read_range(index, range, open);
                    let _ = done_tx.send(res);
                });
            }
            drop(done_tx);

            let mut total = 0u64;
            let mut first_err = None;
            for _ in 0..ranges.len() {
                match done_rx.recv() {
                    Ok(Ok(n)) => total += n,
                    Ok(Err(e)) => {
                        first_err.get_or_insert(e);
                    }
                    Err(_) => return Err(PipelineError::WorkerLost("range reader")),
                }
            }
            match first_err {
                Some(e) => Err(e),
                None => Ok(total),
            }
        })?;

        self.observer.file_finished(file, path, outcome);
        Ok(outcome)
    }

    fn range_reader<'b>(&'b self, file: usize, path: &'b Path, sink: &'b dyn LineSink) -> RangeReader<'b> {
        RangeReader {
            file,
            path,
            log_every: self.log_every,
            buffer_bytes: self.buffer_bytes,
            sink,
            observer: self.observer,
            cancel: self.cancel,
        }
    }
}
