//! Reads the lines owned by one byte range.
//!
//! Ownership rule: a range emits every line that *starts* in
//! `(begin, end + 1]`, plus the line at offset 0 for the first range. So a
//! range that does not begin at 0 drops its first read (the tail of a line
//! the previous range finishes), and every range keeps reading until it has
//! consumed the line starting at `end + 1`.

use crate::error::PipelineError;
use crate::observe::Observer;
use crate::split::ByteRange;
use crossbeam_channel::Sender;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Destination for emitted lines.
pub trait LineSink: Sync {
    /// Blocks while the sink is full. `Err` means nobody is consuming anymore.
    fn emit(&self, line: String) -> Result<(), PipelineError>;
}

impl LineSink for Sender<String> {
    fn emit(&self, line: String) -> Result<(), PipelineError> {
        self.send(line).map_err(|_| PipelineError::Aborted("line channel closed".to_string()))
    }
}

/// Everything a range read needs besides the range and its source.
pub struct RangeReader<'a> {
    /// Index of the input file, for observation only.
    pub file: usize,
    pub path: &'a Path,
    pub log_every: u64,
    pub buffer_bytes: usize,
    pub sink: &'a dyn LineSink,
    pub observer: &'a dyn Observer,
    /// Raised when another unit failed; readers stop at the next line.
    pub cancel: &'a AtomicBool,
}

impl RangeReader<'_> {
    /// Open a private handle via `open`, seek to `range.begin` and emit the
    /// lines this range owns. Returns the number of lines emitted.
    pub fn read_range<R, F>(&self, index: usize, range: ByteRange, open: F) -> Result<u64, PipelineError>
    where
        R: Read + Seek,
        F: FnOnce() -> io::Result<R>,
    {
        let mut src = open().map_err(|source| PipelineError::Open { path: self.path.to_path_buf(), source })?;
        src.seek(SeekFrom::Start(range.begin)).map_err(|source| self.read_error(range, source))?;
        let reader = BufReader::with_capacity(self.buffer_bytes.max(8 * 1024), src);
        self.read_lines(index, range, reader)
    }

    /// Emit every line of a stream that cannot be split (compressed input).
    pub fn read_stream<R: BufRead>(&self, index: usize, reader: R) -> Result<u64, PipelineError> {
        self.read_lines(index, ByteRange::whole_stream(), reader)
    }

    fn read_lines<R: BufRead>(&self, index: usize, range: ByteRange, mut reader: R) -> Result<u64, PipelineError> {
        self.observer.range_started(self.file, index, range);

        let log_every = self.log_every.max(1);
        let drop_first = range.begin != 0;
        let mut first = true;
        let mut pos = range.begin;
        let mut lines = 0u64;
        let mut buf = Vec::with_capacity(8 * 1024);

        loop {
            if pos > range.end + 1 || self.cancel.load(Ordering::Relaxed) {
                break;
            }
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf).map_err(|source| self.read_error(range, source))?;
            if n == 0 {
                break;
            }
            pos += n as u64;

            if first {
                first = false;
                if drop_first {
                    continue;
                }
            }

            trim_line_end(&mut buf);
            self.sink.emit(into_text(&mut buf))?;
            lines += 1;
            if lines % log_every == 0 {
                self.observer.lines_read(self.file, index, lines);
            }
        }

        self.observer.range_finished(self.file, index, lines);
        Ok(lines)
    }

    fn read_error(&self, range: ByteRange, source: io::Error) -> PipelineError {
        PipelineError::Read { path: self.path.to_path_buf(), range, source }
    }
}

/// Strip `\n` and one preceding `\r`.
fn trim_line_end(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
}

/// Invalid UTF-8 is replaced rather than failing the run.
fn into_text(buf: &mut Vec<u8>) -> String {
    match String::from_utf8(std::mem::take(buf)) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}
