use crate::error::PipelineError;
use anyhow::{Context, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;
use walkdir::WalkDir;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

// -------- open/create with backoff --------

/// Transient errors worth another attempt: sharing/lock violations on
/// Windows, descriptor exhaustion on unix.
fn is_retriable_io_error(e: &io::Error) -> bool {
    match e.raw_os_error() {
        //   5   = Access is denied (often AV/share)
        //   32  = Sharing violation
        //   33  = Lock violation
        //   1224= File with a user-mapped section open
        Some(5) | Some(32) | Some(33) | Some(1224) => cfg!(windows),
        //   23/24 = ENFILE/EMFILE
        Some(23) | Some(24) => cfg!(unix),
        _ => false,
    }
}

fn with_backoff<T>(tries: usize, delay_ms: u64, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut last_err: Option<io::Error> = None;
    for i in 0..tries.max(1) {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if is_retriable_io_error(&e) => {
                tracing::debug!(attempt = i + 1, error = %e, "transient I/O error, retrying");
                last_err = Some(e);
                sleep(Duration::from_millis(delay_ms.saturating_mul((i + 1) as u64)));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "retries exhausted")))
}

/// Open a file for reading, retrying transient failures with linear backoff.
pub fn open_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    with_backoff(tries, delay_ms, || File::open(path))
}

/// Create (truncate) a file, retrying transient failures with linear backoff.
pub fn create_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    with_backoff(tries, delay_ms, || File::create(path))
}

// -------- input discovery --------

/// Expand directories into the regular files below them (sorted per
/// directory); plain paths pass through unchanged and in order.
pub fn expand_inputs<P: AsRef<Path>>(inputs: &[P]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::with_capacity(inputs.len());
    for input in inputs {
        let input = input.as_ref();
        let meta = std::fs::metadata(input)
            .map_err(|source| PipelineError::Open { path: input.to_path_buf(), source })?;
        if !meta.is_dir() {
            files.push(input.to_path_buf());
            continue;
        }
        let mut found = Vec::new();
        for entry in WalkDir::new(input).min_depth(1) {
            let entry = entry.with_context(|| format!("walk {}", input.display()))?;
            if entry.file_type().is_file() {
                found.push(entry.into_path());
            }
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}
