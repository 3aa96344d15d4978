//! Sharded output: O writer threads drain the shared record channel, each into
//! its own (optionally compressed) file.

use crate::cleanup::CleanupStack;
use crate::compression::{resolve_compression, CompressionInfo, EncodedWriter};
use crate::error::PipelineError;
use crate::util::create_with_backoff;
use crossbeam_channel::Receiver;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type ShardOutput = EncodedWriter<BufWriter<File>>;

/// `{prefix}{index:03}{ext}`, e.g. `out-007.gz`.
pub fn shard_path(prefix: &Path, index: usize, compression: CompressionInfo) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(format!("{:03}", index));
    name.push(compression.ext);
    PathBuf::from(name)
}

#[derive(Clone, Debug, Serialize)]
pub struct ShardStats {
    pub path: PathBuf,
    pub records: u64,
}

/// Running shard writers. Close the record channel (drop every sender), then
/// [`ShardedWriterPool::wait`]; only then is the output complete on disk.
pub struct ShardedWriterPool {
    handles: Vec<JoinHandle<Result<ShardStats, PipelineError>>>,
    paths: Vec<PathBuf>,
}

impl ShardedWriterPool {
    /// Create every shard file up front, then start one writer per shard.
    /// If any shard cannot be created, the files made so far are removed and
    /// nothing is started.
    pub fn start(
        shards: usize,
        prefix: &Path,
        compression: &str,
        records: Receiver<String>,
        write_buffer_bytes: usize,
        cancel: Arc<AtomicBool>,
    ) -> Result<Self, PipelineError> {
        if shards == 0 {
            return Err(PipelineError::invalid("out-split must be >= 1"));
        }
        let info = resolve_compression(compression)?;

        let mut rollback = CleanupStack::new();
        let mut outputs: Vec<(PathBuf, ShardOutput)> = Vec::with_capacity(shards);
        for i in 0..shards {
            let path = shard_path(prefix, i, info);
            let create_err = |source: io::Error| PipelineError::Create { path: path.clone(), source };

            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir).map_err(create_err)?;
            }
            let file = create_with_backoff(&path, 16, 50).map_err(create_err)?;
            let created = path.clone();
            rollback.push(move || {
                let _ = fs::remove_file(&created);
            });

            let out = EncodedWriter::new(info.kind, BufWriter::with_capacity(write_buffer_bytes.max(8 * 1024), file))
                .map_err(create_err)?;
            outputs.push((path, out));
        }
        rollback.disarm();

        let paths = outputs.iter().map(|(p, _)| p.clone()).collect();
        let handles = outputs
            .into_iter()
            .enumerate()
            .map(|(index, (path, out))| {
                let records = records.clone();
                let cancel = Arc::clone(&cancel);
                thread::spawn(move || write_shard(index, path, out, records, &cancel))
            })
            .collect();

        Ok(Self { handles, paths })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Block until every shard writer has drained the channel and closed its file.
    pub fn wait(self) -> Result<Vec<ShardStats>, PipelineError> {
        let mut stats = Vec::with_capacity(self.handles.len());
        let mut first_err = None;
        for handle in self.handles {
            match handle.join() {
                Ok(Ok(s)) => stats.push(s),
                Ok(Err(e)) => {
                    first_err.get_or_insert(e);
                }
                Err(_) => {
                    first_err.get_or_insert(PipelineError::WorkerLost("shard writer"));
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }
}

fn write_shard(
    index: usize,
    path: PathBuf,
    mut out: ShardOutput,
    records: Receiver<String>,
    cancel: &AtomicBool,
) -> Result<ShardStats, PipelineError> {
    let write_err = |source: io::Error| PipelineError::Write { path: path.clone(), source };

    let mut written = 0u64;
    for record in records.iter() {
        let res = out.write_all(record.as_bytes()).and_then(|_| out.write_all(b"\n"));
        if let Err(e) = res {
            tracing::error!(shard = index, path = %path.display(), error = %e, "shard write failed");
            cancel.store(true, Ordering::Relaxed);
            return Err(write_err(e));
        }
        written += 1;
    }

    // Release in reverse order of acquisition: encoder, buffer, file.
    let buffered = out.finish().map_err(write_err)?;
    let file = buffered.into_inner().map_err(|e| write_err(e.into_error()))?;
    drop(file);

    tracing::debug!(shard = index, path = %path.display(), records = written, "shard closed");
    Ok(ShardStats { path, records: written })
}
