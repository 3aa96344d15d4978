#![allow(dead_code)]

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::thread::{self, JoinHandle};

use linefan::{NoopObserver, SplitFileLoader, SplitPlanner};

/// The nine-line fixture used by the end-to-end checks.
pub const NINE_LINES: &str = "1234\n5678\n9abc\ndefg\nhijk\nlmno\npqrs\ntuvw\nxyz!\n";

pub fn nine_lines_sorted() -> Vec<String> {
    let mut v: Vec<String> = NINE_LINES.lines().map(str::to_string).collect();
    v.sort();
    v
}

/// Write raw text to `path`, creating parent directories.
pub fn write_text(path: &Path, text: &str) {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).unwrap();
    }
    fs::write(path, text).unwrap();
}

pub fn write_gz(path: &Path, text: &str) {
    let f = File::create(path).unwrap();
    let mut enc = flate2::write::GzEncoder::new(f, flate2::Compression::default());
    enc.write_all(text.as_bytes()).unwrap();
    enc.finish().unwrap();
}

pub fn write_zst(path: &Path, text: &str) {
    let f = File::create(path).unwrap();
    let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
    enc.write_all(text.as_bytes()).unwrap();
    enc.finish().unwrap();
}

pub fn write_bz2(path: &Path, text: &str) {
    let f = File::create(path).unwrap();
    let mut enc = bzip2::write::BzEncoder::new(f, bzip2::Compression::default());
    enc.write_all(text.as_bytes()).unwrap();
    enc.finish().unwrap();
}

/// Read a shard back, decoding by its suffix.
pub fn read_shard(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    let name = path.to_string_lossy().to_string();
    let r: Box<dyn Read> = if name.ends_with(".gz") {
        Box::new(flate2::read::MultiGzDecoder::new(f))
    } else if name.ends_with(".zst") {
        Box::new(zstd::stream::read::Decoder::new(f).unwrap())
    } else {
        Box::new(f)
    };
    BufReader::new(r).lines().map(|l| l.unwrap()).collect()
}

/// Collect every line sent on a channel in a background thread.
pub fn collector() -> (Sender<String>, JoinHandle<Vec<String>>) {
    let (tx, rx): (Sender<String>, Receiver<String>) = unbounded();
    let handle = thread::spawn(move || rx.iter().collect());
    (tx, handle)
}

/// Split `text` into `split` ranges and read them concurrently from memory.
/// Returns the reported count and the emitted lines, sorted.
pub fn split_read(text: &str, split: usize, min_block: u64) -> (u64, Vec<String>) {
    let cancel = AtomicBool::new(false);
    let loader = SplitFileLoader {
        planner: SplitPlanner::new(min_block),
        split_count: split,
        log_every: 1000,
        buffer_bytes: 8 * 1024,
        observer: &NoopObserver,
        cancel: &cancel,
    };
    let (tx, handle) = collector();
    let count = loader
        .load_source(0, Path::new("memory"), text.len() as u64, || Ok(std::io::Cursor::new(text.as_bytes())), &tx)
        .unwrap();
    drop(tx);
    let mut lines = handle.join().unwrap();
    lines.sort();
    (count, lines)
}

/// What a plain sequential read of `text` yields, sorted.
pub fn sequential_sorted(text: &str) -> Vec<String> {
    let mut v: Vec<String> = BufReader::new(text.as_bytes()).lines().map(|l| l.unwrap()).collect();
    v.sort();
    v
}
