#[path = "common/mod.rs"]
mod common;

use common::{write_text, NINE_LINES};
use crossbeam_channel::{bounded, Sender};
use linefan::{
    LineSink, NoopObserver, Observer, Pipeline, PipelineError, PipelineOptions, RecordOut, SplitFileLoader, SplitPlanner,
};
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Counts lines that made it into the channel.
struct CountingSink {
    tx: Sender<String>,
    sent: Arc<AtomicU64>,
}

impl LineSink for CountingSink {
    fn emit(&self, line: String) -> Result<(), PipelineError> {
        self.tx.send(line).map_err(|_| PipelineError::Aborted("closed".to_string()))?;
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// With a capacity-1 channel and nobody consuming, concurrent range readers
/// block instead of buffering the file in memory.
#[test]
fn readers_block_on_full_line_channel() {
    let text: String = (0..200).map(|i| format!("line-{i:03}\n")).collect();
    let (tx, rx) = bounded::<String>(1);
    let sent = Arc::new(AtomicU64::new(0));
    let sink = CountingSink { tx, sent: Arc::clone(&sent) };

    let loader_text = text.clone();
    let loader = thread::spawn(move || {
        let cancel = AtomicBool::new(false);
        let loader = SplitFileLoader {
            planner: SplitPlanner::new(16),
            split_count: 4,
            log_every: 1000,
            buffer_bytes: 8 * 1024,
            observer: &NoopObserver,
            cancel: &cancel,
        };
        let size = loader_text.len() as u64;
        loader.load_source(0, Path::new("memory"), size, || Ok(Cursor::new(loader_text.as_bytes())), &sink)
    });

    thread::sleep(Duration::from_millis(200));
    assert!(sent.load(Ordering::SeqCst) <= 1, "readers ran ahead of the consumer");

    let mut got = 0u64;
    while got < 200 {
        rx.recv_timeout(Duration::from_secs(10)).unwrap();
        got += 1;
    }
    let n = loader.join().unwrap().unwrap();
    assert_eq!(n, 200);
    assert_eq!(sent.load(Ordering::SeqCst), 200);
}

/// One slow worker behind a capacity-1 channel still gets every line.
#[test]
fn slow_worker_with_tiny_channel_sees_every_line() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("nine.txt");
    write_text(&input, NINE_LINES);

    let handled = Arc::new(AtomicU64::new(0));
    let opts = PipelineOptions::default()
        .with_workers(1)
        .with_line_capacity(1)
        .with_in_split(3)
        .with_min_block_size(1);
    let counter = Arc::clone(&handled);
    let report = Pipeline::new(opts)
        .run(&[&input], move |_| {
            let counter = Arc::clone(&counter);
            move |_line: &str, _out: &mut RecordOut<'_>| -> anyhow::Result<()> {
                thread::sleep(Duration::from_millis(5));
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .unwrap();

    assert_eq!(report.lines_read, 9);
    assert_eq!(handled.load(Ordering::SeqCst), 9);
}

/// Counts every `lines_read` report; with `log_every(1)` that is one per
/// line handed to the line channel.
#[derive(Default)]
struct EmittedLines(AtomicU64);

impl Observer for EmittedLines {
    fn lines_read(&self, _file: usize, _range_index: usize, _lines: u64) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// While every worker is stuck in its handler, readers get at most one line
/// per worker plus the channel capacity ahead.
#[test]
fn blocked_workers_bound_lines_in_flight() {
    const WORKERS: usize = 2;
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("many.txt");
    let text: String = (0..500).map(|i| format!("row-{i:04}\n")).collect();
    write_text(&input, &text);

    let emitted = Arc::new(EmittedLines::default());
    let gate = Arc::new(Mutex::new(()));
    let held = gate.lock().unwrap();

    let opts = PipelineOptions::default()
        .with_workers(WORKERS)
        .with_line_capacity(1)
        .with_in_split(4)
        .with_min_block_size(1)
        .with_log_every(1);
    let pipeline = Pipeline::new(opts).with_observer(Arc::clone(&emitted) as Arc<dyn Observer>);
    let handler_gate = Arc::clone(&gate);
    let run = thread::spawn(move || {
        pipeline.run(&[&input], move |_| {
            let gate = Arc::clone(&handler_gate);
            move |_line: &str, _out: &mut RecordOut<'_>| -> anyhow::Result<()> {
                let _pass = gate.lock().unwrap();
                Ok(())
            }
        })
    });

    thread::sleep(Duration::from_millis(300));
    let ahead = emitted.0.load(Ordering::SeqCst);
    assert!(ahead <= 1 + WORKERS as u64, "{ahead} lines sent while handlers were blocked");

    drop(held);
    let report = run.join().unwrap().unwrap();
    assert_eq!(report.lines_read, 500);
    assert_eq!(report.lines_handled, 500);
    assert_eq!(emitted.0.load(Ordering::SeqCst), 500);
}
