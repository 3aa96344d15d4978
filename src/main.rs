use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use linefan::{init_tracing_once, BuiltinHandler, Pipeline, PipelineOptions, ReadErrorPolicy};
use regex::Regex;
use std::path::PathBuf;

/// Built-in per-line handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Emit every line unchanged.
    Copy,
    /// Emit lines matching --pattern.
    Grep,
    /// Expect `{key}\t{value}`; lines without a TAB are counted as bad.
    Kv,
}

/// Split large line files into byte ranges, fan the lines out to workers,
/// and shard the results into output files.
#[derive(Parser, Debug)]
#[command(name = "linefan", author, version, about, long_about = None)]
struct Args {
    /// Files (or directories of files) to load. `.gz`, `.bz2` and `.zst`
    /// inputs are decoded as a single stream.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Number of worker threads handling lines.
    #[arg(long, default_value_t = 32)]
    worker: usize,

    /// Number of range readers per input file.
    #[arg(long, default_value_t = 8)]
    in_split: usize,

    /// Smallest byte range a reader is given.
    #[arg(long, default_value_t = 4096)]
    min_block: u64,

    /// path/to/prefix-of-file- for output shards; no output when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Number of output files.
    #[arg(long, default_value_t = 5)]
    out_split: usize,

    /// Output compression: gzip | zstd | none.
    #[arg(long, default_value = "none")]
    compress: String,

    #[arg(long, value_enum, default_value_t = Mode::Copy)]
    mode: Mode,

    /// Regular expression for --mode grep.
    #[arg(long)]
    pattern: Option<String>,

    /// --mode kv: write only the value, not `{key}\t{value}`.
    #[arg(long)]
    without_key: bool,

    /// Log progress every N lines per reader and per worker.
    #[arg(long, default_value_t = 100_000)]
    log_every: u64,

    /// Keep going when an input fails mid-read instead of aborting.
    #[arg(long)]
    skip_bad_files: bool,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// Also write the run report as JSON here.
    #[arg(long)]
    report_json: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing_once();

    let handler = match args.mode {
        Mode::Copy => BuiltinHandler::Copy,
        Mode::Grep => {
            let pattern = args.pattern.as_deref().context("--pattern is required with --mode grep")?;
            BuiltinHandler::Grep(Regex::new(pattern).with_context(|| format!("invalid --pattern {pattern:?}"))?)
        }
        Mode::Kv => BuiltinHandler::Kv { without_key: args.without_key },
    };

    let policy = if args.skip_bad_files { ReadErrorPolicy::SkipFile } else { ReadErrorPolicy::Abort };
    let mut opts = PipelineOptions::default()
        .with_workers(args.worker)
        .with_in_split(args.in_split)
        .with_min_block_size(args.min_block)
        .with_log_every(args.log_every)
        .with_read_error_policy(policy)
        .with_progress(args.progress);
    if let Some(out) = &args.out {
        opts = opts.with_output(out, args.out_split, args.compress.as_str());
    }

    // The summary line is logged by the run itself.
    let report = Pipeline::new(opts).run(&args.files, |_| handler.clone())?;

    if let Some(path) = &args.report_json {
        report.write_json(path)?;
    }
    Ok(())
}
