#[path = "common/mod.rs"]
mod common;

use common::{read_shard, write_text};
use linefan::{BuiltinHandler, Pipeline, PipelineOptions, RunReport};
use regex::Regex;
use std::path::Path;

fn run_builtin(input: &Path, out_prefix: &Path, handler: BuiltinHandler) -> (RunReport, Vec<String>) {
    let opts = PipelineOptions::default()
        .with_workers(2)
        .with_in_split(2)
        .with_min_block_size(1)
        .with_output(out_prefix, 1, "none");
    let report = Pipeline::new(opts).run(&[input], |_| handler.clone()).unwrap();
    let mut lines = read_shard(&report.shards[0].path);
    lines.sort();
    (report, lines)
}

/// kv splits at the first TAB only: a TAB inside the value is kept, and a
/// line without any TAB is counted as bad.
#[test]
fn kv_keeps_tabs_inside_the_value() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("kv.tsv");
    write_text(&input, "key\tval\twith-tab\nno-tab-here\nk2\tv2\n");

    let (report, values) = run_builtin(&input, &tmp.path().join("v-"), BuiltinHandler::Kv { without_key: true });
    assert_eq!(report.bad, 1);
    assert_eq!(report.errors.get("Number of tokens != 2"), Some(&1));
    assert_eq!(values, vec!["v2", "val\twith-tab"]);

    let (report, pairs) = run_builtin(&input, &tmp.path().join("kv-"), BuiltinHandler::Kv { without_key: false });
    assert_eq!(report.bad, 1);
    assert_eq!(pairs, vec!["k2\tv2", "key\tval\twith-tab"]);
}

/// grep drops non-matching lines without counting them as failures.
#[test]
fn grep_filters_without_errors() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("log.txt");
    write_text(&input, "ERROR one\ninfo two\nERROR three\ndebug four\n");

    let re = Regex::new("^ERROR").unwrap();
    let (report, lines) = run_builtin(&input, &tmp.path().join("g-"), BuiltinHandler::Grep(re));
    assert_eq!(report.lines_handled, 4);
    assert_eq!(report.bad, 0);
    assert_eq!(lines, vec!["ERROR one", "ERROR three"]);
}

#[test]
fn copy_passes_lines_through() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("c.txt");
    write_text(&input, "b\na\nc\n");

    let (report, lines) = run_builtin(&input, &tmp.path().join("c-"), BuiltinHandler::Copy);
    assert_eq!(report.records_written, 3);
    assert_eq!(lines, vec!["a", "b", "c"]);
}
