#[path = "common/mod.rs"]
mod common;

use common::{collector, sequential_sorted, split_read, NINE_LINES};
use linefan::{ByteRange, NoopObserver, RangeReader};
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::AtomicBool;

/// Every split count from 1 to twice the byte length yields each line of the
/// nine-line fixture exactly once.
#[test]
fn nine_lines_any_split_count() {
    let expected = sequential_sorted(NINE_LINES);
    for split in 1..=(2 * NINE_LINES.len()) {
        let (count, lines) = split_read(NINE_LINES, split, 1);
        assert_eq!(count, 9, "split={split}");
        assert_eq!(lines, expected, "split={split}");
    }
}

/// Boundaries landing on `\r`, `\n`, empty lines and an unterminated tail.
#[test]
fn awkward_boundaries_lose_and_duplicate_nothing() {
    let inputs = [
        "a\r\nbb\r\n\r\nccc\r\n",
        "\n\n\nx\n\n",
        "one\ntwo\nthree-without-newline",
        "single line no newline",
        "\n",
        "x",
        "long-line-aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\nshort\n",
    ];
    for text in inputs {
        let expected = sequential_sorted(text);
        for split in 1..=(2 * text.len()) {
            let (count, lines) = split_read(text, split, 1);
            assert_eq!(count as usize, expected.len(), "text={text:?} split={split}");
            assert_eq!(lines, expected, "text={text:?} split={split}");
        }
    }
}

#[test]
fn empty_source_emits_nothing() {
    let (count, lines) = split_read("", 4, 1);
    assert_eq!(count, 0);
    assert!(lines.is_empty());
}

/// A range that does not start at 0 drops the partial line it lands in and
/// finishes the line that starts right after its end.
#[test]
fn single_range_owns_lines_starting_inside_it() {
    let cancel = AtomicBool::new(false);
    let (tx, handle) = collector();
    let reader = RangeReader {
        file: 0,
        path: Path::new("memory"),
        log_every: 1,
        buffer_bytes: 8 * 1024,
        sink: &tx,
        observer: &NoopObserver,
        cancel: &cancel,
    };
    // Bytes 2..=9 start inside "1234" and cover "5678"; "9abc" starts at
    // end + 1, so this range finishes it too.
    let n = reader
        .read_range(1, ByteRange::new(2, 9), || Ok(Cursor::new(NINE_LINES.as_bytes())))
        .unwrap();
    drop(tx);
    let lines = handle.join().unwrap();
    assert_eq!(n, 2);
    assert_eq!(lines, vec!["5678".to_string(), "9abc".to_string()]);
}

/// Invalid UTF-8 is replaced instead of failing the read.
#[test]
fn invalid_utf8_is_replaced() {
    let cancel = AtomicBool::new(false);
    let (tx, handle) = collector();
    let reader = RangeReader {
        file: 0,
        path: Path::new("memory"),
        log_every: 100,
        buffer_bytes: 8 * 1024,
        sink: &tx,
        observer: &NoopObserver,
        cancel: &cancel,
    };
    let bytes: &[u8] = b"ok\n\xff\xfebad\n";
    let n = reader.read_stream(0, bytes).unwrap();
    drop(tx);
    let lines = handle.join().unwrap();
    assert_eq!(n, 2);
    assert_eq!(lines[0], "ok");
    assert!(lines[1].ends_with("bad"));
    assert!(lines[1].contains('\u{FFFD}'));
}
