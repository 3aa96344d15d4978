//! Compression names, file suffixes, and the reader/writer filters behind them.
//!
//! Output compression is chosen by name (`none`, `gzip`, `zstd`) and adds a
//! fixed suffix to every shard file. Input compression is detected from the
//! file suffix (`.gz`, `.bz2`, `.zst`); compressed inputs are decoded as a
//! single stream because their byte offsets do not map to line offsets.

use crate::error::PipelineError;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::Path;

/// zstd level for shard output.
const ZSTD_LEVEL: i32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionKind {
    None,
    Gzip,
    Zstd,
}

/// Resolved output compression: the filter to apply plus the shard suffix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompressionInfo {
    pub kind: CompressionKind,
    pub ext: &'static str,
}

impl CompressionInfo {
    pub const NONE: CompressionInfo = CompressionInfo { kind: CompressionKind::None, ext: "" };
    pub const GZIP: CompressionInfo = CompressionInfo { kind: CompressionKind::Gzip, ext: ".gz" };
    pub const ZSTD: CompressionInfo = CompressionInfo { kind: CompressionKind::Zstd, ext: ".zst" };
}

/// Map a configuration name to its compression. Unknown names are an error.
pub fn resolve_compression(name: &str) -> Result<CompressionInfo, PipelineError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "" | "none" => Ok(CompressionInfo::NONE),
        "gzip" | "gz" => Ok(CompressionInfo::GZIP),
        "zstd" | "zst" => Ok(CompressionInfo::ZSTD),
        _ => Err(PipelineError::UnsupportedCompression(name.to_string())),
    }
}

/// A writer optionally wrapped in a compressing encoder.
///
/// `finish` peels the encoder off and returns the inner writer, so the
/// compressed trailer is always written before the file underneath is closed.
pub enum EncodedWriter<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
    Zstd(zstd::stream::write::Encoder<'static, W>),
}

impl<W: Write> EncodedWriter<W> {
    pub fn new(kind: CompressionKind, inner: W) -> io::Result<Self> {
        Ok(match kind {
            CompressionKind::None => EncodedWriter::Plain(inner),
            CompressionKind::Gzip => EncodedWriter::Gzip(GzEncoder::new(inner, Compression::default())),
            CompressionKind::Zstd => EncodedWriter::Zstd(zstd::stream::write::Encoder::new(inner, ZSTD_LEVEL)?),
        })
    }

    pub fn finish(self) -> io::Result<W> {
        match self {
            EncodedWriter::Plain(w) => Ok(w),
            EncodedWriter::Gzip(enc) => enc.finish(),
            EncodedWriter::Zstd(enc) => enc.finish(),
        }
    }
}

impl<W: Write> Write for EncodedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            EncodedWriter::Plain(w) => w.write(buf),
            EncodedWriter::Gzip(w) => w.write(buf),
            EncodedWriter::Zstd(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            EncodedWriter::Plain(w) => w.flush(),
            EncodedWriter::Gzip(w) => w.flush(),
            EncodedWriter::Zstd(w) => w.flush(),
        }
    }
}

/// Encoding of an input file, derived from its name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEncoding {
    Plain,
    Gzip,
    Bzip2,
    Zstd,
}

impl InputEncoding {
    pub fn from_path(path: &Path) -> Self {
        let name = path.file_name().map(|n| n.to_string_lossy().to_ascii_lowercase()).unwrap_or_default();
        if name.ends_with(".gz") {
            InputEncoding::Gzip
        } else if name.ends_with(".bz2") {
            InputEncoding::Bzip2
        } else if name.ends_with(".zst") {
            InputEncoding::Zstd
        } else {
            InputEncoding::Plain
        }
    }

    /// Only plain files can be split by byte offset.
    pub fn is_splittable(self) -> bool {
        self == InputEncoding::Plain
    }
}

/// Wrap a raw source with the decoder matching `encoding`.
pub fn decorate_reader<R: Read + Send + 'static>(encoding: InputEncoding, inner: R) -> io::Result<Box<dyn Read + Send>> {
    Ok(match encoding {
        InputEncoding::Plain => Box::new(inner),
        InputEncoding::Gzip => Box::new(MultiGzDecoder::new(inner)),
        InputEncoding::Bzip2 => Box::new(bzip2::read::MultiBzDecoder::new(inner)),
        InputEncoding::Zstd => {
            // Frames written with long-distance matching need more than the default window.
            let mut dec = zstd::stream::read::Decoder::new(inner)?;
            dec.window_log_max(31)?;
            Box::new(dec)
        }
    })
}
