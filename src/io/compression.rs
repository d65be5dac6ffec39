//! Pluggable compression support for transparent I/O.
//!
//! Every file this crate opens or creates passes through this module. A file
//! is compressed when its name ends with an extension claimed by a registered
//! [`CompressionCodec`]; the content itself is never sniffed, so `data.json`
//! is always read verbatim even if it happens to hold gzip bytes.
//!
//! ## Built-in Codecs
//!
//! When enabled via feature flags, the following codecs are available:
//! - **Gzip** (`.gz`, `.gzip`) - via `flate2` (feature: `compression-gzip`)
//! - **Zstd** (`.zst`, `.zstd`) - via `zstd` (feature: `compression-zstd`)
//! - **Bzip2** (`.bz2`, `.bzip2`) - via `bzip2` (feature: `compression-bzip2`)
//! - **Xz** (`.xz`) - via `xz2` (feature: `compression-xz`)
//!
//! ## Usage
//!
//! ```no_run
//! use ironstream::io::compression::{create_file, open_file};
//! use std::io::{Read, Write};
//! # fn main() -> ironstream::Result<()> {
//!
//! let mut out = create_file("out/data.json.gz")?;
//! out.write_all(b"{\"id\":1}\n").unwrap();
//! out.finish().unwrap();
//!
//! let mut text = String::new();
//! open_file("out/data.json.gz")?.read_to_string(&mut text).unwrap();
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Codecs
//!
//! ```
//! use ironstream::io::compression::{register_codec, CompressionCodec, FinishWrite};
//! use std::io::{BufWriter, Read, Write};
//! use std::sync::Arc;
//!
//! struct Identity;
//!
//! impl CompressionCodec for Identity {
//!     fn name(&self) -> &str { "identity" }
//!     fn extensions(&self) -> &[&str] { &[".ident"] }
//!     fn wrap_reader(&self, r: Box<dyn Read + Send>) -> std::io::Result<Box<dyn Read + Send>> {
//!         Ok(r)
//!     }
//!     fn wrap_writer(&self, w: Box<dyn Write + Send>) -> std::io::Result<Box<dyn FinishWrite>> {
//!         Ok(Box::new(BufWriter::new(w)))
//!     }
//! }
//!
//! register_codec(Arc::new(Identity));
//! assert!(ironstream::io::compression::is_compressed("x.json.ident"));
//! ```

use crate::error::{Error, Result};
use std::fs::{File, create_dir_all};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

/// Global codec registry for pluggable compression support.
static CODEC_REGISTRY: RwLock<Option<Vec<Arc<dyn CompressionCodec>>>> = RwLock::new(None);

/// Initialize the codec registry with built-in codecs.
fn init_registry() -> Vec<Arc<dyn CompressionCodec>> {
    vec![
        #[cfg(feature = "compression-gzip")]
        Arc::new(GzipCodec),
        #[cfg(feature = "compression-zstd")]
        Arc::new(ZstdCodec),
        #[cfg(feature = "compression-bzip2")]
        Arc::new(Bzip2Codec),
        #[cfg(feature = "compression-xz")]
        Arc::new(XzCodec),
    ]
}

/// Snapshot of the registered codecs, built-ins first.
fn registry() -> Vec<Arc<dyn CompressionCodec>> {
    if let Some(codecs) = CODEC_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
    {
        return codecs.clone();
    }
    let mut lock = CODEC_REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    lock.get_or_insert_with(init_registry).clone()
}

/// Register a custom compression codec globally.
///
/// Registered codecs are consulted after the built-in ones, so a custom codec
/// cannot shadow `.gz` and friends.
pub fn register_codec(codec: Arc<dyn CompressionCodec>) {
    let mut lock = CODEC_REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    lock.get_or_insert_with(init_registry).push(codec);
}

/// A writer whose stream must be explicitly terminated.
///
/// Compressed formats write a trailer when they finish; dropping an encoder
/// finishes it too but swallows any error, so [`JsonlWriter`](crate::io::jsonl::JsonlWriter)
/// always calls `finish`.
pub trait FinishWrite: Write + Send {
    /// Flush everything, write any trailer, and flush the underlying sink.
    fn finish(self: Box<Self>) -> io::Result<()>;
}

impl<W: Write + Send> FinishWrite for BufWriter<W> {
    fn finish(mut self: Box<Self>) -> io::Result<()> {
        self.flush()
    }
}

/// Pluggable compression codec trait.
///
/// Implementations must be `Send + Sync` as they live in a global registry
/// shared by every worker thread.
pub trait CompressionCodec: Send + Sync {
    /// Human-readable codec name (e.g., "gzip", "zstd").
    fn name(&self) -> &str;

    /// File extensions claimed by this codec, lowercase with the leading dot.
    fn extensions(&self) -> &[&str];

    /// Wrap a reader with decompression.
    fn wrap_reader(&self, reader: Box<dyn Read + Send>) -> io::Result<Box<dyn Read + Send>>;

    /// Wrap a writer with compression.
    fn wrap_writer(&self, writer: Box<dyn Write + Send>) -> io::Result<Box<dyn FinishWrite>>;
}

/// Codec claiming the path's extension, if any.
///
/// Matching is a case-insensitive suffix test, so `a.JSON.GZ` is gzip.
pub fn detect_codec(path: impl AsRef<Path>) -> Option<Arc<dyn CompressionCodec>> {
    let name = path.as_ref().to_string_lossy().to_lowercase();
    registry()
        .into_iter()
        .find(|codec| codec.extensions().iter().any(|ext| name.ends_with(ext)))
}

/// Whether `path` names a compressed file.
pub fn is_compressed(path: impl AsRef<Path>) -> bool {
    detect_codec(path).is_some()
}

/// Every extension claimed by a registered codec.
pub fn compressed_extensions() -> Vec<String> {
    registry()
        .iter()
        .flat_map(|codec| codec.extensions().iter().map(|ext| (*ext).to_string()))
        .collect()
}

/// Wrap `reader` with the decompressor matching `path`, or pass it through
/// behind a buffer.
///
/// Errors raised by the returned reader are tagged with `path`: corrupt
/// compressed data surfaces as [`Error::Decompression`], anything else as
/// [`Error::Io`]. `path` is only a hint; nothing is opened here.
pub fn wrap_reader<R: Read + Send + 'static>(
    reader: R,
    path: impl AsRef<Path>,
) -> Result<Box<dyn Read + Send>> {
    let path = path.as_ref();
    let Some(codec) = detect_codec(path) else {
        return Ok(Box::new(TaggedReader {
            inner: BufReader::new(reader),
            path: path.to_path_buf(),
            codec: None,
        }));
    };
    trace!(path = %path.display(), codec = codec.name(), "wrapping reader");
    let inner = codec
        .wrap_reader(Box::new(reader))
        .map_err(|source| Error::Decompression {
            path: path.to_path_buf(),
            codec: codec.name().to_string(),
            source,
        })?;
    Ok(Box::new(TaggedReader {
        inner,
        path: path.to_path_buf(),
        codec: Some(codec.name().to_string()),
    }))
}

/// Open `path` for reading, decompressing transparently.
///
/// The file handle and decoder are released together when the returned reader
/// is dropped.
pub fn open_file(path: impl AsRef<Path>) -> Result<Box<dyn Read + Send>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    wrap_reader(file, path)
}

/// Wrap `writer` with the compressor matching `path`, or a plain buffer.
pub fn wrap_writer<W: Write + Send + 'static>(
    writer: W,
    path: impl AsRef<Path>,
) -> Result<Box<dyn FinishWrite>> {
    let path = path.as_ref();
    match detect_codec(path) {
        Some(codec) => codec
            .wrap_writer(Box::new(writer))
            .map_err(|source| Error::io(path, source)),
        None => Ok(Box::new(BufWriter::new(writer))),
    }
}

/// Create `path` (and its missing parent directories) for writing, compressing
/// according to its extension.
pub fn create_file(path: impl AsRef<Path>) -> Result<Box<dyn FinishWrite>> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    wrap_writer(file, path)
}

/// Reader that attaches the source path (and codec) to every error.
struct TaggedReader<R> {
    inner: R,
    path: PathBuf,
    codec: Option<String>,
}

impl<R: Read> Read for TaggedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).map_err(|e| self.tag(e))
    }
}

impl<R> TaggedReader<R> {
    fn tag(&self, err: io::Error) -> io::Error {
        if err.kind() == io::ErrorKind::Interrupted
            || err.get_ref().is_some_and(|inner| inner.is::<Error>())
        {
            return err;
        }
        let corrupt = matches!(
            err.kind(),
            io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput | io::ErrorKind::UnexpectedEof
        );
        match &self.codec {
            Some(codec) if corrupt => Error::Decompression {
                path: self.path.clone(),
                codec: codec.clone(),
                source: err,
            }
            .into_io(),
            _ => Error::io(&self.path, err).into_io(),
        }
    }
}

// ============================================================================
// Built-in Codec Implementations
// ============================================================================

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for GzipCodec {
    fn name(&self) -> &str {
        "gzip"
    }

    fn extensions(&self) -> &[&str] {
        &[".gz", ".gzip"]
    }

    fn wrap_reader(&self, reader: Box<dyn Read + Send>) -> io::Result<Box<dyn Read + Send>> {
        // Concatenated members are one logical stream.
        use flate2::read::MultiGzDecoder;
        Ok(Box::new(MultiGzDecoder::new(reader)))
    }

    fn wrap_writer(&self, writer: Box<dyn Write + Send>) -> io::Result<Box<dyn FinishWrite>> {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        Ok(Box::new(GzEncoder::new(writer, Compression::default())))
    }
}

#[cfg(feature = "compression-gzip")]
impl<W: Write + Send> FinishWrite for flate2::write::GzEncoder<W> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let mut inner = flate2::write::GzEncoder::finish(*self)?;
        inner.flush()
    }
}

#[cfg(feature = "compression-zstd")]
struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
impl CompressionCodec for ZstdCodec {
    fn name(&self) -> &str {
        "zstd"
    }

    fn extensions(&self) -> &[&str] {
        &[".zst", ".zstd"]
    }

    fn wrap_reader(&self, reader: Box<dyn Read + Send>) -> io::Result<Box<dyn Read + Send>> {
        zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read + Send>)
    }

    fn wrap_writer(&self, writer: Box<dyn Write + Send>) -> io::Result<Box<dyn FinishWrite>> {
        zstd::stream::write::Encoder::new(writer, 3).map(|e| Box::new(e) as Box<dyn FinishWrite>)
    }
}

#[cfg(feature = "compression-zstd")]
impl<W: Write + Send> FinishWrite for zstd::stream::write::Encoder<'static, W> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let mut inner = zstd::stream::write::Encoder::finish(*self)?;
        inner.flush()
    }
}

#[cfg(feature = "compression-bzip2")]
struct Bzip2Codec;

#[cfg(feature = "compression-bzip2")]
impl CompressionCodec for Bzip2Codec {
    fn name(&self) -> &str {
        "bzip2"
    }

    fn extensions(&self) -> &[&str] {
        &[".bz2", ".bzip2"]
    }

    fn wrap_reader(&self, reader: Box<dyn Read + Send>) -> io::Result<Box<dyn Read + Send>> {
        use bzip2::read::MultiBzDecoder;
        Ok(Box::new(MultiBzDecoder::new(reader)))
    }

    fn wrap_writer(&self, writer: Box<dyn Write + Send>) -> io::Result<Box<dyn FinishWrite>> {
        use bzip2::Compression;
        use bzip2::write::BzEncoder;
        Ok(Box::new(BzEncoder::new(writer, Compression::default())))
    }
}

#[cfg(feature = "compression-bzip2")]
impl<W: Write + Send> FinishWrite for bzip2::write::BzEncoder<W> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let mut inner = bzip2::write::BzEncoder::finish(*self)?;
        inner.flush()
    }
}

#[cfg(feature = "compression-xz")]
struct XzCodec;

#[cfg(feature = "compression-xz")]
impl CompressionCodec for XzCodec {
    fn name(&self) -> &str {
        "xz"
    }

    fn extensions(&self) -> &[&str] {
        &[".xz"]
    }

    fn wrap_reader(&self, reader: Box<dyn Read + Send>) -> io::Result<Box<dyn Read + Send>> {
        use xz2::read::XzDecoder;
        Ok(Box::new(XzDecoder::new_multi_decoder(reader)))
    }

    fn wrap_writer(&self, writer: Box<dyn Write + Send>) -> io::Result<Box<dyn FinishWrite>> {
        use xz2::write::XzEncoder;
        Ok(Box::new(XzEncoder::new(writer, 6)))
    }
}

#[cfg(feature = "compression-xz")]
impl<W: Write + Send> FinishWrite for xz2::write::XzEncoder<W> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let mut inner = xz2::write::XzEncoder::finish(*self)?;
        inner.flush()
    }
}
