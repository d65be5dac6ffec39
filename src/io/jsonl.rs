//! JSON record streams: typed decoding over any byte source, and the
//! matching writer.
//!
//! This module provides:
//! - **Pull-based decoding**: [`RecordStreamer`] over a single file, a
//!   [`MultiReader`], or any `Read`
//! - **Writing**: [`JsonlWriter`], one record per line, flushed per record
//! - **Whole-file helpers**: [`read_jsonl_vec`] / [`write_jsonl_vec`] and the
//!   one-document [`read_json_file`] / [`write_json_file`]
//!
//! # Notes
//! - Records are JSON values separated by optional whitespace, so both
//!   newline-delimited files and back-to-back objects decode.
//! - End of input is `Ok(None)`, never an error. Trailing partial data is a
//!   [`Error::Decode`].
//! - Compression follows the file extension on both sides; see
//!   [`compression`](crate::io::compression).

use crate::error::{Error, Result};
use crate::io::compression::{FinishWrite, create_file, open_file};
use crate::io::multi::MultiReader;
use crate::io::resolve::{ResolveOptions, resolve};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::de::IoRead;
use serde_json::{Deserializer, StreamDeserializer};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Incremental decoder yielding records of type `T` from a byte stream.
///
/// Records come out in stream order; over a [`MultiReader`] that is file-list
/// order, then order within each file.
///
/// ```no_run
/// use ironstream::io::jsonl::RecordStreamer;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Event { id: u64 }
///
/// # fn main() -> ironstream::Result<()> {
/// let mut events = RecordStreamer::<Event>::open_jsonl("data/events")?;
/// while let Some(event) = events.next_record()? {
///     println!("{}", event.id);
/// }
/// events.close();
/// # Ok(())
/// # }
/// ```
pub struct RecordStreamer<T, R: Read = Box<dyn Read + Send>> {
    records: StreamDeserializer<'static, IoRead<BufReader<R>>, T>,
    origin: String,
    state: State,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Open,
    Exhausted,
    Failed,
}

impl<T: DeserializeOwned> RecordStreamer<T> {
    /// Resolve `path` and decode every file it names, in order.
    ///
    /// A single resolved file is read directly; several are chained through a
    /// [`MultiReader`], opened lazily.
    pub fn open(path: impl AsRef<Path>, opts: &ResolveOptions) -> Result<Self> {
        let path = path.as_ref();
        let mut files = resolve(path, opts)?;
        if files.len() == 1 {
            let file = files.remove(0);
            let reader = open_file(&file)?;
            return Ok(Self::from_reader(reader, file.display().to_string()));
        }
        let origin = format!("{} ({} files)", path.display(), files.len());
        let reader: Box<dyn Read + Send> = Box::new(MultiReader::new(files));
        Ok(Self::from_reader(reader, origin))
    }

    /// [`open`](Self::open) accepting `.json` and `.jsonl` files in directories.
    pub fn open_jsonl(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, &ResolveOptions::jsonl())
    }
}

impl<T: DeserializeOwned, R: Read> RecordStreamer<T, R> {
    /// Decode records from `reader`; `origin` names it in error messages.
    pub fn from_reader(reader: R, origin: impl Into<String>) -> Self {
        Self {
            records: Deserializer::from_reader(BufReader::new(reader)).into_iter::<T>(),
            origin: origin.into(),
            state: State::Open,
        }
    }

    /// Decode the next record.
    ///
    /// Returns `Ok(None)` once the stream ends cleanly, and on every call after
    /// that.
    ///
    /// # Errors
    /// [`Error::Decode`] for malformed or truncated records; I/O and
    /// decompression failures keep their own variants. Every call after an
    /// error returns [`Error::Failed`], never `Ok(None)`.
    pub fn next_record(&mut self) -> Result<Option<T>> {
        match self.state {
            State::Open => {}
            State::Exhausted => return Ok(None),
            State::Failed => {
                return Err(Error::Failed {
                    origin: self.origin.clone(),
                });
            }
        }
        match self.records.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => {
                self.state = State::Failed;
                Err(self.convert(e))
            }
            None => {
                self.state = State::Exhausted;
                Ok(None)
            }
        }
    }

    /// Whether an earlier call returned an error.
    pub fn has_failed(&self) -> bool {
        self.state == State::Failed
    }

    /// Name of the source used in error messages.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Release the underlying stream.
    pub fn close(self) {
        debug!(origin = %self.origin, "closing record streamer");
    }

    fn convert(&self, err: serde_json::Error) -> Error {
        if err.is_io() {
            let io_err: io::Error = err.into();
            return Error::from_io(io_err, |source| Error::Io {
                path: PathBuf::from(&self.origin),
                source,
            });
        }
        Error::Decode {
            origin: self.origin.clone(),
            source: err,
        }
    }
}

/// Iteration stops after exhaustion or after the first error.
impl<T: DeserializeOwned, R: Read> Iterator for RecordStreamer<T, R> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_failed() {
            return None;
        }
        self.next_record().transpose()
    }
}

/// Writes records as JSON lines, compressing according to the extension.
///
/// Every [`write`](Self::write) serializes one record, appends `\n` and
/// flushes. [`close`](Self::close) must be called to finish compressed output
/// and observe its errors.
pub struct JsonlWriter {
    path: PathBuf,
    writer: Box<dyn FinishWrite>,
    written: usize,
}

impl JsonlWriter {
    /// Create `path`, making missing parent directories first.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let writer = create_file(path)?;
        debug!(path = %path.display(), "created writer");
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            written: 0,
        })
    }

    pub fn write<T: Serialize + ?Sized>(&mut self, record: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record).map_err(|e| {
            if e.is_io() {
                Error::io(&self.path, e.into())
            } else {
                Error::Encode {
                    path: self.path.clone(),
                    source: e,
                }
            }
        })?;
        self.writer
            .write_all(b"\n")
            .and_then(|()| self.writer.flush())
            .map_err(|e| Error::io(&self.path, e))?;
        self.written += 1;
        Ok(())
    }

    /// Records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Finish the stream (compression trailer included) and close the file.
    pub fn close(self) -> Result<()> {
        let Self { path, writer, .. } = self;
        writer.finish().map_err(|e| Error::io(&path, e))
    }
}

/// Read every record named by `path` into a `Vec`.
///
/// Directories contribute their `.json`/`.jsonl` (and compressed) files.
pub fn read_jsonl_vec<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    RecordStreamer::<T>::open_jsonl(path)?.collect()
}

/// Write `data` to `path` as JSON lines.
///
/// # Returns
/// The number of records written (`data.len()`).
pub fn write_jsonl_vec<T: Serialize>(path: impl AsRef<Path>, data: &[T]) -> Result<usize> {
    let mut w = JsonlWriter::create(path)?;
    for record in data {
        w.write(record)?;
    }
    let n = w.written();
    w.close()?;
    Ok(n)
}

/// Decode the first JSON document from `reader`; `Ok(None)` if it is empty.
pub fn read_json<T: DeserializeOwned, R: Read>(reader: R) -> Result<Option<T>> {
    RecordStreamer::<T, R>::from_reader(reader, "reader").next_record()
}

/// Encode one JSON document to `writer`, followed by a newline.
pub fn write_json<T: Serialize + ?Sized, W: Write>(mut writer: W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut writer, value).map_err(|source| Error::Encode {
        path: PathBuf::from("writer"),
        source,
    })?;
    writer
        .write_all(b"\n")
        .map_err(|e| Error::io("writer", e))
}

/// Decode the single JSON document stored in `path`.
///
/// An empty file yields `Ok(None)`.
pub fn read_json_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Option<T>> {
    let path = path.as_ref();
    let reader = open_file(path)?;
    RecordStreamer::<T>::from_reader(reader, path.display().to_string()).next_record()
}

/// Write `value` as the only document of `path`, creating parent directories.
pub fn write_json_file<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let mut w = JsonlWriter::create(path)?;
    w.write(value)?;
    w.close()
}
