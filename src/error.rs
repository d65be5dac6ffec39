//! Error type shared by every reader, writer and the parallel pipeline.
//!
//! End of a record sequence is never an error: streamers return `Ok(None)`.
//! Errors raised below a [`std::io::Read`] boundary (opening a member file,
//! decompressing it) travel inside a [`std::io::Error`] and are recovered with
//! their original variant by the decoder layer.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// An input path (or a member named by a manifest) does not exist.
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Any other filesystem failure: permissions, stat, walk, read, write.
    #[error("io error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The input looked like a glob pattern but could not be parsed as one.
    #[error("invalid glob pattern: {pattern}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// A compressed member is corrupt or truncated.
    #[error("corrupt {codec} stream in {}", path.display())]
    Decompression {
        path: PathBuf,
        codec: String,
        #[source]
        source: io::Error,
    },

    /// A record could not be decoded.
    #[error("malformed record in {origin}")]
    Decode {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// A record stream was read again after it reported an error.
    #[error("record stream {origin} already failed")]
    Failed { origin: String },

    /// A record could not be encoded on the write side.
    #[error("serialize record to {}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The worker pool could not be started or one of its threads panicked.
    #[error("worker pool: {0}")]
    Pool(String),
}

impl Error {
    /// Map a filesystem error on `path` to `NotFound` or `Io`.
    pub(crate) fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        if source.kind() == io::ErrorKind::NotFound {
            Error::NotFound { path }
        } else {
            Error::Io { path, source }
        }
    }

    /// Path the error refers to, when there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::NotFound { path }
            | Error::Io { path, .. }
            | Error::Decompression { path, .. }
            | Error::Encode { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Wrap this error so it can cross a `Read` implementation unchanged.
    pub(crate) fn into_io(self) -> io::Error {
        let kind = match &self {
            Error::NotFound { .. } => io::ErrorKind::NotFound,
            Error::Io { source, .. } | Error::Decompression { source, .. } => source.kind(),
            Error::Decode { .. } | Error::Encode { .. } => io::ErrorKind::InvalidData,
            Error::Pattern { .. } => io::ErrorKind::InvalidInput,
            Error::Failed { .. } | Error::Pool(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, self)
    }

    /// Recover an error wrapped by [`Error::into_io`]; anything else goes
    /// through `untagged`.
    pub(crate) fn from_io(err: io::Error, untagged: impl FnOnce(io::Error) -> Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<Error>()) {
            return untagged(err);
        }
        match err.into_inner().map(|inner| inner.downcast::<Error>()) {
            Some(Ok(tagged)) => *tagged,
            Some(Err(inner)) => untagged(io::Error::other(inner)),
            None => untagged(io::Error::other("empty io error payload")),
        }
    }
}
