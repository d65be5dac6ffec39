//! One continuous byte stream over an ordered list of files.
//!
//! [`MultiReader`] opens its members lazily, one at a time and in order,
//! decompressing each according to its extension. Crossing from one member to
//! the next happens inside a single `read` call, so callers never observe a
//! boundary: `Ok(0)` is returned exactly when the last member is exhausted, and
//! on every call after that.

use crate::error::{Error, Result};
use crate::io::compression::open_file;
use crate::io::resolve::{ResolveOptions, resolve};
use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::trace;

struct Member {
    path: PathBuf,
    reader: Box<dyn Read + Send>,
}

/// Sequential reader over many, possibly compressed, files.
///
/// Invariant: `current` is `Some` only while a member is being drained, and
/// `next` is the index of the member to open once it is `None`.
pub struct MultiReader {
    files: Vec<PathBuf>,
    next: usize,
    current: Option<Member>,
}

impl MultiReader {
    /// Reader over `files`, in the given order. Nothing is opened yet.
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            next: 0,
            current: None,
        }
    }

    /// Resolve `path` (file, directory, manifest or glob) and read the result.
    pub fn open(path: impl AsRef<Path>, opts: &ResolveOptions) -> Result<Self> {
        Ok(Self::new(resolve(path, opts)?))
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Member currently being drained, if any.
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|m| m.path.as_path())
    }

    /// Number of members opened so far.
    pub fn position(&self) -> usize {
        self.next
    }

    /// Release the open member and forget the file list.
    ///
    /// Later reads return `Ok(0)` without touching the filesystem. Calling
    /// `close` more than once is harmless.
    pub fn close(&mut self) {
        if let Some(member) = self.current.take() {
            trace!(path = %member.path.display(), "closing member");
        }
        self.files = Vec::new();
        self.next = 0;
    }
}

impl Read for MultiReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let member = match &mut self.current {
                Some(member) => member,
                slot @ None => {
                    let Some(path) = self.files.get(self.next) else {
                        return Ok(0);
                    };
                    let reader = open_file(path).map_err(Error::into_io)?;
                    trace!(path = %path.display(), index = self.next, "opened member");
                    self.next += 1;
                    slot.insert(Member {
                        path: path.clone(),
                        reader,
                    })
                }
            };

            match member.reader.read(buf) {
                Ok(0) => {
                    if let Some(done) = self.current.take() {
                        trace!(path = %done.path.display(), "member exhausted");
                    }
                    if self.next >= self.files.len() {
                        return Ok(0);
                    }
                }
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => return Err(e),
                Err(e) => {
                    self.current = None;
                    return Err(e);
                }
            }
        }
    }
}

impl fmt::Debug for MultiReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiReader")
            .field("files", &self.files)
            .field("next", &self.next)
            .field("current", &self.current_path())
            .finish()
    }
}
