//! Temporary directories and sample records for I/O tests.

use crate::error::{Error, Result};
use crate::io::jsonl::write_jsonl_vec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A record that remembers which file it was generated for.
///
/// `(file, seq)` is unique across a fixture set, which makes ordering checks
/// straightforward.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleRecord {
    pub file: usize,
    pub seq: usize,
    pub name: String,
    pub tags: Vec<String>,
}

/// `count` records for file number `file`, with `seq` counting up from 0.
///
/// # Example
///
/// ```
/// use ironstream::testing::sample_records;
///
/// let recs = sample_records(2, 3);
/// assert_eq!(recs.len(), 3);
/// assert!(recs.iter().all(|r| r.file == 2));
/// assert_eq!(recs[1].seq, 1);
/// ```
#[must_use]
pub fn sample_records(file: usize, count: usize) -> Vec<SampleRecord> {
    (0..count)
        .map(|seq| SampleRecord {
            file,
            seq,
            name: format!("record-{file}-{seq}"),
            tags: (0..seq % 3).map(|t| format!("t{t}")).collect(),
        })
        .collect()
}

/// A temporary directory that is deleted when dropped.
///
/// Relative names passed to the `write_*` methods may contain `/`; missing
/// parent directories are created.
pub struct FixtureDir {
    dir: TempDir,
}

impl FixtureDir {
    /// Create a new empty directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> Result<Self> {
        let dir = TempDir::new().map_err(|e| Error::io(std::env::temp_dir(), e))?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `name` inside this directory. Nothing is created.
    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `records` as JSON lines, compressed if `name` has a codec
    /// extension.
    pub fn write_jsonl<T: Serialize>(&self, name: &str, records: &[T]) -> Result<PathBuf> {
        let path = self.file_path(name);
        write_jsonl_vec(&path, records)?;
        Ok(path)
    }

    /// Write `bytes` verbatim, whatever the extension.
    pub fn write_raw(&self, name: &str, bytes: impl AsRef<[u8]>) -> Result<PathBuf> {
        let path = self.file_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(&path, bytes).map_err(|e| Error::io(&path, e))?;
        Ok(path)
    }

    /// Write a manifest listing `entries`, one per line.
    pub fn write_manifest<P: AsRef<Path>>(&self, name: &str, entries: &[P]) -> Result<PathBuf> {
        let body: String = entries
            .iter()
            .map(|p| format!("{}\n", p.as_ref().display()))
            .collect();
        self.write_raw(name, body)
    }

    /// Create the directory `name` (and its parents).
    pub fn mkdir(&self, name: &str) -> Result<PathBuf> {
        let path = self.file_path(name);
        fs::create_dir_all(&path).map_err(|e| Error::io(&path, e))?;
        Ok(path)
    }
}
