//! Glob expansion for inputs that name no existing path.
//!
//! ```no_run
//! use ironstream::io::glob::expand_glob;
//!
//! let files = expand_glob("logs/*.json.gz")?;
//! let partitions = expand_glob("events/day=*/part-*.jsonl")?;
//! # Ok::<(), ironstream::Error>(())
//! ```

use crate::error::{Error, Result};
use glob::glob;
use std::path::PathBuf;

/// Whether `s` contains a glob metacharacter.
pub fn looks_like_glob(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// Expand a glob pattern into a sorted vector of matching regular files.
///
/// Supports the usual syntax: `*`, `?`, `**`, `[abc]` and `[!abc]`. Matches are
/// sorted lexicographically; directories are skipped. An empty result is not an
/// error here, see [`expand_glob_required`].
///
/// # Errors
///
/// [`Error::Pattern`] for a malformed pattern, [`Error::Io`] when a directory
/// along the way cannot be read.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob(pattern).map_err(|source| Error::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut result = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            Error::io(path, e.into())
        })?;
        if path.is_file() {
            result.push(path);
        }
    }

    result.sort();
    Ok(result)
}

/// Expand a glob pattern, treating zero matches as [`Error::NotFound`].
pub fn expand_glob_required(pattern: &str) -> Result<Vec<PathBuf>> {
    let files = expand_glob(pattern)?;
    if files.is_empty() {
        return Err(Error::NotFound {
            path: PathBuf::from(pattern),
        });
    }
    Ok(files)
}
