//! Turning one input path into an ordered list of files.
//!
//! An input is classified by [`PathSpec::classify`]:
//!
//! | input                                   | resolves to                        |
//! |-----------------------------------------|------------------------------------|
//! | a directory                             | filtered recursive walk            |
//! | an existing file ending in `.list`      | its non-empty lines, verbatim      |
//! | a missing path with `*`, `?` or `[`     | sorted glob matches, only with     |
//! |                                         | [`ResolveOptions::with_glob`]      |
//! | any other missing path                  | [`Error::NotFound`]                |
//! | anything else                           | the path itself                    |
//!
//! Directory walks are depth-first with the entries of every directory sorted
//! by file name, so the result is stable for a fixed directory snapshot.
//! Dotfiles (and everything below a dot-directory) and symbolic links are
//! skipped. A file is kept when its name carries a compressed extension, or
//! when no extensions were requested, or when its extension is one of the
//! requested ones.

use crate::error::{Error, Result};
use crate::io::compression::is_compressed;
use crate::io::glob::{expand_glob_required, looks_like_glob};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Extension (without the dot) marking a manifest file.
pub const MANIFEST_EXTENSION: &str = "list";

/// Extensions used by the JSON-lines convenience constructors.
pub const JSONL_EXTENSIONS: &[&str] = &[".json", ".jsonl"];

/// How an input path is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathSpec {
    SingleFile,
    Directory,
    Manifest,
    Glob,
}

impl PathSpec {
    /// Classify `path` from filesystem metadata and its extension only.
    ///
    /// A missing path is a glob only when `opts` enables glob expansion.
    ///
    /// # Errors
    /// [`Error::NotFound`] when the path is missing and is not treated as a
    /// glob pattern, [`Error::Io`] when it cannot be stat'ed.
    pub fn classify(path: impl AsRef<Path>, opts: &ResolveOptions) -> Result<Self> {
        let path = path.as_ref();
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound
                && opts.glob
                && looks_like_glob(&path.to_string_lossy()) =>
            {
                return Ok(PathSpec::Glob);
            }
            Err(e) => return Err(Error::io(path, e)),
        };
        if meta.is_dir() {
            Ok(PathSpec::Directory)
        } else if path.extension().is_some_and(|ext| ext == MANIFEST_EXTENSION) {
            Ok(PathSpec::Manifest)
        } else {
            Ok(PathSpec::SingleFile)
        }
    }
}

/// Options for [`resolve`].
///
/// Extensions are normalized to lowercase with a leading dot, so `"json"`,
/// `".json"` and `".JSON"` are the same entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    extensions: BTreeSet<String>,
    glob: bool,
}

impl ResolveOptions {
    /// Accept every non-hidden file in directory walks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `.json` and `.jsonl` files (plus compressed files) in walks.
    #[must_use]
    pub fn jsonl() -> Self {
        Self::new().with_extensions(JSONL_EXTENSIONS.iter().copied())
    }

    #[must_use]
    pub fn with_extension(mut self, ext: impl AsRef<str>) -> Self {
        let ext = ext.as_ref().trim_start_matches('.').to_lowercase();
        if !ext.is_empty() {
            self.extensions.insert(format!(".{ext}"));
        }
        self
    }

    #[must_use]
    pub fn with_extensions<I, S>(self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        exts.into_iter().fold(self, |opts, ext| opts.with_extension(ext))
    }

    /// Expand missing paths containing `*`, `?` or `[` as glob patterns.
    ///
    /// Off by default, so a missing path is always [`Error::NotFound`].
    #[must_use]
    pub fn with_glob(mut self, enabled: bool) -> Self {
        self.glob = enabled;
        self
    }

    pub fn glob_enabled(&self) -> bool {
        self.glob
    }

    /// Registered plain extensions, dot included.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    /// Whether a directory entry named `path` passes the extension filter.
    pub fn allows(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if self.extensions.is_empty() || is_compressed(path) {
            return true;
        }
        path.extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .is_some_and(|ext| self.extensions.contains(&ext))
    }
}

/// Resolve an input path into the ordered list of files it names.
///
/// Every call re-reads the filesystem; nothing is cached.
pub fn resolve(path: impl AsRef<Path>, opts: &ResolveOptions) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    let kind = PathSpec::classify(path, opts)?;
    let files = match kind {
        PathSpec::Directory => walk_dir(path, opts)?,
        PathSpec::Manifest => read_manifest(path)?,
        PathSpec::Glob => expand_glob_required(&path.to_string_lossy())?,
        PathSpec::SingleFile => vec![path.to_path_buf()],
    };
    debug!(input = %path.display(), ?kind, files = files.len(), "resolved input");
    Ok(files)
}

/// Walk `root` recursively and collect the files passing the filter.
pub fn walk_dir(root: impl AsRef<Path>, opts: &ResolveOptions) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| io::Error::other("filesystem loop"));
            Error::io(path, source)
        })?;
        if entry.path_is_symlink() || !entry.file_type().is_file() {
            continue;
        }
        if !opts.allows(entry.path()) {
            continue;
        }
        files.push(entry.into_path());
    }
    Ok(files)
}

/// Read a manifest: one path per line, blank lines ignored, no recursion.
///
/// Lines are kept verbatim apart from the `\n` or `\r\n` terminator, byte for
/// byte on unix; their extensions are not checked, a bad entry fails when it
/// is opened.
pub fn read_manifest(path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut files = Vec::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| Error::io(path, e))?;
        if n == 0 {
            break;
        }
        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        if line.is_empty() {
            continue;
        }
        files.push(manifest_entry(&line).map_err(|e| Error::io(path, e))?);
    }
    Ok(files)
}

#[cfg(unix)]
fn manifest_entry(bytes: &[u8]) -> io::Result<PathBuf> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    Ok(PathBuf::from(OsStr::from_bytes(bytes)))
}

#[cfg(not(unix))]
fn manifest_entry(bytes: &[u8]) -> io::Result<PathBuf> {
    std::str::from_utf8(bytes)
        .map(PathBuf::from)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
