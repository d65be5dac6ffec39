//! # Ironstream
//!
//! Streams typed JSON records out of files, directory trees, manifests and
//! glob patterns, decompressing transparently along the way, either as one
//! ordered sequence or concurrently on a worker pool.
//!
//! ## Key Features
//!
//! - **Flexible inputs** - a file, a directory (recursive, filtered by
//!   extension), a `.list` manifest of paths, or a glob pattern
//! - **Transparent compression** - gzip, zstd, bzip2 and xz picked by file
//!   extension, plus user-registered codecs
//! - **Continuous byte stream** - [`MultiReader`] chains many files so a decoder
//!   never sees a file boundary
//! - **Incremental decoding** - [`RecordStreamer`] pulls one record at a time;
//!   records may be newline-delimited or back-to-back
//! - **Parallel decoding** - a fixed worker pool feeding one bounded channel,
//!   with cancellation (feature: `parallel-io`)
//!
//! ## Quick Start
//!
//! ```no_run
//! use ironstream::*;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Event { id: u64, kind: String }
//!
//! # fn main() -> ironstream::Result<()> {
//! // Every .json/.jsonl file under data/, compressed or not, in a stable order.
//! let mut events = RecordStreamer::<Event>::open_jsonl("data/")?;
//! while let Some(event) = events.next_record()? {
//!     println!("{} {}", event.id, event.kind);
//! }
//!
//! // Or all at once.
//! let all: Vec<Event> = read_jsonl_vec("data/")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Input Resolution
//!
//! [`resolve`] turns one input into an ordered list of files:
//!
//! - a directory is walked depth-first with entries sorted by name; dotfiles,
//!   dot-directories and symbolic links are skipped
//! - an existing file ending in `.list` is read as one path per line
//! - with [`ResolveOptions::with_glob`], a missing path containing `*`, `?` or
//!   `[` is expanded as a glob
//! - any other missing path is [`Error::NotFound`]
//! - anything else is taken as the single file to read
//!
//! ## Parallel Decoding
//!
//! ```no_run
//! # #[cfg(feature = "parallel-io")]
//! # fn main() -> ironstream::Result<()> {
//! use ironstream::*;
//!
//! let opts = ParallelOptions::default().with_workers(8);
//! let mut run = stream_jsonl_parallel::<serde_json::Value>(
//!     "logs/*.json.gz",
//!     &ResolveOptions::jsonl().with_glob(true),
//!     &opts,
//! )?;
//! for item in run.by_ref() {
//!     match item {
//!         Ok(value) => println!("{value}"),
//!         Err(e) => eprintln!("skipped: {e}"),
//!     }
//! }
//! let summary = run.join()?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "parallel-io"))]
//! # fn main() {}
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel-io` (default) - the worker-pool pipeline in [`io::parallel`]
//! - `compression-gzip`, `compression-zstd`, `compression-bzip2`,
//!   `compression-xz` (all default) - built-in codecs
//!
//! ## Module Overview
//!
//! - [`io`] - resolution, compression, chained reading, decoding and the pool
//! - [`error`] - the crate [`Error`] type
//! - [`testing`] - fixtures and assertions for tests

pub mod error;
pub mod io;
pub mod testing;

// General re-exports
pub use error::{Error, Result};
pub use io::compression::{CompressionCodec, FinishWrite, register_codec};
pub use io::jsonl::{
    JsonlWriter, RecordStreamer, read_json, read_json_file, read_jsonl_vec, write_json,
    write_json_file, write_jsonl_vec,
};
pub use io::multi::MultiReader;
pub use io::resolve::{PathSpec, ResolveOptions, resolve};

// Gated re-exports
#[cfg(feature = "parallel-io")]
pub use io::parallel::{
    CancelToken, ParallelOptions, ParallelRun, RunSummary, read_jsonl_parallel,
    stream_jsonl_parallel,
};
