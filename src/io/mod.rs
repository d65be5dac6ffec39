//! Input resolution, decompression and record decoding.
//!
//! The layers stack bottom-up: [`resolve`] turns a path into an ordered file
//! list, [`compression`] opens each file with the right decoder, [`multi`]
//! chains files into one byte stream, and [`jsonl`] decodes records from it.
//! [`parallel`] skips the chaining and decodes files on a worker pool instead.

pub mod compression;
pub mod glob;
pub mod jsonl;
pub mod multi;
pub mod resolve;

#[cfg_attr(docsrs, doc(cfg(feature = "parallel-io")))]
#[cfg(feature = "parallel-io")]
pub mod parallel;
