//! Testing utilities for code that reads record streams.
//!
//! - **Fixtures**: [`FixtureDir`] lays out plain, compressed, hidden and
//!   manifest files in a temporary directory; [`sample_records`] generates
//!   distinguishable records per file
//! - **Assertions**: compare decoded output in order, ignoring order, or
//!   checking that per-file order survived a parallel run
//!
//! # Quick Start
//!
//! ```
//! use ironstream::testing::*;
//! use ironstream::read_jsonl_vec;
//!
//! # fn main() -> ironstream::Result<()> {
//! let dir = FixtureDir::new()?;
//! let first = sample_records(0, 2);
//! let second = sample_records(1, 3);
//! dir.write_jsonl("a.json", &first)?;
//! dir.write_jsonl("b.json", &second)?;
//!
//! let all: Vec<SampleRecord> = read_jsonl_vec(dir.path())?;
//! let expected: Vec<_> = first.into_iter().chain(second).collect();
//! assert_collections_equal(&all, &expected);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
