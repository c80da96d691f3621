//! Sorted ZIP central directories: lookup and append.
//!
//! ## Architecture
//!
//! The byte-level core works on buffers the caller has already loaded and
//! never performs I/O:
//!
//! - [`cursor`]: little-endian readers and writers over byte slices
//! - [`structures`]: zero-copy views of the EOCD, central directory and
//!   local file header records
//! - [`lookup`]: binary search over fixed-stride directories
//! - [`merge`]: directory concatenation with offset rebasing
//! - [`rename`]: fixed-width in-place entry renaming
//!
//! Around it, [`archive`] loads directories and payloads through
//! [`ReadAt`](crate::io::ReadAt) and [`appender`] writes appended archives
//! to local files.
//!
//! ## Limitations
//!
//! - No ZIP64 support: archives that need it are rejected
//! - No multi-disk archive support
//! - Lookups require every directory record to have the same length

pub mod appender;
pub mod archive;
pub mod cursor;
pub mod error;
pub mod lookup;
pub mod merge;
pub mod rename;
pub mod structures;

pub use appender::{AppendOptions, AppendPlan, append_archive, write_empty_archive, write_plan};
pub use archive::{ArchiveReader, CentralDirectory, EntryData};
pub use cursor::{ByteReader, ByteWriter};
pub use error::{Result, ZipError};
pub use lookup::{FoundKey, UniformDirectory, binary_search, find_keys};
pub use merge::{Entries, entries, merge, rebase, validate_directory};
pub use rename::{SequentialNamer, rename_entries};
pub use structures::*;
