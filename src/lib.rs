//! # zipcd
//!
//! Merge and query the central directory of ZIP archives whose entries are
//! sorted by name, without rewriting the file data.
//!
//! - Look up a batch of names by binary search and get each entry's offset
//!   and compressed size, ready for a direct range read
//! - Append one archive to another by writing its file data after the base
//!   data and merging the two directories with corrected offsets
//! - Read archives from the local filesystem or over HTTP Range requests
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use zipcd::{ArchiveReader, HttpRangeReader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let url = "https://example.com/sorted.zip".to_string();
//!     let reader = Arc::new(HttpRangeReader::new(url).await?);
//!     let archive = ArchiveReader::new(reader);
//!
//!     for key in archive.find_keys(&["entry-00042", "entry-00043"]).await? {
//!         let entry = archive.read_entry(&key).await?;
//!         println!("{}: {} bytes", key.name, entry.data.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use io::{HttpOptions, HttpRangeReader, LocalFileReader, MemoryReader, ReadAt};
pub use zip::{ArchiveReader, FoundKey, ZipError};
