//! Binary search over a sorted central directory.
//!
//! The search indexes records by position, so every record must have the
//! same length (the stride). That only holds when all entries share the
//! same combined name, extra and comment length, as in archives generated
//! with fixed-width names. [`UniformDirectory`] checks the stride against
//! the directory size up front and against each record it probes.
//!
//! Records must be sorted by name in ascending byte order with no
//! duplicates. An unsorted directory gives meaningless results, not errors.

use std::cmp::Ordering;

use super::cursor::ByteReader;
use super::error::{Result, ZipError};
use super::structures::{CDFH_MIN_SIZE, CentralDirectoryHeader};

/// A hit returned by [`find_keys`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundKey {
    pub name: String,
    /// Offset of the entry's local file header.
    pub offset: u32,
    pub compressed_size: u32,
}

/// A central directory of `records` records, each `stride` bytes long.
#[derive(Debug, Clone, Copy)]
pub struct UniformDirectory<'a> {
    bytes: &'a [u8],
    records: usize,
    stride: usize,
}

impl<'a> UniformDirectory<'a> {
    /// Derive the stride as `bytes.len() / records`.
    pub fn new(bytes: &'a [u8], records: usize) -> Result<Self> {
        let stride = bytes.len().checked_div(records).unwrap_or(0);
        Self::with_stride(bytes, records, stride)
    }

    pub fn with_stride(bytes: &'a [u8], records: usize, stride: usize) -> Result<Self> {
        let mismatch = || ZipError::RecordCountMismatch {
            size: bytes.len(),
            records,
            stride,
        };
        if records.checked_mul(stride) != Some(bytes.len()) {
            return Err(mismatch());
        }
        if records > 0 && stride < CDFH_MIN_SIZE {
            return Err(mismatch());
        }
        Ok(Self {
            bytes,
            records,
            stride,
        })
    }

    pub fn len(&self) -> usize {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The record at `index`, checked to span exactly one stride.
    pub fn record(&self, index: usize) -> Result<CentralDirectoryHeader<&'a [u8]>> {
        let start = index
            .checked_mul(self.stride)
            .filter(|_| index < self.records)
            .ok_or(ZipError::TruncatedBuffer {
                needed: index.saturating_add(1).saturating_mul(self.stride),
                available: self.bytes.len(),
            })?;
        let mut reader = ByteReader::at(self.bytes, start)?;
        let header = CentralDirectoryHeader::new(reader.take(self.stride)?);
        if header.total_len()? != self.stride {
            return Err(ZipError::RecordCountMismatch {
                size: self.bytes.len(),
                records: self.records,
                stride: self.stride,
            });
        }
        Ok(header)
    }

    /// Index of the record named `name`, or `None` when absent.
    pub fn binary_search(&self, name: &[u8]) -> Result<Option<usize>> {
        if self.records == 0 {
            return Ok(None);
        }

        let mut low = 0;
        let mut high = self.records - 1;
        while low <= high {
            let mid = low + (high - low) / 2;
            let header = self.record(mid)?;
            match name.cmp(header.name_bytes()?) {
                Ordering::Less => {
                    if mid == 0 {
                        break;
                    }
                    high = mid - 1;
                }
                Ordering::Greater => low = mid + 1,
                Ordering::Equal => return Ok(Some(mid)),
            }
        }
        Ok(None)
    }

    /// Resolve each name in turn. Misses are skipped, hits keep input order.
    pub fn find_keys<I, K>(&self, names: I) -> Result<Vec<FoundKey>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let names = names.into_iter();
        let mut found = Vec::with_capacity(names.size_hint().0);
        for name in names {
            if let Some(index) = self.binary_search(name.as_ref())? {
                let header = self.record(index)?;
                found.push(FoundKey {
                    name: header.name()?.into_owned(),
                    offset: header.offset()?,
                    compressed_size: header.compressed_size()?,
                });
            }
        }
        Ok(found)
    }
}

/// Search `records` records of `stride` bytes for `name`.
pub fn binary_search(
    name: &[u8],
    directory: &[u8],
    records: usize,
    stride: usize,
) -> Result<Option<usize>> {
    UniformDirectory::with_stride(directory, records, stride)?.binary_search(name)
}

/// Batch form of [`binary_search`], returning offsets and sizes of the hits.
pub fn find_keys<I, K>(
    names: I,
    directory: &[u8],
    records: usize,
    stride: usize,
) -> Result<Vec<FoundKey>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    UniformDirectory::with_stride(directory, records, stride)?.find_keys(names)
}
