//! Central directory concatenation with offset rebasing.
//!
//! When the file data of one archive is written after the file data of
//! another, every local header of the appended archive moves forward by the
//! length of the data in front of it. [`merge`] concatenates the two
//! directories and adds that shift to each appended record's local header
//! offset. Records are walked by their real length, so entries with
//! different name, extra and comment lengths are handled.
//!
//! Sort order is not checked. If the combined directory is later searched
//! with [`binary_search`](super::lookup::binary_search), the appended names
//! must all sort after the base names.

use log::trace;

use super::cursor::ByteReader;
use super::error::{Result, ZipError};
use super::structures::CentralDirectoryHeader;

/// Iterator over the records of a central directory, by real record length.
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    reader: ByteReader<'a>,
    failed: bool,
}

/// Walk the records of `directory` front to back.
pub fn entries(directory: &[u8]) -> Entries<'_> {
    Entries {
        reader: ByteReader::new(directory),
        failed: false,
    }
}

impl<'a> Entries<'a> {
    fn next_record(&mut self) -> Result<CentralDirectoryHeader<&'a [u8]>> {
        let len = CentralDirectoryHeader::new(self.reader.rest()).total_len()?;
        Ok(CentralDirectoryHeader::new(self.reader.take(len)?))
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = Result<CentralDirectoryHeader<&'a [u8]>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.remaining() == 0 {
            return None;
        }
        let record = self.next_record();
        self.failed = record.is_err();
        Some(record)
    }
}

/// Count the records of `directory`, checking each signature.
pub fn validate_directory(directory: &[u8]) -> Result<usize> {
    let mut count = 0;
    for header in entries(directory) {
        header?.validate_signature()?;
        count += 1;
    }
    Ok(count)
}

/// Concatenate `base` and `appended`, adding `shift` to the local header
/// offset of every record that came from `appended`.
///
/// `shift` must be the length of the file data that now precedes the
/// appended archive's data. Any other value yields a well-formed directory
/// whose offsets point at the wrong bytes.
pub fn merge(base: &[u8], appended: &[u8], shift: u64) -> Result<Vec<u8>> {
    let mut merged = Vec::with_capacity(base.len() + appended.len());
    merged.extend_from_slice(base);
    merged.extend_from_slice(appended);

    let rebased = rebase_in_place(&mut merged[base.len()..], shift)?;
    trace!(
        "merged {} base bytes with {} appended records (shift {})",
        base.len(),
        rebased,
        shift
    );
    Ok(merged)
}

/// Copy `directory` with every local header offset moved by `shift`.
///
/// Used when directory and file data are stored apart and only the
/// appended records need to be written.
pub fn rebase(directory: &[u8], shift: u64) -> Result<Vec<u8>> {
    merge(&[], directory, shift)
}

fn rebase_in_place(directory: &mut [u8], shift: u64) -> Result<usize> {
    let total = directory.len();
    let mut pos = 0;
    let mut count = 0;

    while pos < total {
        let mut header = CentralDirectoryHeader::new(&mut directory[pos..]);
        let len = header.total_len()?;
        if pos + len > total {
            return Err(ZipError::TruncatedBuffer {
                needed: pos + len,
                available: total,
            });
        }

        let old = header.offset()?;
        let new = u32::try_from(u64::from(old) + shift)
            .map_err(|_| ZipError::OffsetOverflow { offset: old, shift })?;
        header.set_offset(new)?;

        pos += len;
        count += 1;
    }

    Ok(count)
}
