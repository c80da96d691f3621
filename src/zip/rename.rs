//! In-place renaming of directory entries and their local headers.
//!
//! Names are fixed-width in place: a replacement must have exactly the
//! byte length already recorded for the entry. Renaming is all or nothing;
//! every record is checked before any byte is written.

use super::cursor::ByteReader;
use super::error::{Result, ZipError};
use super::merge::entries;
use super::structures::{CentralDirectoryHeader, LocalFileHeader};

/// Generates `prefix` followed by a zero-padded counter.
///
/// The counter belongs to the caller and advances once per renamed entry,
/// so consecutive batches continue the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequentialNamer {
    prefix: String,
    width: Option<usize>,
    next: u64,
}

impl SequentialNamer {
    /// Counter padded to `width` digits.
    pub fn new(prefix: impl Into<String>, width: usize, start: u64) -> Self {
        Self {
            prefix: prefix.into(),
            width: Some(width),
            next: start,
        }
    }

    /// Counter padded so each name keeps the length of the one it replaces.
    pub fn fitted(prefix: impl Into<String>, start: u64) -> Self {
        Self {
            prefix: prefix.into(),
            width: None,
            next: start,
        }
    }

    /// Counter value the next name will use.
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Next name, replacing one of `current_len` bytes.
    pub fn next_name(&mut self, current_len: usize) -> String {
        let width = self
            .width
            .unwrap_or_else(|| current_len.saturating_sub(self.prefix.len()));
        let name = format!("{}{:0width$}", self.prefix, self.next);
        self.next += 1;
        name
    }
}

/// Rename each record of `directory` and the local header it points to in
/// `file_data`, taking names from `namer`. Returns the number of entries.
///
/// `file_data` starts at archive offset zero, so record offsets index it
/// directly.
pub fn rename_entries(
    directory: &mut [u8],
    file_data: &mut [u8],
    namer: &mut SequentialNamer,
) -> Result<usize> {
    let mut trial = namer.clone();
    let mut plan = Vec::new();
    let mut pos = 0;

    for header in entries(directory) {
        let header = header?;
        let name = trial.next_name(header.name_len()?);
        check_len(header.name_len()?, &name)?;

        let offset = header.offset()? as usize;
        let local = LocalFileHeader::new(ByteReader::at(file_data, offset)?.rest());
        local.validate_signature()?;
        check_len(local.name_len()?, &name)?;

        plan.push((pos, offset, name));
        pos += header.total_len()?;
    }

    for (pos, offset, name) in &plan {
        CentralDirectoryHeader::new(&mut directory[*pos..]).set_name(name.as_bytes())?;
        LocalFileHeader::new(&mut file_data[*offset..]).set_name(name.as_bytes())?;
    }

    *namer = trial;
    Ok(plan.len())
}

fn check_len(expected: usize, name: &str) -> Result<()> {
    if expected != name.len() {
        return Err(ZipError::NameLengthMismatch {
            expected,
            found: name.len(),
        });
    }
    Ok(())
}
