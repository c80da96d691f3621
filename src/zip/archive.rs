//! Loading central directories and entry payloads through [`ReadAt`].
//!
//! ZIP files are read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. Read the Central Directory it points to in one request
//! 3. Resolve entries by binary search and read their payloads by range
//!
//! Only the tail of the archive and the requested ranges are fetched, which
//! keeps remote lookups over HTTP Range requests cheap.

use anyhow::{Result, bail};
use log::debug;
use std::sync::Arc;

use crate::io::ReadAt;

use super::error::ZipError;
use super::lookup::{FoundKey, UniformDirectory};
use super::merge::{Entries, entries, validate_directory};
use super::structures::{
    CompressionMethod, EOCD_SIGNATURE, EOCD_SIZE, EndOfCentralDirectory, LFH_SIZE,
    LocalFileHeader,
};

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// A central directory loaded into memory, with the end record that located it.
#[derive(Debug, Clone)]
pub struct CentralDirectory {
    end_record: EndOfCentralDirectory<[u8; EOCD_SIZE]>,
    bytes: Vec<u8>,
}

impl CentralDirectory {
    /// Assemble from an end record and the directory bytes it describes.
    pub fn new(end_record: EndOfCentralDirectory<[u8; EOCD_SIZE]>, bytes: Vec<u8>) -> Self {
        Self { end_record, bytes }
    }

    /// The directory of an archive with no entries.
    pub fn empty() -> Self {
        Self::new(EndOfCentralDirectory::empty(), Vec::new())
    }

    pub fn end_record(&self) -> &EndOfCentralDirectory<[u8; EOCD_SIZE]> {
        &self.end_record
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn records(&self) -> Result<usize> {
        Ok(self.end_record.record_count()? as usize)
    }

    /// Start of the directory, equal to the length of the file-data region.
    pub fn data_len(&self) -> Result<u64> {
        Ok(self.end_record.offset()? as u64)
    }

    /// Fixed-stride view for binary search.
    pub fn uniform(&self) -> Result<UniformDirectory<'_>> {
        Ok(UniformDirectory::new(&self.bytes, self.records()?)?)
    }

    pub fn entries(&self) -> Entries<'_> {
        entries(&self.bytes)
    }
}

/// Raw payload of an entry as stored in the archive.
#[derive(Debug, Clone)]
pub struct EntryData {
    pub compression_method: CompressionMethod,
    pub data: Vec<u8>,
}

/// Random-access reader for archives with sorted central directories.
pub struct ArchiveReader<R: ReadAt + ?Sized> {
    /// The underlying data source
    reader: Arc<R>,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt + ?Sized> ArchiveReader<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// The record normally occupies the last 22 bytes. If an archive comment
    /// follows it, the tail is searched backwards for the signature.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCD record, offset of EOCD in file).
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory<[u8; EOCD_SIZE]>, u64)> {
        let signature = EOCD_SIGNATURE.to_le_bytes();

        if self.size >= EOCD_SIZE as u64 {
            let offset = self.size - EOCD_SIZE as u64;
            let mut buf = [0u8; EOCD_SIZE];
            self.reader.read_exact_at(offset, &mut buf).await?;

            let eocd = EndOfCentralDirectory::new(buf);
            if buf[..4] == signature && eocd.comment_len()? == 0 {
                return Ok((eocd, offset));
            }
        }

        let search_size = (MAX_COMMENT_SIZE + EOCD_SIZE as u64).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf).await?;

        for i in (0..buf.len().saturating_sub(EOCD_SIZE - 1)).rev() {
            if buf[i..i + 4] != signature {
                continue;
            }
            let mut record = [0u8; EOCD_SIZE];
            record.copy_from_slice(&buf[i..i + EOCD_SIZE]);
            let eocd = EndOfCentralDirectory::new(record);

            // The comment length must account for every byte after the record.
            if eocd.comment_len()? as usize == buf.len() - i - EOCD_SIZE {
                debug!("end record found at {} behind a comment", search_start + i as u64);
                return Ok((eocd, search_start + i as u64));
            }
        }

        bail!("Not a valid ZIP file")
    }

    /// Load the central directory, checking it against the end record.
    pub async fn read_directory(&self) -> Result<CentralDirectory> {
        let (eocd, eocd_offset) = self.find_eocd().await?;
        if eocd.is_zip64()? {
            return Err(ZipError::Zip64Unsupported.into());
        }

        let offset = eocd.offset()? as u64;
        let size = eocd.size()? as u64;
        let records = eocd.record_count()? as usize;
        if offset + size > eocd_offset {
            bail!(
                "Central directory ({} bytes at {}) overlaps the end record at {}",
                size,
                offset,
                eocd_offset
            );
        }

        let mut bytes = vec![0u8; size as usize];
        self.reader.read_exact_at(offset, &mut bytes).await?;

        let walked = validate_directory(&bytes)?;
        if walked != records {
            bail!(
                "End record declares {} entries but the directory holds {}",
                records,
                walked
            );
        }

        debug!(
            "central directory: {} records, {} bytes at offset {}",
            records, size, offset
        );
        Ok(CentralDirectory::new(eocd, bytes))
    }

    /// Read everything in front of the central directory.
    pub async fn read_file_data(&self, directory: &CentralDirectory) -> Result<Vec<u8>> {
        let mut data = vec![0u8; directory.data_len()? as usize];
        self.reader.read_exact_at(0, &mut data).await?;
        Ok(data)
    }

    /// Look up `names` by binary search over the directory.
    pub async fn find_keys<K: AsRef<[u8]>>(&self, names: &[K]) -> Result<Vec<FoundKey>> {
        let directory = self.read_directory().await?;
        let found = directory.uniform()?.find_keys(names)?;
        debug!("{} of {} keys found", found.len(), names.len());
        Ok(found)
    }

    /// Offset of an entry's payload, past its local file header.
    ///
    /// The local header's name and extra lengths may differ from the
    /// directory record, so the header itself is read.
    pub async fn data_offset(&self, local_offset: u32) -> Result<u64> {
        let header = self.read_local_header(local_offset).await?;
        Ok(local_offset as u64 + header.header_len()? as u64)
    }

    /// Read the stored bytes of a found entry with one range request.
    pub async fn read_entry(&self, key: &FoundKey) -> Result<EntryData> {
        let header = self.read_local_header(key.offset).await?;
        let start = key.offset as u64 + header.header_len()? as u64;

        let mut data = vec![0u8; key.compressed_size as usize];
        self.reader.read_exact_at(start, &mut data).await?;

        Ok(EntryData {
            compression_method: header.compression_method()?,
            data,
        })
    }

    async fn read_local_header(&self, offset: u32) -> Result<LocalFileHeader<[u8; LFH_SIZE]>> {
        let mut buf = [0u8; LFH_SIZE];
        self.reader.read_exact_at(offset as u64, &mut buf).await?;
        let header = LocalFileHeader::new(buf);
        header.validate_signature()?;
        Ok(header)
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }
}
