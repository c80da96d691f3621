use std::borrow::Cow;

use super::cursor::{ByteReader, ByteWriter, read_u16_at, read_u32_at, write_u16_at, write_u32_at};
use super::error::{Result, ZipError};

/// End of Central Directory (EOCD) - 22 bytes minimum
pub const EOCD_SIGNATURE: u32 = 0x06054b50;
pub const EOCD_SIZE: usize = 22;

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: u32 = 0x02014b50;
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: u32 = 0x04034b50;
pub const LFH_SIZE: usize = 30;

/// ZIP64 End of Central Directory Locator signature. Not traversed.
pub const ZIP64_LOCATOR_SIGNATURE: u32 = 0x07064b50;

/// ZIP64 End of Central Directory signature. Not traversed.
pub const ZIP64_EOCD_SIGNATURE: u32 = 0x06064b50;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

fn check_signature(bytes: &[u8], expected: u32) -> Result<()> {
    let found = read_u32_at(bytes, 0)?;
    if found != expected {
        return Err(ZipError::InvalidSignature { expected, found });
    }
    Ok(())
}

/// Overwrite a fixed-length name field in place.
fn patch_name(bytes: &mut [u8], len_field: usize, name_start: usize, name: &[u8]) -> Result<()> {
    let expected = read_u16_at(bytes, len_field)? as usize;
    if name.len() != expected {
        return Err(ZipError::NameLengthMismatch {
            expected,
            found: name.len(),
        });
    }
    ByteWriter::at(bytes, name_start)?.write_bytes(name)
}

/// End of Central Directory (EOCD) - 22 bytes minimum
///
/// A view over caller-owned bytes. `B` is `&[u8]` for read-only access,
/// `&mut [u8]` or an owned buffer when the record is rewritten.
#[derive(Debug, Clone, Copy)]
pub struct EndOfCentralDirectory<B> {
    bytes: B,
}

impl<B: AsRef<[u8]>> EndOfCentralDirectory<B> {
    const RECORDS_DISK: usize = 0x08;
    const RECORDS_TOTAL: usize = 0x0a;
    const DIR_SIZE: usize = 0x0c;
    const DIR_OFFSET: usize = 0x10;
    const COMMENT_LEN: usize = 0x14;

    /// Wrap `bytes` without validation. Accessors check bounds on every call.
    pub fn new(bytes: B) -> Self {
        Self { bytes }
    }

    /// Wrap `bytes` after checking the length and signature.
    pub fn parse(bytes: B) -> Result<Self> {
        let record = Self::new(bytes);
        let available = record.as_bytes().len();
        if available < EOCD_SIZE {
            return Err(ZipError::TruncatedBuffer {
                needed: EOCD_SIZE,
                available,
            });
        }
        record.validate_signature()?;
        Ok(record)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_ref()
    }

    pub fn into_inner(self) -> B {
        self.bytes
    }

    pub fn signature(&self) -> Result<u32> {
        read_u32_at(self.as_bytes(), 0)
    }

    pub fn validate_signature(&self) -> Result<()> {
        check_signature(self.as_bytes(), EOCD_SIGNATURE)
    }

    /// Offset of the central directory from the start of the archive.
    pub fn offset(&self) -> Result<u32> {
        read_u32_at(self.as_bytes(), Self::DIR_OFFSET)
    }

    /// Central directory size in bytes.
    pub fn size(&self) -> Result<u32> {
        read_u32_at(self.as_bytes(), Self::DIR_SIZE)
    }

    /// Total number of central directory records.
    pub fn record_count(&self) -> Result<u16> {
        read_u16_at(self.as_bytes(), Self::RECORDS_TOTAL)
    }

    /// Record count stored in the "this disk" field.
    pub fn disk_record_count(&self) -> Result<u16> {
        read_u16_at(self.as_bytes(), Self::RECORDS_DISK)
    }

    pub fn comment_len(&self) -> Result<u16> {
        read_u16_at(self.as_bytes(), Self::COMMENT_LEN)
    }

    /// True when any field holds a zip64 sentinel value.
    pub fn is_zip64(&self) -> Result<bool> {
        Ok(self.disk_record_count()? == 0xFFFF
            || self.record_count()? == 0xFFFF
            || self.size()? == 0xFFFFFFFF
            || self.offset()? == 0xFFFFFFFF)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> EndOfCentralDirectory<B> {
    pub fn set_offset(&mut self, offset: u32) -> Result<()> {
        write_u32_at(self.bytes.as_mut(), Self::DIR_OFFSET, offset)
    }

    pub fn set_size(&mut self, size: u32) -> Result<()> {
        write_u32_at(self.bytes.as_mut(), Self::DIR_SIZE, size)
    }

    /// Write `records` to both the "this disk" and "total" count fields.
    pub fn set_record_count(&mut self, records: u16) -> Result<()> {
        write_u16_at(self.bytes.as_mut(), Self::RECORDS_DISK, records)?;
        write_u16_at(self.bytes.as_mut(), Self::RECORDS_TOTAL, records)
    }
}

impl EndOfCentralDirectory<[u8; EOCD_SIZE]> {
    /// An owned record describing an archive with no entries.
    pub fn empty() -> Self {
        let mut bytes = [0u8; EOCD_SIZE];
        bytes[..4].copy_from_slice(&EOCD_SIGNATURE.to_le_bytes());
        Self { bytes }
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
///
/// The fixed prefix is followed by the name, extra field and comment.
#[derive(Debug, Clone, Copy)]
pub struct CentralDirectoryHeader<B> {
    bytes: B,
}

impl<B: AsRef<[u8]>> CentralDirectoryHeader<B> {
    const METHOD: usize = 0x0a;
    const COMPRESSED_SIZE: usize = 0x14;
    const UNCOMPRESSED_SIZE: usize = 0x18;
    const NAME_LEN: usize = 0x1c;
    const EXTRA_LEN: usize = 0x1e;
    const COMMENT_LEN: usize = 0x20;
    const LOCAL_OFFSET: usize = 0x2a;
    const NAME: usize = 0x2e;

    pub fn new(bytes: B) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_ref()
    }

    pub fn into_inner(self) -> B {
        self.bytes
    }

    pub fn signature(&self) -> Result<u32> {
        read_u32_at(self.as_bytes(), 0)
    }

    pub fn validate_signature(&self) -> Result<()> {
        check_signature(self.as_bytes(), CDFH_SIGNATURE)
    }

    pub fn name_len(&self) -> Result<usize> {
        Ok(read_u16_at(self.as_bytes(), Self::NAME_LEN)? as usize)
    }

    pub fn extra_len(&self) -> Result<usize> {
        Ok(read_u16_at(self.as_bytes(), Self::EXTRA_LEN)? as usize)
    }

    pub fn comment_len(&self) -> Result<usize> {
        Ok(read_u16_at(self.as_bytes(), Self::COMMENT_LEN)? as usize)
    }

    pub fn name_bytes(&self) -> Result<&[u8]> {
        let len = self.name_len()?;
        ByteReader::at(self.as_bytes(), Self::NAME)?.take(len)
    }

    /// Entry name, with invalid UTF-8 replaced.
    pub fn name(&self) -> Result<Cow<'_, str>> {
        Ok(String::from_utf8_lossy(self.name_bytes()?))
    }

    pub fn compression_method(&self) -> Result<CompressionMethod> {
        Ok(CompressionMethod::from_u16(read_u16_at(
            self.as_bytes(),
            Self::METHOD,
        )?))
    }

    pub fn compressed_size(&self) -> Result<u32> {
        read_u32_at(self.as_bytes(), Self::COMPRESSED_SIZE)
    }

    pub fn uncompressed_size(&self) -> Result<u32> {
        read_u32_at(self.as_bytes(), Self::UNCOMPRESSED_SIZE)
    }

    /// Offset of the entry's local file header from the start of the archive.
    pub fn offset(&self) -> Result<u32> {
        read_u32_at(self.as_bytes(), Self::LOCAL_OFFSET)
    }

    /// Length of the whole record: fixed prefix plus name, extra and comment.
    pub fn total_len(&self) -> Result<usize> {
        Ok(CDFH_MIN_SIZE + self.name_len()? + self.extra_len()? + self.comment_len()?)
    }

    /// Copy the fields the lookup and listing paths need.
    pub fn to_entry(&self) -> Result<DirectoryEntry> {
        Ok(DirectoryEntry {
            name: self.name()?.into_owned(),
            compression_method: self.compression_method()?,
            compressed_size: self.compressed_size()?,
            uncompressed_size: self.uncompressed_size()?,
            offset: self.offset()?,
        })
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> CentralDirectoryHeader<B> {
    pub fn set_offset(&mut self, offset: u32) -> Result<()> {
        write_u32_at(self.bytes.as_mut(), Self::LOCAL_OFFSET, offset)
    }

    /// Replace the name in place. The new name must have the stored length.
    pub fn set_name(&mut self, name: &[u8]) -> Result<()> {
        patch_name(self.bytes.as_mut(), Self::NAME_LEN, Self::NAME, name)
    }
}

/// Local File Header (LFH) - 30 bytes
#[derive(Debug, Clone, Copy)]
pub struct LocalFileHeader<B> {
    bytes: B,
}

impl<B: AsRef<[u8]>> LocalFileHeader<B> {
    const METHOD: usize = 0x08;
    const NAME_LEN: usize = 0x1a;
    const EXTRA_LEN: usize = 0x1c;
    const NAME: usize = 0x1e;

    pub fn new(bytes: B) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_ref()
    }

    pub fn validate_signature(&self) -> Result<()> {
        check_signature(self.as_bytes(), LFH_SIGNATURE)
    }

    pub fn compression_method(&self) -> Result<CompressionMethod> {
        Ok(CompressionMethod::from_u16(read_u16_at(
            self.as_bytes(),
            Self::METHOD,
        )?))
    }

    pub fn name_len(&self) -> Result<usize> {
        Ok(read_u16_at(self.as_bytes(), Self::NAME_LEN)? as usize)
    }

    pub fn extra_len(&self) -> Result<usize> {
        Ok(read_u16_at(self.as_bytes(), Self::EXTRA_LEN)? as usize)
    }

    pub fn name_bytes(&self) -> Result<&[u8]> {
        let len = self.name_len()?;
        ByteReader::at(self.as_bytes(), Self::NAME)?.take(len)
    }

    /// Distance from the header start to the entry payload.
    pub fn header_len(&self) -> Result<usize> {
        Ok(LFH_SIZE + self.name_len()? + self.extra_len()?)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> LocalFileHeader<B> {
    /// Replace the name in place. The new name must have the stored length.
    pub fn set_name(&mut self, name: &[u8]) -> Result<()> {
        patch_name(self.bytes.as_mut(), Self::NAME_LEN, Self::NAME, name)
    }
}

/// Owned copy of a central directory record's key fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub offset: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(name: &str, extra: usize, comment: usize, offset: u32, csize: u32) -> Vec<u8> {
        let mut buf = vec![0u8; 46 + name.len() + extra + comment];
        buf[0..4].copy_from_slice(&0x02014b50u32.to_le_bytes());
        buf[0x14..0x18].copy_from_slice(&csize.to_le_bytes());
        buf[0x1c..0x1e].copy_from_slice(&(name.len() as u16).to_le_bytes());
        buf[0x1e..0x20].copy_from_slice(&(extra as u16).to_le_bytes());
        buf[0x20..0x22].copy_from_slice(&(comment as u16).to_le_bytes());
        buf[0x2a..0x2e].copy_from_slice(&offset.to_le_bytes());
        buf[46..46 + name.len()].copy_from_slice(name.as_bytes());
        buf
    }

    #[test]
    fn test_eocd_fields() {
        let mut eocd = EndOfCentralDirectory::empty();
        assert_eq!(eocd.signature().unwrap(), 0x06054b50);
        assert_eq!(eocd.as_bytes()[..4], *b"PK\x05\x06");

        eocd.set_offset(0x1234).unwrap();
        eocd.set_size(0x56).unwrap();
        eocd.set_record_count(7).unwrap();

        assert_eq!(eocd.offset().unwrap(), 0x1234);
        assert_eq!(eocd.size().unwrap(), 0x56);
        assert_eq!(eocd.record_count().unwrap(), 7);
        assert_eq!(eocd.disk_record_count().unwrap(), 7);
        assert_eq!(eocd.as_bytes()[0x08..0x0c], [7, 0, 7, 0]);
        assert!(!eocd.is_zip64().unwrap());

        let parsed = EndOfCentralDirectory::parse(&eocd.as_bytes()[..]).unwrap();
        assert_eq!(parsed.offset().unwrap(), 0x1234);
    }

    #[test]
    fn test_eocd_parse_rejects_bad_input() {
        let short = [0x50u8, 0x4b, 0x05, 0x06, 0, 0];
        assert_eq!(
            EndOfCentralDirectory::parse(&short[..]).unwrap_err(),
            ZipError::TruncatedBuffer {
                needed: 22,
                available: 6
            }
        );

        let bad = [0u8; 22];
        assert_eq!(
            EndOfCentralDirectory::parse(&bad[..]).unwrap_err(),
            ZipError::InvalidSignature {
                expected: 0x06054b50,
                found: 0
            }
        );
    }

    #[test]
    fn test_eocd_zip64_sentinel() {
        let mut eocd = EndOfCentralDirectory::empty();
        eocd.set_offset(0xFFFFFFFF).unwrap();
        assert!(eocd.is_zip64().unwrap());
    }

    #[test]
    fn test_eocd_accessors_fail_on_short_range() {
        let bytes = [0u8; 12];
        let eocd = EndOfCentralDirectory::new(&bytes[..]);
        assert!(eocd.record_count().is_ok());
        assert_eq!(
            eocd.size().unwrap_err(),
            ZipError::TruncatedBuffer {
                needed: 16,
                available: 12
            }
        );
    }

    #[test]
    fn test_directory_header_fields() {
        let bytes = header("hello.txt", 4, 3, 0x2a, 0x1000);
        let dh = CentralDirectoryHeader::new(&bytes[..]);
        dh.validate_signature().unwrap();
        assert_eq!(dh.name_len().unwrap(), 9);
        assert_eq!(dh.extra_len().unwrap(), 4);
        assert_eq!(dh.comment_len().unwrap(), 3);
        assert_eq!(dh.name().unwrap(), "hello.txt");
        assert_eq!(dh.offset().unwrap(), 0x2a);
        assert_eq!(dh.compressed_size().unwrap(), 0x1000);
        assert_eq!(dh.compression_method().unwrap(), CompressionMethod::Stored);
        assert_eq!(dh.total_len().unwrap(), 46 + 9 + 4 + 3);
    }

    #[test]
    fn test_directory_header_set_offset_and_name() {
        let mut bytes = header("abc", 0, 0, 10, 1);
        let mut dh = CentralDirectoryHeader::new(&mut bytes[..]);
        dh.set_offset(510).unwrap();
        dh.set_name(b"xyz").unwrap();
        assert_eq!(dh.offset().unwrap(), 510);
        assert_eq!(dh.name().unwrap(), "xyz");
        assert_eq!(
            dh.set_name(b"toolong").unwrap_err(),
            ZipError::NameLengthMismatch {
                expected: 3,
                found: 7
            }
        );
        assert_eq!(dh.name().unwrap(), "xyz");
    }

    #[test]
    fn test_directory_header_truncated_name() {
        let bytes = header("hello.txt", 0, 0, 0, 0);
        let dh = CentralDirectoryHeader::new(&bytes[..50]);
        assert_eq!(
            dh.name().unwrap_err(),
            ZipError::TruncatedBuffer {
                needed: 55,
                available: 50
            }
        );
    }

    #[test]
    fn test_local_header_set_name() {
        let mut bytes = vec![0u8; 30 + 5 + 2];
        bytes[0..4].copy_from_slice(&0x04034b50u32.to_le_bytes());
        bytes[0x08] = 8;
        bytes[0x1a] = 5;
        bytes[0x1c] = 2;
        bytes[30..35].copy_from_slice(b"first");

        let mut lfh = LocalFileHeader::new(&mut bytes[..]);
        lfh.validate_signature().unwrap();
        assert_eq!(lfh.header_len().unwrap(), 37);
        assert_eq!(lfh.compression_method().unwrap(), CompressionMethod::Deflate);
        lfh.set_name(b"other").unwrap();
        assert_eq!(lfh.name_bytes().unwrap(), b"other");
        assert!(matches!(
            lfh.set_name(b"x"),
            Err(ZipError::NameLengthMismatch {
                expected: 5,
                found: 1
            })
        ));
    }
}
