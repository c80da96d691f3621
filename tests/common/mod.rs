//! Assembles small stored-only archives for tests.

#![allow(dead_code)]

use std::path::PathBuf;

use zipcd::zip::{CDFH_SIGNATURE, EndOfCentralDirectory, LFH_SIGNATURE};

#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    data: Vec<u8>,
    directory: Vec<u8>,
    records: u16,
    comment: Vec<u8>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an uncompressed entry.
    pub fn stored(mut self, name: &str, payload: &[u8]) -> Self {
        let offset = self.data.len() as u32;
        let name_len = (name.len() as u16).to_le_bytes();
        let size = (payload.len() as u32).to_le_bytes();

        let mut lfh = [0u8; 30];
        lfh[0..4].copy_from_slice(&LFH_SIGNATURE.to_le_bytes());
        lfh[4] = 20;
        lfh[0x12..0x16].copy_from_slice(&size);
        lfh[0x16..0x1a].copy_from_slice(&size);
        lfh[0x1a..0x1c].copy_from_slice(&name_len);
        self.data.extend_from_slice(&lfh);
        self.data.extend_from_slice(name.as_bytes());
        self.data.extend_from_slice(payload);

        let mut cd = [0u8; 46];
        cd[0..4].copy_from_slice(&CDFH_SIGNATURE.to_le_bytes());
        cd[4] = 20;
        cd[6] = 20;
        cd[0x14..0x18].copy_from_slice(&size);
        cd[0x18..0x1c].copy_from_slice(&size);
        cd[0x1c..0x1e].copy_from_slice(&name_len);
        cd[0x2a..0x2e].copy_from_slice(&offset.to_le_bytes());
        self.directory.extend_from_slice(&cd);
        self.directory.extend_from_slice(name.as_bytes());

        self.records += 1;
        self
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut eocd = EndOfCentralDirectory::empty();
        eocd.set_offset(self.data.len() as u32).unwrap();
        eocd.set_size(self.directory.len() as u32).unwrap();
        eocd.set_record_count(self.records).unwrap();
        let mut eocd = eocd.into_inner();
        eocd[0x14..0x16].copy_from_slice(&(self.comment.len() as u16).to_le_bytes());

        let mut out = self.data;
        out.extend_from_slice(&self.directory);
        out.extend_from_slice(&eocd);
        out.extend_from_slice(&self.comment);
        out
    }
}

/// Payload for entry `i`, varying in length so offsets are irregular.
pub fn payload(i: usize) -> Vec<u8> {
    format!("payload of entry {i} ").repeat(i % 4 + 1).into_bytes()
}

/// Archive of entries `entry-{first:05}` .. `entry-{last - 1:05}`.
pub fn numbered(first: usize, last: usize) -> Vec<u8> {
    (first..last)
        .fold(ArchiveBuilder::new(), |b, i| {
            b.stored(&format!("entry-{i:05}"), &payload(i))
        })
        .build()
}

/// A path under the system temp directory unique to this process and tag.
pub fn temp_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("zipcd-{}-{}.zip", std::process::id(), tag))
}
