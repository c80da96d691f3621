use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs::File;
use std::path::{Path, PathBuf};

use super::ReadAt;

/// Local archive reader using positioned reads
pub struct LocalFileReader {
    file: File,
    path: PathBuf,
    size: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
        let size = file.metadata()?.len();
        log::debug!("opened {} ({} bytes)", path.display(), size);
        Ok(Self {
            file,
            path: path.to_path_buf(),
            size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReadAt for LocalFileReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        #[cfg(unix)]
        let n = {
            use std::os::unix::fs::FileExt;
            self.file.read_at(buf, offset)
        };

        #[cfg(windows)]
        let n = {
            use std::os::windows::fs::FileExt;
            self.file.seek_read(buf, offset)
        };

        #[cfg(not(any(unix, windows)))]
        let n: std::io::Result<usize> = {
            let _ = (buf, offset);
            Err(std::io::Error::from(std::io::ErrorKind::Unsupported))
        };

        n.with_context(|| format!("Read of {} at offset {} failed", self.path.display(), offset))
    }

    fn size(&self) -> u64 {
        self.size
    }
}
