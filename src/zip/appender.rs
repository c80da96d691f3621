use anyhow::{Context, Result};
use log::{debug, info};
use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use crate::io::LocalFileReader;

use super::archive::{ArchiveReader, CentralDirectory};
use super::error::ZipError;
use super::merge::merge;
use super::rename::{SequentialNamer, rename_entries};
use super::structures::{EOCD_SIZE, EndOfCentralDirectory};

/// Bytes to write over an archive's tail to append another archive to it.
///
/// Written at `write_offset` in order: `data`, `directory`, `end_record`.
#[derive(Debug, Clone)]
pub struct AppendPlan {
    pub write_offset: u64,
    pub data: Vec<u8>,
    pub directory: Vec<u8>,
    pub end_record: EndOfCentralDirectory<[u8; EOCD_SIZE]>,
    pub appended_records: usize,
}

impl AppendPlan {
    /// Plan appending `appended` (directory and file data) after `base`.
    pub fn new(
        base: &CentralDirectory,
        appended: &CentralDirectory,
        appended_data: Vec<u8>,
    ) -> Result<Self> {
        let shift = base.data_len()?;
        let directory = merge(base.bytes(), appended.bytes(), shift)?;

        let base_records = base.records()?;
        let appended_records = appended.records()?;
        let records = u16::try_from(base_records + appended_records)
            .ok()
            .filter(|&r| r != u16::MAX)
            .ok_or(ZipError::Zip64Unsupported)?;

        let directory_offset = shift + appended_data.len() as u64;
        let mut end_record = EndOfCentralDirectory::empty();
        let directory_start =
            u32::try_from(directory_offset).map_err(|_| ZipError::Zip64Unsupported)?;
        end_record.set_offset(directory_start)?;
        let directory_size =
            u32::try_from(directory.len()).map_err(|_| ZipError::Zip64Unsupported)?;
        end_record.set_size(directory_size)?;
        end_record.set_record_count(records)?;

        debug!(
            "append plan: {} + {} records, shift {}, directory at {}",
            base_records, appended_records, shift, directory_offset
        );

        Ok(Self {
            write_offset: shift,
            data: appended_data,
            directory,
            end_record,
            appended_records,
        })
    }

    /// Length of the archive once the plan is written.
    pub fn final_len(&self) -> u64 {
        self.write_offset + (self.data.len() + self.directory.len() + EOCD_SIZE) as u64
    }
}

/// Options for [`append_archive`].
#[derive(Debug, Default)]
pub struct AppendOptions<'a> {
    /// Rename the appended entries before merging.
    pub namer: Option<&'a mut SequentialNamer>,
}

/// Append the archive at `appended` to the archive at `base`, in place.
///
/// The base file data is left untouched. The appended archive's file data
/// is written where the base directory used to start, followed by the
/// merged directory and a new end record.
pub async fn append_archive(
    base: &Path,
    appended: &Path,
    options: AppendOptions<'_>,
) -> Result<AppendPlan> {
    let base_reader = ArchiveReader::new(Arc::new(LocalFileReader::new(base)?));
    let base_dir = base_reader
        .read_directory()
        .await
        .with_context(|| format!("Cannot read directory of {}", base.display()))?;

    let appended_reader = ArchiveReader::new(Arc::new(LocalFileReader::new(appended)?));
    let appended_dir = appended_reader
        .read_directory()
        .await
        .with_context(|| format!("Cannot read directory of {}", appended.display()))?;
    let mut appended_data = appended_reader.read_file_data(&appended_dir).await?;

    let appended_dir = match options.namer {
        Some(namer) => {
            let end_record = *appended_dir.end_record();
            let mut bytes = appended_dir.bytes().to_vec();
            let renamed = rename_entries(&mut bytes, &mut appended_data, namer)?;
            debug!("renamed {} entries, next counter {}", renamed, namer.peek());
            CentralDirectory::new(end_record, bytes)
        }
        None => appended_dir,
    };

    let plan = AppendPlan::new(&base_dir, &appended_dir, appended_data)?;
    write_plan(base, &plan).await?;

    info!(
        "appended {} entries from {} to {}",
        plan.appended_records,
        appended.display(),
        base.display()
    );
    Ok(plan)
}

/// Write `plan` over the tail of the archive at `path`.
pub async fn write_plan(path: &Path, plan: &AppendPlan) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .await
        .with_context(|| format!("Cannot open {} for writing", path.display()))?;

    file.seek(SeekFrom::Start(plan.write_offset)).await?;
    file.write_all(&plan.data).await?;
    file.write_all(&plan.directory).await?;
    file.write_all(plan.end_record.as_bytes()).await?;
    file.flush().await?;
    // Drop any old archive comment left beyond the new end record.
    file.set_len(plan.final_len()).await?;
    file.sync_all().await?;

    Ok(())
}

/// Create an archive with no entries at `path`.
pub async fn write_empty_archive(path: &Path) -> Result<()> {
    let eocd = EndOfCentralDirectory::empty();
    fs::write(path, eocd.as_bytes())
        .await
        .with_context(|| format!("Cannot write {}", path.display()))?;
    Ok(())
}
