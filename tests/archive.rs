mod common;

use std::sync::Arc;

use common::{ArchiveBuilder, numbered, payload};
use zipcd::zip::{
    AppendPlan, ArchiveReader, CentralDirectory, CompressionMethod, EndOfCentralDirectory, ZipError,
};
use zipcd::{FoundKey, MemoryReader};

fn reader(bytes: Vec<u8>) -> ArchiveReader<MemoryReader> {
    ArchiveReader::new(Arc::new(MemoryReader::new(bytes)))
}

#[tokio::test]
async fn test_read_directory() {
    let archive = reader(numbered(0, 10));
    let directory = archive.read_directory().await.unwrap();

    assert_eq!(directory.records().unwrap(), 10);
    assert_eq!(directory.entries().count(), 10);
    assert_eq!(directory.uniform().unwrap().stride(), 46 + 11);

    let data = archive.read_file_data(&directory).await.unwrap();
    assert_eq!(data.len() as u64, directory.data_len().unwrap());
    assert_eq!(&data[..4], b"PK\x03\x04");
}

#[tokio::test]
async fn test_find_keys_and_read_entries() {
    let archive = reader(numbered(0, 40));
    let names = ["entry-00031", "entry-99999", "entry-00000", "entry-00017"];

    let found = archive.find_keys(&names).await.unwrap();
    let found_names: Vec<&str> = found.iter().map(|k| k.name.as_str()).collect();
    assert_eq!(found_names, ["entry-00031", "entry-00000", "entry-00017"]);

    for key in &found {
        let i: usize = key.name["entry-".len()..].parse().unwrap();
        assert_eq!(key.compressed_size as usize, payload(i).len());

        let entry = archive.read_entry(key).await.unwrap();
        assert_eq!(entry.compression_method, CompressionMethod::Stored);
        assert_eq!(entry.data, payload(i));
        assert_eq!(
            archive.data_offset(key.offset).await.unwrap(),
            key.offset as u64 + 30 + 11
        );
    }
}

#[tokio::test]
async fn test_archive_comment_is_skipped() {
    let bytes = ArchiveBuilder::new()
        .stored("a", b"1")
        .stored("b", b"22")
        .comment(b"trailing archive comment")
        .build();
    let archive = reader(bytes);

    let found = archive.find_keys(&["b"]).await.unwrap();
    assert_eq!(
        found,
        vec![FoundKey {
            name: "b".into(),
            offset: 32,
            compressed_size: 2,
        }]
    );
}

#[tokio::test]
async fn test_empty_archive() {
    let archive = reader(ArchiveBuilder::new().build());
    let directory = archive.read_directory().await.unwrap();
    assert_eq!(directory.records().unwrap(), 0);
    assert!(archive.find_keys(&["x"]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejects_zip64_sentinels() {
    let mut bytes = numbered(0, 2);
    let eocd = bytes.len() - 22;
    bytes[eocd + 0x10..eocd + 0x14].copy_from_slice(&[0xff; 4]);

    let err = reader(bytes).read_directory().await.unwrap_err();
    assert_eq!(err.downcast_ref::<ZipError>(), Some(&ZipError::Zip64Unsupported));
}

#[tokio::test]
async fn test_rejects_record_count_disagreement() {
    let mut bytes = numbered(0, 3);
    let eocd = bytes.len() - 22;
    bytes[eocd + 0x0a] = 4;

    assert!(reader(bytes).read_directory().await.is_err());
}

#[tokio::test]
async fn test_not_a_zip() {
    assert!(reader(vec![0u8; 100]).read_directory().await.is_err());
    assert!(reader(Vec::new()).read_directory().await.is_err());
}

#[tokio::test]
async fn test_append_plan_in_memory() {
    let base = numbered(0, 5);
    let appended = numbered(5, 8);

    let base_dir = reader(base.clone()).read_directory().await.unwrap();
    let appended_archive = reader(appended);
    let appended_dir = appended_archive.read_directory().await.unwrap();
    let appended_data = appended_archive
        .read_file_data(&appended_dir)
        .await
        .unwrap();

    let plan = AppendPlan::new(&base_dir, &appended_dir, appended_data).unwrap();
    assert_eq!(plan.write_offset, base_dir.data_len().unwrap());
    assert_eq!(plan.appended_records, 3);
    assert_eq!(plan.end_record.record_count().unwrap(), 8);
    assert_eq!(plan.end_record.disk_record_count().unwrap(), 8);
    assert_eq!(&plan.directory[..base_dir.bytes().len()], base_dir.bytes());

    let mut merged = base[..plan.write_offset as usize].to_vec();
    merged.extend_from_slice(&plan.data);
    merged.extend_from_slice(&plan.directory);
    merged.extend_from_slice(plan.end_record.as_bytes());
    assert_eq!(merged.len() as u64, plan.final_len());

    let archive = reader(merged);
    let names: Vec<String> = (0..8).map(|i| format!("entry-{i:05}")).collect();
    let found = archive.find_keys(&names).await.unwrap();
    assert_eq!(found.len(), 8);
    for (i, key) in found.iter().enumerate() {
        assert_eq!(archive.read_entry(key).await.unwrap().data, payload(i));
    }
}

#[test]
fn test_append_plan_rejects_directory_past_4gib() {
    let mut end_record = EndOfCentralDirectory::empty();
    end_record.set_offset(u32::MAX - 10).unwrap();
    let base = CentralDirectory::new(end_record, Vec::new());

    let err = AppendPlan::new(&base, &CentralDirectory::empty(), vec![0u8; 11]).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ZipError>(),
        Some(&ZipError::Zip64Unsupported)
    );

    let plan = AppendPlan::new(&base, &CentralDirectory::empty(), vec![0u8; 10]).unwrap();
    assert_eq!(plan.end_record.offset().unwrap(), u32::MAX);
}
