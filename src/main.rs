//! Main entry point for the zipcd CLI application.
//!
//! Looks up entries in sorted archives (local or over HTTP Range requests)
//! and appends archives to each other by merging their central directories.

use anyhow::{Result, bail};
use clap::Parser;
use log::{LevelFilter, info};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use zipcd::cli::{AppendArgs, Command, FindArgs, InitArgs, ListArgs, is_http_url};
use zipcd::zip::{
    AppendOptions, ArchiveReader, CompressionMethod, SequentialNamer, append_archive,
    write_empty_archive,
};
use zipcd::{Cli, HttpOptions, HttpRangeReader, LocalFileReader, ReadAt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level());
    let http = cli.http_options();

    match cli.command {
        Command::Find(args) => {
            with_reader(&args.file.clone(), http, |reader| find(reader, args)).await
        }
        Command::List(args) => {
            with_reader(&args.file.clone(), http, |reader| list(reader, args)).await
        }
        Command::Append(args) => append(args).await,
        Command::Init(args) => init(args).await,
    }
}

/// Route `RUST_LOG` through env_logger, with -q/-v taking precedence.
fn init_logging(level: Option<LevelFilter>) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Warn);
    builder.parse_env("RUST_LOG");
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.init();
}

/// Open `file` as a local path or HTTP URL and run `op` on it.
async fn with_reader<F, Fut>(file: &str, http: HttpOptions, op: F) -> Result<()>
where
    F: FnOnce(Arc<dyn ReadAt>) -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    if is_http_url(file) {
        let reader = HttpRangeReader::with_options(file.to_string(), http).await?;
        let reader = Arc::new(reader);
        op(reader.clone()).await?;
        info!("Total bytes transferred: {}", format_size(reader.transferred_bytes()));
        Ok(())
    } else {
        op(Arc::new(LocalFileReader::new(Path::new(file))?)).await
    }
}

/// Print `name offset compressed_size` for each hit, or the payloads with -p.
async fn find(reader: Arc<dyn ReadAt>, args: FindArgs) -> Result<()> {
    let archive = ArchiveReader::new(reader);
    let found = archive.find_keys(&args.names).await?;

    let mut stdout = tokio::io::stdout();
    for key in &found {
        if args.pipe {
            let entry = archive.read_entry(key).await?;
            if entry.compression_method != CompressionMethod::Stored {
                bail!(
                    "Unsupported compression method for {}: {} (only STORED is supported)",
                    key.name,
                    entry.compression_method.as_u16()
                );
            }
            stdout.write_all(&entry.data).await?;
        } else {
            stdout
                .write_all(
                    format!("{}\t{}\t{}\n", key.name, key.offset, key.compressed_size).as_bytes(),
                )
                .await?;
        }
    }
    stdout.flush().await?;

    if found.len() < args.names.len() {
        info!("{} of {} names not found", args.names.len() - found.len(), args.names.len());
    }
    Ok(())
}

/// Walk the directory by real record length and print each record.
async fn list(reader: Arc<dyn ReadAt>, _args: ListArgs) -> Result<()> {
    let archive = ArchiveReader::new(reader);
    let directory = archive.read_directory().await?;

    println!(
        "{:>6}  {:>10}  {:>10}  {:>6}  Name",
        "Index", "Offset", "Size", "Method"
    );
    println!("{}", "-".repeat(60));
    for (index, header) in directory.entries().enumerate() {
        let entry = header?.to_entry()?;
        println!(
            "{:>6}  {:>10}  {:>10}  {:>6}  {}",
            index,
            entry.offset,
            entry.compressed_size,
            entry.compression_method.as_u16(),
            entry.name
        );
    }
    println!("{}", "-".repeat(60));
    println!(
        "{} records, {} bytes of file data",
        directory.records()?,
        format_size(directory.data_len()?)
    );
    Ok(())
}

async fn append(args: AppendArgs) -> Result<()> {
    let mut namer = args
        .rename_prefix
        .map(|prefix| SequentialNamer::fitted(prefix, args.start));
    let options = AppendOptions {
        namer: namer.as_mut(),
    };

    let plan = append_archive(Path::new(&args.base), Path::new(&args.appended), options).await?;
    println!(
        "appended {} entries at offset {} ({} total)",
        plan.appended_records,
        plan.write_offset,
        format_size(plan.final_len())
    );
    if let Some(namer) = namer {
        println!("next counter: {}", namer.peek());
    }
    Ok(())
}

async fn init(args: InitArgs) -> Result<()> {
    write_empty_archive(Path::new(&args.file)).await?;
    info!("created empty archive {}", args.file);
    Ok(())
}

/// Format a byte size into a human-readable string.
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
