use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use std::time::Duration;

use crate::io::HttpOptions;

#[derive(Parser, Debug)]
#[command(name = "zipcd")]
#[command(version)]
#[command(about = "Query and append sorted ZIP central directories", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipcd find data.zip entry-00042 entry-00043      print offsets and sizes\n  \
  zipcd find -p https://example.com/data.zip key   send a stored entry to stdout\n  \
  zipcd append data.zip batch.zip                  append batch.zip to data.zip\n  \
  zipcd init empty.zip                             create an archive with no entries")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More log output (-vv for debug, -vvv for trace)
    #[arg(short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode, errors only
    #[arg(short = 'q', global = true)]
    pub quiet: bool,

    /// HTTP request timeout in seconds
    #[arg(long, global = true, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// HTTP attempts per range before giving up
    #[arg(long, global = true, value_name = "N", default_value_t = 10,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub retries: u32,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Look up entries by binary search over the central directory
    Find(FindArgs),
    /// List central directory records
    List(ListArgs),
    /// Append one archive's entries to another
    Append(AppendArgs),
    /// Write an archive with no entries
    Init(InitArgs),
}

#[derive(Args, Debug)]
pub struct FindArgs {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Entry names to look up
    #[arg(value_name = "NAMES", required = true)]
    pub names: Vec<String>,

    /// Write stored entry contents to stdout
    #[arg(short = 'p')]
    pub pipe: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,
}

#[derive(Args, Debug)]
pub struct AppendArgs {
    /// Archive to append to, rewritten in place
    #[arg(value_name = "BASE")]
    pub base: String,

    /// Archive whose entries are appended
    #[arg(value_name = "APPENDED")]
    pub appended: String,

    /// Rename appended entries to PREFIX followed by a zero-padded counter
    #[arg(long, value_name = "PREFIX")]
    pub rename_prefix: Option<String>,

    /// First counter value for renamed entries
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub start: u64,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path of the archive to create
    #[arg(value_name = "FILE")]
    pub file: String,
}

impl Cli {
    /// Log level from -q/-v, or `None` to defer to `RUST_LOG`.
    pub fn log_level(&self) -> Option<LevelFilter> {
        if self.quiet {
            return Some(LevelFilter::Error);
        }
        match self.verbose {
            0 => None,
            1 => Some(LevelFilter::Info),
            2 => Some(LevelFilter::Debug),
            _ => Some(LevelFilter::Trace),
        }
    }
}

impl Cli {
    /// Settings for archives given as URLs.
    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            timeout: Duration::from_secs(self.timeout),
            max_retry: self.retries,
        }
    }
}

pub fn is_http_url(file: &str) -> bool {
    file.starts_with("http://") || file.starts_with("https://")
}
