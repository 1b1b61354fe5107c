//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use ikfetch_core::DocumentId;
use ikfetch_core::config::LOG_LEVELS;

/// Download documents, originals and citation sets from api.indiankanoon.org.
///
/// Exactly one mode runs per invocation, chosen in this order: document
/// fragment (`-d` with `-q`), single document (`-d`), search (`-q`), doctype
/// search (`-c`), query file (`-Q`), citedby expansion (`-C`).
#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
#[command(name = "ikfetch")]
#[command(author, version, about)]
pub struct Args {
    /// Log level (error|warning|info|debug|trace) [default: info]
    #[arg(short = 'l', long, value_parser = clap::builder::PossibleValuesParser::new(LOG_LEVELS))]
    pub loglevel: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(short = 'g', long)]
    pub logfile: Option<PathBuf>,

    /// Search every document of this doctype
    #[arg(short = 'c', long)]
    pub doctype: Option<String>,

    /// From date in DD-MM-YYYY format
    #[arg(short = 'f', long)]
    pub fromdate: Option<String>,

    /// To date in DD-MM-YYYY format
    #[arg(short = 't', long)]
    pub todate: Option<String>,

    /// Sort results by (mostrecent|leastrecent)
    #[arg(short = 'S', long)]
    pub sortby: Option<String>,

    /// Directory to store files (or `data_dir` in the config file)
    #[arg(short = 'D', long)]
    pub datadir: Option<PathBuf>,

    /// API shared token (or `token` in the config file)
    #[arg(short = 's', long = "sharedtoken")]
    pub token: Option<String>,

    /// Search query
    #[arg(short = 'q', long)]
    pub query: Option<String>,

    /// File with one query per line, processed by the worker pool
    #[arg(short = 'Q', long)]
    pub qfile: Option<PathBuf>,

    /// Document id
    #[arg(short = 'd', long)]
    pub docid: Option<DocumentId>,

    /// Also fetch the original court copy when one exists
    #[arg(short = 'o', long)]
    pub original: bool,

    /// Maximum cited documents returned with each detail (0 = upstream default)
    #[arg(short = 'm', long, default_value_t = 0)]
    pub maxcites: u32,

    /// Maximum citing documents returned with each detail (0 = upstream default)
    #[arg(short = 'M', long, default_value_t = 0)]
    pub maxcitedby: u32,

    /// Search result pages per call (1-100) [default: 1]
    #[arg(short = 'p', long, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub maxpages: Option<u32>,

    /// Stop a search after this many result windows (default: until exhausted)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub pagelimit: Option<u32>,

    /// Store documents by source/year/date instead of by result position
    #[arg(short = 'P', long)]
    pub pathbysrc: bool,

    /// Search only for documents that were added today
    #[arg(short = 'a', long)]
    pub addedtoday: bool,

    /// Number of workers for query files (1-64) [default: 5]
    #[arg(short = 'N', long, value_parser = clap::value_parser!(u64).range(1..=64))]
    pub workers: Option<u64>,

    /// Fetch citedby results for one or more document ids
    #[arg(short = 'C', long, num_args = 1.., value_name = "DOCID")]
    pub citedby: Vec<DocumentId>,

    /// Do not write toc.csv for searches
    #[arg(short = 'x', long = "no-csv")]
    pub no_csv: bool,

    /// Only count the documents a search finds; nothing is saved
    #[arg(short = 'n', long)]
    pub count: bool,

    /// With --citedby, also process citedby for documents linked from each seed
    #[arg(short = 'r', long)]
    pub level: bool,
}
