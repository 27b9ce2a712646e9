use std::{path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};

use crate::{DEFAULT_ACCESSIONS_FILE, DEFAULT_BASE_URL, DEFAULT_OUTPUT_DIR};

/// What to do with rows whose cell count doesn't match the header count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RowPolicy {
    /// Zip headers and cells, the shorter side wins.
    #[default]
    Truncate,
    /// Headers without a cell get an empty string. Extra cells are still dropped.
    Pad,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "amr_scrap")]
#[command(about = "Downloads NCBI BioSample antibiogram tables as JSON, one file per accession")]
pub struct Config {
    /// A file containing a list of NCBI BioSample accessions, one per line.
    #[arg(long, default_value = DEFAULT_ACCESSIONS_FILE)]
    pub accessions: PathBuf,

    /// The destination folder for all the exported tables.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// The accession to start from. Needs to be one of the provided list.
    #[arg(long = "first_acc", alias = "first-acc", default_value = "")]
    pub first_acc: String,

    /// Resume from the checkpoint in the output folder when --first_acc is empty.
    #[arg(long)]
    pub resume: bool,

    /// BioSample search endpoint, queried as `?term=<accession>`.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per request timeout in seconds, 0 waits forever.
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    #[arg(long, value_enum, default_value_t = RowPolicy::Truncate)]
    pub irregular_rows: RowPolicy,
}

impl Config {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// `None` when no explicit resume accession was given.
    pub fn first_accession(&self) -> Option<&str> {
        let acc = self.first_acc.trim();
        (!acc.is_empty()).then_some(acc)
    }
}
