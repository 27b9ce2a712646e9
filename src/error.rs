use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The selector you are trying to scrape for is missing. Selector: {0}")]
    ParseMissingSelector(String),

    #[error("Couldn't read the accession list {path}: {source}")]
    InputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Couldn't prepare the output directory {path}: {reason}")]
    OutputDir { path: PathBuf, reason: String },

    #[error(
        "Resume accession '{accession}' is not in {input}. \
         Pass one of the listed accessions to --first_acc or leave it empty to start from the top."
    )]
    ResumeAccessionNotFound { accession: String, input: PathBuf },

    #[error("Accession '{0}' can't be used as a file name")]
    UnsafeAccession(String),

    #[error("Progress bar template error: {0}")]
    ProgressTemplate(#[from] indicatif::style::TemplateError),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
}
