//! Downloads the antibiogram table of NCBI BioSample records.
//!
//! For every accession in the input list the BioSample search page is fetched,
//! the table captioned "Antibiogram" is turned into JSON and written to
//! `<output>/<accession>_table.json`. Accessions whose page couldn't be fetched
//! end up in `<output>/unsuccessful.txt`.

mod macros;

pub mod accessions;
pub mod checkpoint;
pub mod config;
mod error;
pub mod parse;
pub mod process;
pub mod progress;
pub mod record;
pub mod request;
pub mod store;

pub use error::{Error, Result};

pub const DEFAULT_ACCESSIONS_FILE: &str = "ncbi_accessions.txt";
pub const DEFAULT_OUTPUT_DIR: &str = "files";
pub const DEFAULT_BASE_URL: &str = "https://www.ncbi.nlm.nih.gov/biosample/";
/// Caption text marking the antibiogram table on a BioSample page.
const TABLE_CAPTION: &str = "Antibiogram";
const FAILURE_REPORT_FILE: &str = "unsuccessful.txt";
const CHECKPOINT_FILE: &str = "last_accession.txt";
