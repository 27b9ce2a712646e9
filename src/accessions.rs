use std::path::Path;

use crate::{Error, Result};

/// Where a run starts inside the full accession list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Accessions still to process, in list order.
    pub pending: Vec<String>,
    /// Index of `pending[0]` in the full list.
    pub start_index: usize,
    /// Length of the full list, used as the progress total.
    pub total: usize,
}

/// Reads one accession per line. Lines are trimmed and blank ones skipped.
pub async fn load_accessions(path: &Path) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path).await.map_err(|source| Error::InputFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_accessions(&content))
}

pub fn parse_accessions(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Cuts the list at the first occurrence of `first` (inclusive).
/// An accession that isn't listed is an error, the run must not start.
pub fn plan_run(accessions: Vec<String>, first: Option<&str>, input: &Path) -> Result<Plan> {
    let total = accessions.len();
    let start_index = match first {
        None => 0,
        Some(first) => accessions
            .iter()
            .position(|acc| acc == first)
            .ok_or_else(|| Error::ResumeAccessionNotFound {
                accession: first.to_string(),
                input: input.to_path_buf(),
            })?,
    };
    let mut pending = accessions;
    pending.drain(..start_index);
    Ok(Plan {
        pending,
        start_index,
        total,
    })
}
