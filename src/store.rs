use std::path::{Path, PathBuf};

use tokio::{fs, fs::File, io::AsyncWriteExt};

use crate::{record::AntibiogramRecord, Error, Result, FAILURE_REPORT_FILE};

/// Creates `dir` (and parents) unless it already exists as a directory.
pub async fn ensure_output_dir(dir: &Path) -> Result<()> {
    let output_dir_err = |reason: String| Error::OutputDir {
        path: dir.to_path_buf(),
        reason,
    };
    match fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(output_dir_err("path exists but is not a directory".into())),
        Err(_) => fs::create_dir_all(dir)
            .await
            .map_err(|e| output_dir_err(e.to_string())),
    }
}

/// `<output_dir>/<accession>_table.json`. Accessions that would leave `output_dir`
/// or name a subdirectory are refused.
pub fn table_path(output_dir: &Path, accession: &str) -> Result<PathBuf> {
    let unsafe_name = accession.is_empty()
        || accession == "."
        || accession == ".."
        || accession.contains(['/', '\\', '\0']);
    if unsafe_name {
        return Err(Error::UnsafeAccession(accession.to_string()));
    }
    Ok(output_dir.join(format!("{accession}_table.json")))
}

/// Writes the rows as a JSON array to `<output_dir>/<accession>_table.json`.
/// An empty table is still written as `[]`.
pub async fn write_table(
    output_dir: &Path,
    accession: &str,
    records: &[AntibiogramRecord],
) -> Result<PathBuf> {
    let path = table_path(output_dir, accession)?;
    let bytes = serde_json::to_vec(records)?;
    let mut file = File::create(&path).await?;
    file.write_all(&bytes).await?;
    file.flush().await?;
    Ok(path)
}

/// Writes the failed accessions one per line to `<output_dir>/unsuccessful.txt`.
pub async fn write_failure_report(output_dir: &Path, failed: &[String]) -> Result<PathBuf> {
    let path = output_dir.join(FAILURE_REPORT_FILE);
    let content = failed
        .iter()
        .flat_map(|acc| [acc.as_str(), "\n"])
        .collect::<String>();
    let mut file = File::create(&path).await?;
    file.write_all(content.as_bytes()).await?;
    file.flush().await?;
    Ok(path)
}
