use std::{io, path::Path};

use tokio::fs;

use crate::{Result, CHECKPOINT_FILE};

/// Last accession whose table was written, read from `<output_dir>/last_accession.txt`.
/// `None` if there is no checkpoint yet.
pub async fn load(output_dir: &Path) -> Result<Option<String>> {
    match fs::read_to_string(output_dir.join(CHECKPOINT_FILE)).await {
        Ok(content) => {
            let acc = content.trim();
            Ok((!acc.is_empty()).then(|| acc.to_string()))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Overwrites the checkpoint with `accession`.
pub async fn save(output_dir: &Path, accession: &str) -> Result<()> {
    fs::write(output_dir.join(CHECKPOINT_FILE), format!("{accession}\n")).await?;
    Ok(())
}
