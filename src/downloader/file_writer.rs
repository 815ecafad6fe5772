use crate::constants::PARTIAL_SUFFIX;
use crate::errors::{AppError, AppResult};
use crate::models::validate_file_id;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Writes downloaded files into `output_dir`, one file per identifier.
///
/// Each file is written to `<id>.part` first and renamed once complete, so an
/// interrupted run never leaves a truncated file under its final name. Existing
/// files with the same name are replaced.
///
/// # Errors
///
/// Returns `InvalidInput` if the lengths differ or an identifier cannot be used
/// as a file name, and `IoError` if any filesystem operation fails.
pub async fn save_files(
    output_dir: &Path,
    file_ids: &[String],
    files: &[Vec<u8>],
) -> AppResult<Vec<PathBuf>> {
    if file_ids.len() != files.len() {
        return Err(AppError::InvalidInput(format!(
            "Got {} file ids but {} files",
            file_ids.len(),
            files.len()
        )));
    }
    for file_id in file_ids {
        validate_file_id(file_id)?;
    }

    if !output_dir.exists() {
        fs::create_dir_all(output_dir).await.map_err(|e| {
            AppError::IoError(format!(
                "Failed to create directory {}: {e}",
                output_dir.display()
            ))
        })?;
    }

    let mut written = Vec::with_capacity(files.len());
    for (file_id, bytes) in file_ids.iter().zip(files) {
        let file_path = output_dir.join(file_id);
        let tmp_path = output_dir.join(format!("{file_id}{PARTIAL_SUFFIX}"));
        write_atomically(&tmp_path, &file_path, bytes).await?;
        debug!(file_id = file_id.as_str(), path = %file_path.display(), "Saved file");
        written.push(file_path);
    }

    info!(
        files = written.len(),
        output_dir = %output_dir.display(),
        "Saved downloaded files"
    );
    Ok(written)
}

async fn write_atomically(tmp_path: &Path, file_path: &Path, bytes: &[u8]) -> AppResult<()> {
    // Remove stale tmp file if present (best-effort)
    if tmp_path.exists() {
        if let Err(e) = fs::remove_file(tmp_path).await {
            warn!(
                file_path = %tmp_path.display(),
                error = %e,
                "Failed to remove stale temp file"
            );
        }
    }

    let mut file = File::create(tmp_path).await.map_err(|e| {
        AppError::IoError(format!(
            "Failed to create temp file {}: {e}",
            tmp_path.display()
        ))
    })?;
    file.write_all(bytes).await.map_err(|e| {
        AppError::IoError(format!(
            "Failed to write to temp file {}: {e}",
            tmp_path.display()
        ))
    })?;
    file.flush().await?;

    // Ensure the file is closed before renaming
    drop(file);

    fs::rename(tmp_path, file_path).await.map_err(|e| {
        AppError::IoError(format!(
            "Failed to rename temp file {} to {}: {e}",
            tmp_path.display(),
            file_path.display()
        ))
    })?;

    Ok(())
}
