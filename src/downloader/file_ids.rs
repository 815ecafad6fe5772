use crate::errors::{AppError, AppResult};
use std::path::Path;

/// Parses a newline-delimited list of file identifiers.
///
/// Whitespace is trimmed; blank lines and lines starting with `#` are skipped.
/// Order and duplicates are kept as written.
pub fn parse_file_ids(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Reads identifiers from a file, one per line.
pub fn read_file_ids(path: &Path) -> AppResult<Vec<String>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::IoError(format!("Failed to read ids file {}: {e}", path.display()))
    })?;
    Ok(parse_file_ids(&contents))
}

/// Concatenates identifiers given inline with those read from an ids file.
pub fn collect_file_ids(inline: Vec<String>, ids_file: Option<&Path>) -> AppResult<Vec<String>> {
    let mut ids = inline;
    if let Some(path) = ids_file {
        ids.extend(read_file_ids(path)?);
    }
    Ok(ids)
}
