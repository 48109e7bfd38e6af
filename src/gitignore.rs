//! Keeps the config file (which holds the access token) out of version control

use crate::error::Result;
use std::path::Path;
use tracing::info;

/// Marker line written above the ignored config path
pub const IGNORE_MARKER: &str = "#figma-export-icons";

/// Append `config_path` to the `.gitignore` at `ignore_path`
///
/// Nothing happens when the config file does not exist or the entry is already
/// present. Returns `true` if the file was changed.
pub async fn ensure_config_ignored(ignore_path: &Path, config_path: &Path) -> Result<bool> {
    if tokio::fs::metadata(config_path).await.is_err() {
        return Ok(false);
    }

    let entry = format!("\n{}\n{}", IGNORE_MARKER, config_path.display());
    let current = match tokio::fs::read_to_string(ignore_path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    if current.contains(&entry) {
        return Ok(false);
    }

    tokio::fs::write(ignore_path, current + &entry).await?;
    info!(path = ?ignore_path, entry = %entry.trim(), "updated .gitignore");
    Ok(true)
}
