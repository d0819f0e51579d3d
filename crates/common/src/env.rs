//! Environment/runtime helpers
//!
//! Sanity checks to ensure the data directory exists at startup.

use std::path::Path;

use tracing::{info, warn};

/// Ensure the directory holding the counter file exists; note when the file
/// itself is absent (it is created on first access).
pub async fn ensure_data_dir(clicks_file: &Path) -> anyhow::Result<()> {
    if let Some(parent) = clicks_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
    }
    match tokio::fs::metadata(clicks_file).await {
        Ok(meta) if meta.is_dir() => {
            warn!(path = %clicks_file.display(), "clicks file path is a directory; saves will fail");
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %clicks_file.display(), "clicks file not found; it will be created on first request");
        }
        Err(e) => {
            warn!(path = %clicks_file.display(), error = %e, "cannot inspect clicks file; requests may fail");
        }
    }
    Ok(())
}
