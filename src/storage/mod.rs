//! Persistence for the watcher.
//!
//! ## Files
//!
//! ```text
//! public/
//! ├── state.json   # Dedup ledger: {"seen_keys": [...]}
//! ├── data.json    # Structured output of the latest run
//! └── data.csv     # Flattened output of the latest run
//! ```
//!
//! Every file is written to a sibling `*.tmp` first and renamed into place,
//! so a crash mid-write leaves the previous version intact.

pub mod ledger;
pub mod output;

use std::path::Path;

use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

// Re-export for convenience
pub use ledger::{Ledger, LedgerStore, merge};
pub use output::{OutputSink, RunMeta};

/// Ensure the parent directory of a path exists.
async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// Write bytes atomically (write to temp, then rename).
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent(path).await?;

    let file_name = path
        .file_name()
        .ok_or_else(|| AppError::config(format!("{} is not a file path", path.display())))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Read bytes, returning None if the file doesn't exist.
pub async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Io(e)),
    }
}
