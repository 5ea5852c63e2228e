//! Filesystem helpers for cache entries.

use std::path::Path;

use tokio::fs;
use tracing::debug;

use crate::error::{CacheError, CacheResult, Phase};

/// Read a file, `None` when it does not exist.
pub(crate) async fn read_optional(path: &Path) -> CacheResult<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CacheError::io(Phase::Read, path, e)),
    }
}

/// Write through a sibling temp file and rename into place.
pub(crate) async fn write_atomic(path: &Path, content: &[u8]) -> CacheResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| CacheError::io(Phase::Write, parent, e))?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, content)
        .await
        .map_err(|e| CacheError::io(Phase::Write, &temp_path, e))?;

    fs::rename(&temp_path, path)
        .await
        .map_err(|e| CacheError::io(Phase::Write, path, e))?;

    Ok(())
}

/// Remove a regular file. Absent files are fine; anything else is an error.
pub(crate) async fn remove_file(path: &Path) -> CacheResult<bool> {
    let meta = match fs::symlink_metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(CacheError::io(Phase::Remove, path, e)),
    };
    if !meta.is_file() {
        return Err(CacheError::io(Phase::Remove, path, "not a file"));
    }
    fs::remove_file(path)
        .await
        .map_err(|e| CacheError::io(Phase::Remove, path, e))?;
    debug!(path = %path.display(), "removed file");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn write_atomic_creates_parents_and_leaves_no_temp() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a").join("b").join("key.raw");

        write_atomic(&path, b"payload").await.unwrap();
        assert_eq!(fs::read(&path).await.unwrap(), b"payload");

        let mut entries = fs::read_dir(path.parent().unwrap()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            let name = entry.file_name();
            assert!(
                !name.to_string_lossy().ends_with(".tmp"),
                "temp file should not remain: {:?}",
                name
            );
        }
    }

    #[tokio::test]
    async fn read_optional_missing_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let got = read_optional(&temp_dir.path().join("nope")).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn remove_file_reports_what_it_did() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("key.json");
        fs::write(&path, b"{}").await.unwrap();

        assert!(remove_file(&path).await.unwrap());
        assert!(!remove_file(&path).await.unwrap());

        let dir = temp_dir.path().join("sub");
        fs::create_dir(&dir).await.unwrap();
        assert!(remove_file(&dir).await.is_err());
    }
}
