use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;

use crate::{domain::AppError, utils::sanitize_filename};

/// Where finished downloads are persisted
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn persist(&self, file_name: &str, payload: Bytes) -> Result<PathBuf, AppError>;
}

/// Writes the payload to `path`; the file is closed before returning
async fn write_file(path: &Path, payload: &[u8]) -> Result<(), AppError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| AppError::SaveError(format!("Failed to create file: {}", e)))?;

    file.write_all(payload)
        .await
        .map_err(|e| AppError::SaveError(format!("Write error: {}", e)))?;

    file.sync_all()
        .await
        .map_err(|e| AppError::SaveError(format!("Failed to sync file: {}", e)))?;

    Ok(())
}

/// Saves into a fixed directory without asking
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn persist(&self, file_name: &str, payload: Bytes) -> Result<PathBuf, AppError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::SaveError(format!("Failed to create directory: {}", e)))?;

        let name = sanitize_filename(file_name);
        if name.is_empty() {
            return Err(AppError::SaveError("empty file name".to_string()));
        }

        let path = self.dir.join(name);
        write_file(&path, &payload).await?;
        Ok(path)
    }
}

/// Asks the user for a location with a native save dialog
#[derive(Debug, Clone, Default)]
pub struct DialogSink;

#[async_trait]
impl ArtifactSink for DialogSink {
    async fn persist(&self, file_name: &str, payload: Bytes) -> Result<PathBuf, AppError> {
        let path = rfd::AsyncFileDialog::new()
            .set_file_name(file_name)
            .save_file()
            .await
            .map(|handle| handle.path().to_path_buf())
            .ok_or_else(|| AppError::SaveError("no save location chosen".to_string()))?;

        write_file(&path, &payload).await?;
        Ok(path)
    }
}
