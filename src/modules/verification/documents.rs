use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::modules::verification::error::VerificationError;
use crate::shared::error::{AppError, AppResult};

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "jpg", "jpeg", "png"];
pub const MAX_UPLOAD_SIZE: usize = 5 * 1024 * 1024;

/// One file from an upload batch, held in memory until the whole batch
/// has passed validation.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Validation gate for evidence files. Pure; called once per file before
/// anything is persisted.
pub fn validate_document(file_name: &str, size: usize) -> Result<(), VerificationError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(VerificationError::InvalidDocument(format!(
            "Unsupported file extension: '{}'. Allowed: {}.",
            ext,
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    if size > MAX_UPLOAD_SIZE {
        return Err(VerificationError::InvalidDocument(
            "File size exceeds maximum of 5MB.".to_string(),
        ));
    }

    Ok(())
}

/// Boundary to the file storage collaborator. Accepts bytes, hands back an
/// opaque reference; the workflow never inspects stored content again.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, file_name: &str, bytes: &[u8]) -> AppResult<String>;

    /// Best-effort removal, used to clean up after a failed submission
    /// transaction. Errors are logged and dropped.
    async fn remove(&self, file_ref: &str);
}

pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, file_name: &str, bytes: &[u8]) -> AppResult<String> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::InternalServerError(format!("Failed to create upload dir: {}", e))
        })?;

        // Uploaded names are untrusted; keep only the final path component.
        let base = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document");
        let file_ref = format!("{}_{}", uuid::Uuid::new_v4(), base);

        tokio::fs::write(self.root.join(&file_ref), bytes)
            .await
            .map_err(|e| {
                AppError::InternalServerError(format!("Failed to store document: {}", e))
            })?;

        Ok(file_ref)
    }

    async fn remove(&self, file_ref: &str) {
        if let Err(e) = tokio::fs::remove_file(self.root.join(file_ref)).await {
            tracing::warn!("Failed to remove orphaned document {}: {}", file_ref, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_extensions_case_insensitively() {
        for name in ["id.pdf", "id.PDF", "scan.jpg", "scan.JPEG", "photo.png"] {
            assert!(validate_document(name, 1024).is_ok(), "{} rejected", name);
        }
    }

    #[test]
    fn rejects_disallowed_extensions() {
        for name in ["malware.exe", "notes.txt", "archive.tar.gz", "noext"] {
            assert!(matches!(
                validate_document(name, 1024),
                Err(VerificationError::InvalidDocument(_))
            ));
        }
    }

    #[test]
    fn rejects_oversized_files() {
        assert!(validate_document("id.pdf", MAX_UPLOAD_SIZE).is_ok());
        assert!(matches!(
            validate_document("id.pdf", MAX_UPLOAD_SIZE + 1),
            Err(VerificationError::InvalidDocument(_))
        ));
    }
}
