use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::models::{ImageUpload, StorageError, StorageResult};

const STAGING_DIR_NAME: &str = ".staging";

/// An image written to the staging area, not yet visible under its final path
#[derive(Debug, Clone, PartialEq)]
pub struct StagedImage {
    /// Path persisted in the menu table once committed
    pub image_path: String,
    pub staging_path: PathBuf,
    pub final_path: PathBuf,
}

/// Trait defining the interface for image file storage
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Write the upload to a staging location and compute its final path
    async fn stage(&self, image: &ImageUpload) -> StorageResult<StagedImage>;

    /// Move a staged image into its final place
    async fn commit(&self, staged: &StagedImage) -> StorageResult<()>;

    /// Remove a staged image that will not be committed
    async fn discard(&self, staged: &StagedImage) -> StorageResult<()>;

    /// Check whether a persisted image path exists
    async fn exists(&self, image_path: &str) -> StorageResult<bool>;
}

/// Image store backed by a local upload directory
pub struct LocalImageStore {
    upload_dir: PathBuf,
}

impl LocalImageStore {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    fn staging_dir(&self) -> PathBuf {
        self.upload_dir.join(STAGING_DIR_NAME)
    }

    /// Create the upload and staging directories
    pub async fn ensure_directories(&self) -> StorageResult<()> {
        let staging_dir = self.staging_dir();
        fs::create_dir_all(&staging_dir)
            .await
            .map_err(|e| StorageError::io(&staging_dir, e))?;
        Ok(())
    }

    /// Path string persisted for a stored file name
    fn image_path_for(&self, file_name: &str) -> String {
        let dir = self.upload_dir.to_string_lossy();
        let dir = dir.trim_end_matches(['/', '\\']);
        if dir.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", dir, file_name)
        }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    #[instrument(skip(self, image), fields(file_name = %image.file_name, size = image.bytes.len()))]
    async fn stage(&self, image: &ImageUpload) -> StorageResult<StagedImage> {
        let sanitized = image.sanitized_name();
        if sanitized.is_empty() {
            return Err(StorageError::InvalidFileName {
                file_name: image.file_name.clone(),
            });
        }

        self.ensure_directories().await?;

        let stored_name = image.stored_file_name();
        let staging_path = self
            .staging_dir()
            .join(format!("{}.{}", Uuid::new_v4().simple(), stored_name));
        let final_path = self.upload_dir.join(&stored_name);

        fs::write(&staging_path, &image.bytes)
            .await
            .map_err(|e| StorageError::io(&staging_path, e))?;

        info!(staging_path = %staging_path.display(), "Image staged");

        Ok(StagedImage {
            image_path: self.image_path_for(&stored_name),
            staging_path,
            final_path,
        })
    }

    #[instrument(skip(self), fields(final_path = %staged.final_path.display()))]
    async fn commit(&self, staged: &StagedImage) -> StorageResult<()> {
        fs::rename(&staged.staging_path, &staged.final_path)
            .await
            .map_err(|e| StorageError::io(&staged.final_path, e))?;

        info!("Image committed");
        Ok(())
    }

    #[instrument(skip(self), fields(staging_path = %staged.staging_path.display()))]
    async fn discard(&self, staged: &StagedImage) -> StorageResult<()> {
        match fs::remove_file(&staged.staging_path).await {
            Ok(()) => {
                info!("Staged image discarded");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Staged image already gone");
                Ok(())
            }
            Err(e) => Err(StorageError::io(&staged.staging_path, e)),
        }
    }

    async fn exists(&self, image_path: &str) -> StorageResult<bool> {
        fs::try_exists(image_path)
            .await
            .map_err(|e| StorageError::io(image_path, e))
    }
}
