// src/services/media.rs
//
// Image storage for profile pictures and product images. Uploads go to S3
// when AWS is configured, otherwise to a local directory served back at
// /api/media/:prefix/:filename.

use std::path::PathBuf;
use std::sync::Arc;

use infer::Infer;
use thiserror::Error;
use tokio::fs as tokio_fs;
use tracing::{error, info};

use super::aws::{AwsError, AwsService};
use crate::common::generate_raw_id;

/// Upload size cap in bytes (5MB)
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// Storage prefix for profile pictures
pub const PREFIX_AVATARS: &str = "avatars";
/// Storage prefix for product images
pub const PREFIX_PRODUCTS: &str = "products";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("File size exceeds 5MB limit")]
    TooLarge,

    #[error("Invalid image type. Only JPEG, PNG, GIF, and WebP are supported")]
    InvalidImage,

    #[error("Media file not found")]
    NotFound,

    #[error("Failed to store media file: {0}")]
    Storage(String),

    #[error(transparent)]
    Aws(#[from] AwsError),
}

impl From<MediaError> for crate::common::ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::TooLarge | MediaError::InvalidImage => {
                crate::common::ApiError::BadRequest(err.to_string())
            }
            MediaError::NotFound => crate::common::ApiError::NotFound(err.to_string()),
            MediaError::Storage(_) | MediaError::Aws(_) => {
                error!(error = %err, "Media storage operation failed");
                crate::common::ApiError::InternalServer("Media storage failed".to_string())
            }
        }
    }
}

#[derive(Debug)]
pub struct MediaService {
    aws: Arc<AwsService>,
    media_dir: PathBuf,
}

impl MediaService {
    pub fn new(aws: Arc<AwsService>, media_dir: PathBuf) -> Self {
        Self { aws, media_dir }
    }

    /// Validate and persist an image, returning its public URL
    pub async fn store_image(
        &self,
        prefix: &str,
        data: &[u8],
        extension: &str,
    ) -> Result<String, MediaError> {
        if data.len() > MAX_IMAGE_SIZE {
            return Err(MediaError::TooLarge);
        }

        if !is_valid_image_type(data) {
            return Err(MediaError::InvalidImage);
        }

        let filename = format!("{}.{}", generate_raw_id(12), extension);

        if self.aws.is_configured() {
            let key = format!("{}/{}", prefix, filename);
            let content_type = content_type_for_extension(extension);
            let url = self
                .aws
                .upload_file(data.to_vec(), &key, content_type)
                .await?;
            return Ok(url);
        }

        // Local fallback
        let dir = self.media_dir.join(prefix);
        tokio_fs::create_dir_all(&dir).await.map_err(|e| {
            error!(error = %e, dir = %dir.display(), "Failed to create media directory");
            MediaError::Storage("Failed to create media directory".to_string())
        })?;

        let file_path = dir.join(&filename);
        tokio_fs::write(&file_path, data).await.map_err(|e| {
            error!(error = %e, file_path = %file_path.display(), "Failed to save media file");
            MediaError::Storage("Failed to save media file".to_string())
        })?;

        info!(prefix = %prefix, filename = %filename, "Media file saved locally");

        Ok(format!("/api/media/{}/{}", prefix, filename))
    }

    /// Delete a previously stored image by its public URL.
    /// Unknown or external URLs are ignored.
    pub async fn delete_image(&self, url: &str) -> Result<(), MediaError> {
        if let Some(rest) = url.strip_prefix("/api/media/") {
            let mut parts = rest.splitn(2, '/');
            let prefix = parts.next().unwrap_or_default();
            let filename = sanitize_filename(parts.next().unwrap_or_default());
            let file_path = self.media_dir.join(prefix).join(&filename);
            if file_path.exists() {
                tokio_fs::remove_file(&file_path).await.map_err(|e| {
                    error!(error = %e, file_path = %file_path.display(), "Failed to delete media file");
                    MediaError::Storage("Failed to delete media file".to_string())
                })?;
            }
            return Ok(());
        }

        if let Some(pos) = url.find(".amazonaws.com/") {
            let key = &url[pos + ".amazonaws.com/".len()..];
            if !key.is_empty() {
                self.aws.delete_file(key).await?;
            }
        }

        Ok(())
    }

    /// Read a locally stored image for serving
    pub async fn read_local(&self, prefix: &str, filename: &str) -> Result<Vec<u8>, MediaError> {
        if prefix != PREFIX_AVATARS && prefix != PREFIX_PRODUCTS {
            return Err(MediaError::NotFound);
        }

        let safe_filename = sanitize_filename(filename);
        let file_path = self.media_dir.join(prefix).join(&safe_filename);

        if !file_path.exists() {
            return Err(MediaError::NotFound);
        }

        tokio_fs::read(&file_path)
            .await
            .map_err(|_| MediaError::Storage("Failed to read media file".to_string()))
    }
}

pub fn is_valid_image_type(data: &[u8]) -> bool {
    let infer = Infer::new();
    if let Some(info) = infer.get(data) {
        matches!(
            info.mime_type(),
            "image/jpeg" | "image/jpg" | "image/png" | "image/gif" | "image/webp"
        )
    } else {
        false
    }
}

pub fn content_type_for_extension(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

pub fn extension_from_filename(filename: &str) -> Option<&str> {
    filename
        .split('.')
        .last()
        .filter(|ext| matches!(*ext, "jpg" | "jpeg" | "png" | "gif" | "webp"))
}

pub fn sanitize_filename(filename: &str) -> String {
    // Remove path traversal sequences and directory separators
    let cleaned = filename
        .replace("..", "")
        .replace("/", "")
        .replace("\\", "")
        .replace("\0", "");

    // Whitelist safe characters: alphanumeric, dots, hyphens, underscores
    let sanitized: String = cleaned
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '.' || *c == '-' || *c == '_')
        .collect();

    let max_length = 255;
    let truncated = if sanitized.len() > max_length {
        sanitized.chars().take(max_length).collect()
    } else {
        sanitized
    };

    if truncated.is_empty() {
        "sanitized_file".to_string()
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal PNG header; enough for content sniffing
    const PNG_BYTES: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ];

    fn test_service() -> MediaService {
        let dir = std::env::temp_dir().join(format!("media_test_{}", generate_raw_id(8)));
        MediaService::new(Arc::new(AwsService::new(None)), dir)
    }

    #[test]
    fn test_sanitize_filename_blocks_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_filename("a/b\\c.png"), "abc.png");
        assert_eq!(sanitize_filename(""), "sanitized_file");
    }

    #[test]
    fn test_image_sniffing() {
        assert!(is_valid_image_type(PNG_BYTES));
        assert!(!is_valid_image_type(b"just some text"));
    }

    #[test]
    fn test_extension_from_filename() {
        assert_eq!(extension_from_filename("photo.PNG"), None); // case-sensitive whitelist
        assert_eq!(extension_from_filename("photo.png"), Some("png"));
        assert_eq!(extension_from_filename("archive.zip"), None);
    }

    #[tokio::test]
    async fn test_store_and_delete_local_image() {
        let media = test_service();

        let url = media
            .store_image(PREFIX_PRODUCTS, PNG_BYTES, "png")
            .await
            .unwrap();
        assert!(url.starts_with("/api/media/products/"));

        let filename = url.rsplit('/').next().unwrap().to_string();
        let stored = media.read_local(PREFIX_PRODUCTS, &filename).await.unwrap();
        assert_eq!(stored, PNG_BYTES);

        media.delete_image(&url).await.unwrap();
        assert!(matches!(
            media.read_local(PREFIX_PRODUCTS, &filename).await,
            Err(MediaError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_store_rejects_non_image() {
        let media = test_service();
        let result = media
            .store_image(PREFIX_AVATARS, b"definitely not an image", "png")
            .await;
        assert!(matches!(result, Err(MediaError::InvalidImage)));
    }

    #[tokio::test]
    async fn test_store_rejects_oversized_image() {
        let media = test_service();
        let mut big = PNG_BYTES.to_vec();
        big.resize(MAX_IMAGE_SIZE + 1, 0);
        let result = media.store_image(PREFIX_AVATARS, &big, "png").await;
        assert!(matches!(result, Err(MediaError::TooLarge)));
    }

    #[tokio::test]
    async fn test_read_local_rejects_unknown_prefix() {
        let media = test_service();
        let result = media.read_local("secrets", "anything.png").await;
        assert!(matches!(result, Err(MediaError::NotFound)));
    }
}
