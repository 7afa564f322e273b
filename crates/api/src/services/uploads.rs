//! Image uploads for categories and products.
//!
//! Files are written to the configured upload directory under a generated
//! name (`<unix millis>-<random hex>.<ext>`) and referenced by their public
//! path, `/uploads/<name>`, which the router serves from the same directory.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use chrono::Utc;
use thiserror::Error;

/// Public URL prefix uploaded files are served under.
pub const UPLOADS_PREFIX: &str = "/uploads";

/// Largest accepted upload.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Errors from accepting or storing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Only image files are allowed (got {0})")]
    NotAnImage(String),
    #[error("Image must be at most {max} bytes")]
    TooLarge { max: usize },
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// A file part received in a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Client-supplied file name, used only for its extension.
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedImage {
    /// Check content type and size.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::NotAnImage` unless the content type is `image/*`,
    /// and `UploadError::TooLarge` above [`MAX_IMAGE_BYTES`].
    pub fn validate(&self) -> Result<(), UploadError> {
        let content_type = self.content_type.as_deref().unwrap_or("unknown");
        if !content_type.starts_with("image/") {
            return Err(UploadError::NotAnImage(content_type.to_owned()));
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(UploadError::TooLarge {
                max: MAX_IMAGE_BYTES,
            });
        }
        Ok(())
    }

    /// File extension to store under, from the file name or content type.
    fn extension(&self) -> Option<String> {
        let from_name = self
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| {
                !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .map(str::to_ascii_lowercase);

        from_name.or_else(|| {
            let subtype = self.content_type.as_deref()?.strip_prefix("image/")?;
            let ext = match subtype {
                "jpeg" => "jpg",
                "svg+xml" => "svg",
                other if other.chars().all(|c| c.is_ascii_alphanumeric()) => other,
                _ => return None,
            };
            Some(ext.to_owned())
        })
    }
}

/// Writes uploaded images to disk.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory files are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validate and store an image, returning its public path.
    ///
    /// # Errors
    ///
    /// Returns `UploadError` if the image is rejected or cannot be written.
    pub async fn save(&self, image: &UploadedImage) -> Result<String, UploadError> {
        image.validate()?;

        let file_name = generate_file_name(image.extension().as_deref());
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&file_name), &image.bytes).await?;

        tracing::info!(file = %file_name, bytes = image.bytes.len(), "Stored upload");

        Ok(format!("{UPLOADS_PREFIX}/{file_name}"))
    }
}

/// `<unix millis>-<8 hex digits>[.ext]`
fn generate_file_name(extension: Option<&str>) -> String {
    let stem = format!("{}-{:08x}", Utc::now().timestamp_millis(), rand::random::<u32>());
    match extension {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}
