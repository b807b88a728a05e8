//! Image asset storage.
//!
//! Records only ever hold an [`ImageAssetRef`]; where the bytes live is up to
//! the [`AssetStore`] implementation. Uploads are fatal to a request when they
//! fail. Deletes are not: see [`release_asset`].

use crate::models::ImageAssetRef;
use thiserror::Error;

pub mod local;
#[cfg(test)]
pub mod recording;

pub const BLOG_IMAGES_FOLDER: &str = "blog_images";
pub const PROFILE_IMAGES_FOLDER: &str = "blog_profiles";

#[derive(Error, Debug)]
pub enum AssetStoreError {
    #[error("Asset storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported image type '{0}'")]
    UnsupportedType(String),
    #[error("Invalid asset folder '{0}'")]
    InvalidFolder(String),
    #[error("Invalid asset id '{0}'")]
    InvalidId(String),
    #[error("Asset '{0}' not found")]
    NotFound(String),
    #[error("Asset provider rejected the request: {0}")]
    Provider(String),
}

/// Raw image bytes received from a client, not yet stored anywhere.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub original_filename: Option<String>,
}

pub trait AssetStore: Send + Sync {
    /// Stores the bytes under `folder` and returns a fresh reference.
    fn upload(&self, image: &ImageUpload, folder: &str) -> Result<ImageAssetRef, AssetStoreError>;

    /// Removes the asset with the given id.
    fn delete(&self, id: &str) -> Result<(), AssetStoreError>;
}

/// Maps an accepted image MIME type to the extension it is stored under.
/// Anything not listed here is refused.
pub fn image_extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/gif" => Some("gif"),
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Releases an asset that no record references any more. A failed delete is
/// logged and swallowed; the record mutation stands.
pub fn release_asset(store: &dyn AssetStore, asset: &ImageAssetRef) {
    match store.delete(&asset.id) {
        Ok(()) => log::info!("Released image asset '{}'.", asset.id),
        Err(e) => log::warn!(
            "Failed to release image asset '{}'; it is now orphaned in the asset store: {}",
            asset.id,
            e
        ),
    }
}
