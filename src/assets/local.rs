use crate::assets::{image_extension_for, AssetStore, AssetStoreError, ImageUpload};
use crate::models::ImageAssetRef;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Stores images on local disk under `MEDIA_PATH`, sharded by the first two
/// byte pairs of a random UUID. Ids are paths relative to the media root,
/// which is served at `<public base url>/media`.
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    root: PathBuf,
    base_url: String,
}

impl LocalAssetStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        LocalAssetStore {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn url_for(&self, id: &str) -> String {
        format!("{}/{}", self.base_url, id)
    }

    /// Resolves an id to a path, refusing anything that could escape the root.
    fn path_for(&self, id: &str) -> Result<PathBuf, AssetStoreError> {
        let relative = Path::new(id);
        let is_plain = !id.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(AssetStoreError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl AssetStore for LocalAssetStore {
    fn upload(&self, image: &ImageUpload, folder: &str) -> Result<ImageAssetRef, AssetStoreError> {
        if folder.is_empty() || !folder.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AssetStoreError::InvalidFolder(folder.to_string()));
        }
        let ext = image_extension_for(&image.content_type)
            .ok_or_else(|| AssetStoreError::UnsupportedType(image.content_type.clone()))?;

        let file_id = Uuid::new_v4().to_string();
        let id = format!("{}/{}/{}/{}.{}", folder, &file_id[0..2], &file_id[2..4], file_id, ext);
        let path = self.path_for(&id)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &image.bytes)?;

        log::debug!(
            "Stored '{}' ({} bytes) as asset '{}'.",
            image.original_filename.as_deref().unwrap_or("unnamed upload"),
            image.bytes.len(),
            id
        );
        Ok(ImageAssetRef { url: self.url_for(&id), id })
    }

    fn delete(&self, id: &str) -> Result<(), AssetStoreError> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AssetStoreError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
