use crate::assets::{AssetStore, AssetStoreError, ImageUpload};
use crate::models::ImageAssetRef;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory store that records every call, for asserting on asset traffic.
#[derive(Default)]
pub struct RecordingAssetStore {
    uploads: Mutex<Vec<ImageAssetRef>>,
    deletes: Mutex<Vec<String>>,
    live: Mutex<HashSet<String>>,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

impl RecordingAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn is_live(&self, id: &str) -> bool {
        self.live.lock().unwrap().contains(id)
    }
}

impl AssetStore for RecordingAssetStore {
    fn upload(&self, _image: &ImageUpload, folder: &str) -> Result<ImageAssetRef, AssetStoreError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(AssetStoreError::Provider("upload refused".into()));
        }
        let mut uploads = self.uploads.lock().unwrap();
        let id = format!("{}/asset-{}", folder, uploads.len() + 1);
        let asset = ImageAssetRef { url: format!("https://cdn.test/{}", id), id };
        uploads.push(asset.clone());
        self.live.lock().unwrap().insert(asset.id.clone());
        Ok(asset)
    }

    fn delete(&self, id: &str) -> Result<(), AssetStoreError> {
        self.deletes.lock().unwrap().push(id.to_string());
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AssetStoreError::Provider("delete refused".into()));
        }
        if self.live.lock().unwrap().remove(id) {
            Ok(())
        } else {
            Err(AssetStoreError::NotFound(id.to_string()))
        }
    }
}
