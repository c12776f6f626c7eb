// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Laptop image metadata plus the pluggable sink that holds image bytes.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use uuid::Uuid;

/// Persistence backend for uploaded image bytes.
///
/// Object-safe for use as `Arc<dyn ArtifactSink>`.
pub trait ArtifactSink: Send + Sync + 'static {
    /// Persist `data` under `name` and return its location.
    fn write<'a>(
        &'a self,
        name: &'a str,
        data: Bytes,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;
}

/// Writes each image to `<folder>/<name>`.
#[derive(Debug, Clone)]
pub struct DiskSink {
    folder: PathBuf,
}

impl DiskSink {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self { folder: folder.into() }
    }
}

impl ArtifactSink for DiskSink {
    fn write<'a>(
        &'a self,
        name: &'a str,
        data: Bytes,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            tokio::fs::create_dir_all(&self.folder).await?;
            let path = self.folder.join(name);
            tokio::fs::write(&path, &data).await?;
            Ok(path.display().to_string())
        })
    }
}

/// Keeps image bytes in memory, keyed by location.
#[derive(Debug, Default)]
pub struct MemorySink {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, location: &str) -> Option<Bytes> {
        self.blobs.read().get(location).cloned()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl ArtifactSink for MemorySink {
    fn write<'a>(
        &'a self,
        name: &'a str,
        data: Bytes,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let location = format!("memory://{name}");
            self.blobs.write().insert(location.clone(), data);
            Ok(location)
        })
    }
}

/// Normalise an image type to a bare extension (`.JPG` → `JPG`).
///
/// Only ASCII alphanumerics are accepted, so the type can never steer a sink
/// write outside its folder.
pub fn normalize_image_type(raw: &str) -> Option<String> {
    let ext = raw.trim().trim_start_matches('.');
    if ext.is_empty() || ext.len() > 16 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_owned())
}

/// Metadata for a stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub id: String,
    pub laptop_id: String,
    pub image_type: String,
    pub path: String,
}

/// Image metadata keyed by image id.
pub struct ImageStore {
    sink: Arc<dyn ArtifactSink>,
    images: RwLock<HashMap<String, ImageInfo>>,
}

impl ImageStore {
    pub fn new(sink: Arc<dyn ArtifactSink>) -> Self {
        Self { sink, images: RwLock::new(HashMap::new()) }
    }

    /// Persist an image through the sink, then link it to `laptop_id`.
    ///
    /// Nothing is linked when the sink write fails.
    pub async fn save(
        &self,
        laptop_id: &str,
        image_type: &str,
        data: Bytes,
    ) -> anyhow::Result<String> {
        let id = Uuid::new_v4().to_string();
        let name = format!("{id}.{image_type}");
        let path = self.sink.write(&name, data).await?;

        let info = ImageInfo {
            id: id.clone(),
            laptop_id: laptop_id.to_owned(),
            image_type: image_type.to_owned(),
            path,
        };
        self.images.write().insert(id.clone(), info);
        Ok(id)
    }

    pub fn find(&self, id: &str) -> Option<ImageInfo> {
        self.images.read().get(id).cloned()
    }

    /// All images linked to one laptop.
    pub fn images_for(&self, laptop_id: &str) -> Vec<ImageInfo> {
        self.images.read().values().filter(|info| info.laptop_id == laptop_id).cloned().collect()
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
