/// Preview ownership
///
/// Each adopted image gets one `PreviewHandle`; dropping the asset releases it.
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::ingest::ImageSource;

/// Identity of an adopted image; increases with every selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AssetId(pub u64);

/// Hands out preview handles and counts the ones still alive
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    live: Arc<AtomicUsize>,
    next_id: Arc<AtomicU64>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a decoded source into an asset holding a fresh preview handle
    pub fn acquire(&self, source: ImageSource) -> ImageAsset {
        let id = AssetId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let live = self.live.fetch_add(1, Ordering::AcqRel) + 1;
        debug!("acquired preview #{} for {} ({} live)", id.0, source.file_name, live);

        ImageAsset {
            id,
            source,
            _preview: PreviewHandle { id, live: self.live.clone() },
        }
    }

    /// Number of handles not yet released
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}

/// Exclusive ownership of the displayed preview.
///
/// Released exactly once, when it is dropped.
#[derive(Debug)]
pub struct PreviewHandle {
    id: AssetId,
    live: Arc<AtomicUsize>,
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        let remaining = self.live.fetch_sub(1, Ordering::AcqRel) - 1;
        debug!("released preview #{} ({} live)", self.id.0, remaining);
    }
}

/// The user's current image: source data plus its preview handle
#[derive(Debug)]
pub struct ImageAsset {
    pub id: AssetId,
    pub source: ImageSource,
    /// Held for its `Drop`
    _preview: PreviewHandle,
}

impl ImageAsset {
    /// Payload for the detection request
    pub fn upload(&self) -> ImageUpload {
        ImageUpload {
            file_name: self.source.file_name.clone(),
            mime: self.source.mime.clone(),
            bytes: self.source.bytes.clone(),
        }
    }
}

/// What the inference client sends; cheap to clone
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Arc<[u8]>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn source(name: &str) -> ImageSource {
        ImageSource {
            file_name: name.into(),
            mime: "image/png".into(),
            bytes: Arc::from(vec![1u8, 2, 3]),
            pixels: Arc::new(RgbaImage::new(4, 4)),
        }
    }

    #[test]
    fn test_ids_increase() {
        let registry = PreviewRegistry::new();
        let a = registry.acquire(source("a.png"));
        let b = registry.acquire(source("b.png"));
        assert!(b.id > a.id);
    }

    #[test]
    fn test_release_on_drop() {
        let registry = PreviewRegistry::new();
        let asset = registry.acquire(source("a.png"));
        assert_eq!(registry.live(), 1);

        drop(asset);
        assert_eq!(registry.live(), 0);
    }

    #[test]
    fn test_upload_shares_bytes() {
        let registry = PreviewRegistry::new();
        let asset = registry.acquire(source("a.png"));
        let upload = asset.upload();
        assert_eq!(upload.file_name, "a.png");
        assert!(Arc::ptr_eq(&upload.bytes, &asset.source.bytes));
    }
}
