/// Image ingestion
///
/// This module handles:
/// - Validating a picked or dropped file list (first entry only)
/// - Checking the declared MIME type is an image type
/// - Reading and decoding the file into RGBA pixels

use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, info};

use crate::error::{DetectError, DetectResult};

/// Extensions offered by the file picker and listed in the UI hint
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "gif", "bmp"];

/// A decoded image ready to be adopted by the session.
///
/// Plain data: cloning shares the byte and pixel buffers.
#[derive(Clone)]
pub struct ImageSource {
    /// Filename only (e.g., "field_03.jpg")
    pub file_name: String,
    /// Declared MIME type, e.g. "image/jpeg"
    pub mime: String,
    /// Original file content, sent as-is to the detection API
    pub bytes: Arc<[u8]>,
    /// Decoded pixels at native resolution
    pub pixels: Arc<RgbaImage>,
}

impl ImageSource {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

// Pixel buffers are far too large to print
impl std::fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSource")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("bytes", &self.bytes.len())
            .field("size", &(self.width(), self.height()))
            .finish()
    }
}

/// Load the first file of a selection without blocking the UI thread
pub async fn load_selection(paths: Vec<PathBuf>) -> DetectResult<ImageSource> {
    // Decoding is CPU-bound
    task::spawn_blocking(move || read_selection(&paths))
        .await
        .map_err(|e| DetectError::InvalidInput(format!("Image loading was interrupted: {}", e)))?
}

/// Blocking implementation of selection loading
pub fn read_selection(paths: &[PathBuf]) -> DetectResult<ImageSource> {
    let path = paths
        .first()
        .ok_or_else(|| DetectError::InvalidInput("No file was selected.".into()))?;

    if paths.len() > 1 {
        debug!("{} files selected, using {}", paths.len(), path.display());
    }

    let mime = declared_image_type(path)?;
    let file_name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    let bytes = std::fs::read(path)
        .map_err(|e| DetectError::InvalidInput(format!("Could not read {}: {}", file_name, e)))?;

    let pixels = image::load_from_memory(&bytes)
        .map_err(|e| DetectError::InvalidInput(format!("{} is not a readable image: {}", file_name, e)))?
        .to_rgba8();

    info!("🖼️  Loaded {} ({}x{}, {} KB)", file_name, pixels.width(), pixels.height(), bytes.len() / 1024);

    Ok(ImageSource {
        file_name,
        mime,
        bytes: Arc::from(bytes),
        pixels: Arc::new(pixels),
    })
}

/// MIME type guessed from the file name; anything outside `image/*` is rejected
fn declared_image_type(path: &Path) -> DetectResult<String> {
    let mime = mime_guess::from_path(path).first();
    match mime {
        Some(mime) if mime.type_() == mime_guess::mime::IMAGE => Ok(mime.essence_str().to_string()),
        _ => Err(DetectError::InvalidInput("Please upload an image file.".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(8, 6, Rgba([10, 200, 30, 255])).save(&path).unwrap();
        path
    }

    #[test]
    fn test_reads_first_image() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_png(dir.path(), "field.png");
        let second = write_png(dir.path(), "other.png");

        let source = read_selection(&[first, second]).unwrap();
        assert_eq!(source.file_name, "field.png");
        assert_eq!(source.mime, "image/png");
        assert_eq!((source.width(), source.height()), (8, 6));
        assert!(!source.bytes.is_empty());
    }

    #[test]
    fn test_empty_selection_is_invalid() {
        let err = read_selection(&[]).unwrap_err();
        assert!(matches!(err, DetectError::InvalidInput(_)));
    }

    #[test]
    fn test_non_image_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "not a picture").unwrap();

        let err = read_selection(&[path]).unwrap_err();
        assert_eq!(err, DetectError::InvalidInput("Please upload an image file.".into()));
    }

    #[test]
    fn test_undecodable_image_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"\x89PNG but not really").unwrap();

        let err = read_selection(&[path]).unwrap_err();
        match err {
            DetectError::InvalidInput(message) => assert!(message.contains("broken.png")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_selection_missing_file() {
        let result = load_selection(vec![PathBuf::from("/nonexistent/leaf.jpg")]).await;
        assert!(matches!(result, Err(DetectError::InvalidInput(_))));
    }
}
