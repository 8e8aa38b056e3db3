//! Source images for a transcription batch

use crate::error::OcrError;
use crate::preprocessing::RawImage;
use std::path::{Path, PathBuf};

/// Scan formats the downloader stores
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Where an item's pixels come from
#[derive(Debug, Clone)]
pub enum ImagePayload {
    /// Encoded image bytes (JPEG, PNG, ...)
    Encoded(Vec<u8>),
    /// Already decoded pixels
    Decoded(RawImage),
    /// File read lazily by the worker
    File(PathBuf),
}

/// One notice to transcribe
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub id: String,
    pub payload: ImagePayload,
}

impl SourceImage {
    pub fn encoded(id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            payload: ImagePayload::Encoded(bytes),
        }
    }

    pub fn decoded(id: impl Into<String>, image: RawImage) -> Self {
        Self {
            id: id.into(),
            payload: ImagePayload::Decoded(image),
        }
    }

    /// Item backed by a file; the identifier is the file stem
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            id,
            payload: ImagePayload::File(path),
        }
    }

    /// Produce the decoded pixels, reading the file if needed
    pub fn load(&self) -> Result<RawImage, OcrError> {
        match &self.payload {
            ImagePayload::Encoded(bytes) => RawImage::decode(bytes),
            ImagePayload::Decoded(image) => Ok(image.clone()),
            ImagePayload::File(path) => {
                let bytes = std::fs::read(path).map_err(|e| {
                    OcrError::ImageReadError(format!("Failed to read {:?}: {}", path, e))
                })?;
                RawImage::decode(&bytes)
            }
        }
    }
}

/// Collect every scan under `dir`, recursively, sorted by path
pub fn collect_images(dir: &Path) -> Result<Vec<SourceImage>, OcrError> {
    if !dir.is_dir() {
        return Err(OcrError::ConfigError(format!(
            "input directory {:?} does not exist",
            dir
        )));
    }

    let pattern = dir.join("**").join("*");
    let pattern = pattern.to_string_lossy();
    let entries = glob::glob(&pattern)
        .map_err(|e| OcrError::ConfigError(format!("Invalid input path {:?}: {}", dir, e)))?;

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() && is_scan(&path) => paths.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!("Skipping unreadable entry: {}", e),
        }
    }
    paths.sort();

    tracing::info!("Found {} scans under {:?}", paths.len(), dir);
    Ok(paths.into_iter().map(SourceImage::file).collect())
}

fn is_scan(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_scans_recursively_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("1987/march")).unwrap();
        std::fs::write(dir.path().join("1987/march/smith_john.JPG"), b"x").unwrap();
        std::fs::write(dir.path().join("1987/adams_lee.png"), b"x").unwrap();
        std::fs::write(dir.path().join("1987/notes.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("baker_ann.jpeg"), b"x").unwrap();

        let items = collect_images(dir.path()).unwrap();
        let ids: Vec<&str> = items.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["adams_lee", "smith_john", "baker_ann"]);
    }

    #[test]
    fn test_missing_directory_is_config_error() {
        let err = collect_images(Path::new("/nonexistent/scans")).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_unreadable_file_is_item_error() {
        let item = SourceImage::file("/nonexistent/scans/jones_pat.jpg");
        assert_eq!(item.id, "jones_pat");
        let err = item.load().unwrap_err();
        assert!(matches!(err, OcrError::ImageReadError(_)));
    }

    #[test]
    fn test_zero_byte_file_fails_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.jpg");
        std::fs::write(&path, b"").unwrap();

        let err = SourceImage::file(path).load().unwrap_err();
        assert_eq!(err.code(), "PREPROCESSING_ERROR");
    }
}
