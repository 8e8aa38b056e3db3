//! Model and training-data cache shared by the engine adapters

use crate::config::EngineConfig;
use crate::error::OcrError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Root cache directory for downloaded models
pub fn cache_root(config: &EngineConfig) -> PathBuf {
    config.cache_dir.clone().unwrap_or_else(|| {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("obit-transcriber")
    })
}

/// Return `dir/filename`, downloading it from `url` first when missing
pub fn ensure_downloaded(url: &str, dir: &Path, filename: &str) -> Result<PathBuf, OcrError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        OcrError::InitializationError(format!("Failed to create cache directory {:?}: {}", dir, e))
    })?;

    let path = dir.join(filename);
    if path.exists() {
        tracing::info!("Using cached {:?}", path);
        return Ok(path);
    }

    tracing::info!("Downloading {} (this may take a moment)...", filename);
    download_file(url, &path)?;
    tracing::info!("Downloaded {} to {:?}", filename, path);
    Ok(path)
}

/// Download to a temporary sibling and rename, so an interrupted download
/// never leaves a truncated file at `path`
fn download_file(url: &str, path: &Path) -> Result<(), OcrError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| OcrError::InitializationError(format!("Failed to download {}: {}", url, e)))?;

    let buffer = response.into_body().read_to_vec().map_err(|e| {
        OcrError::InitializationError(format!("Failed to read response body: {}", e))
    })?;

    let partial = path.with_extension("part");
    let mut file = File::create(&partial).map_err(|e| {
        OcrError::InitializationError(format!("Failed to create {:?}: {}", partial, e))
    })?;
    file.write_all(&buffer)
        .map_err(|e| OcrError::InitializationError(format!("Failed to write {:?}: {}", partial, e)))?;

    std::fs::rename(&partial, path)
        .map_err(|e| OcrError::InitializationError(format!("Failed to move {:?}: {}", partial, e)))
}
