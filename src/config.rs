use crate::correction::CorrectionConfig;
use crate::error::OcrError;
use crate::preprocessing::PreprocessConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Obituary page URL used by the original archive; `{name}` is the image stem
pub const ARCHIVE_URL_TEMPLATE: &str = "http://obit.glbthistory.org/olo/display.jsp?name={name}";

/// Upper bound on the per-item OCR timeout (10 minutes)
const MAX_TIMEOUT_MS: u64 = 600_000;

/// Engine settings shared by every backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine to run; the first compiled-in engine when unset
    pub name: Option<String>,
    /// Tesseract language code (e.g., "eng", "deu", "fra")
    pub language: String,
    /// Path to tessdata directory; downloaded into the cache when unset
    pub tessdata_path: Option<PathBuf>,
    /// Where models are cached; the platform cache dir when unset
    pub cache_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: None,
            language: "eng".to_string(),
            tessdata_path: None,
            cache_dir: None,
        }
    }
}

/// Batch transcription configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub preprocess: PreprocessConfig,
    pub correction: CorrectionConfig,
    pub engine: EngineConfig,
    /// Items in flight at once.
    ///
    /// An OCR call that times out is abandoned, not cancelled: its blocking
    /// thread runs on until the engine returns. After timeouts more than
    /// `workers` engine calls can therefore be running at the same time.
    pub workers: usize,
    /// Per-item limit on the OCR call, in milliseconds
    pub ocr_timeout_ms: u64,
    /// Record URL template; `{name}` is replaced by the source identifier
    pub url_template: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            preprocess: PreprocessConfig::default(),
            correction: CorrectionConfig::default(),
            engine: EngineConfig::default(),
            workers: default_workers(),
            ocr_timeout_ms: 60_000,
            url_template: None,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl PipelineConfig {
    /// Read a JSON config file; omitted fields take their defaults
    pub fn load(path: &Path) -> Result<Self, OcrError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            OcrError::ConfigError(format!("Failed to read config {:?}: {}", path, e))
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            OcrError::ConfigError(format!("Invalid config {:?}: {}", path, e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), OcrError> {
        self.preprocess.validate()?;
        self.correction.validate()?;

        if self.workers == 0 {
            return Err(OcrError::ConfigError("workers must be at least 1".to_string()));
        }
        if self.ocr_timeout_ms == 0 || self.ocr_timeout_ms > MAX_TIMEOUT_MS {
            return Err(OcrError::ConfigError(format!(
                "ocr_timeout_ms must be between 1 and {}, got {}",
                MAX_TIMEOUT_MS, self.ocr_timeout_ms
            )));
        }
        if self.engine.language.trim().is_empty() {
            return Err(OcrError::ConfigError("engine language is empty".to_string()));
        }
        if let Some(template) = &self.url_template {
            if !template.contains("{name}") {
                return Err(OcrError::ConfigError(format!(
                    "url_template must contain {{name}}: {}",
                    template
                )));
            }
        }
        Ok(())
    }

    /// Record URL for a source identifier, when a template is configured
    pub fn record_url(&self, source_id: &str) -> Option<String> {
        self.url_template
            .as_ref()
            .map(|template| template.replace("{name}", source_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.workers >= 1);
        assert_eq!(config.ocr_timeout_ms, 60_000);
        assert!(!config.correction.spellcheck);
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let zero_workers = PipelineConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_workers.validate(),
            Err(OcrError::ConfigError(_))
        ));

        let mut bad_stage = PipelineConfig::default();
        bad_stage.preprocess.dilate.kernel_size = 4;
        assert!(bad_stage.validate().is_err());

        let bad_template = PipelineConfig {
            url_template: Some("http://example.org/obit".to_string()),
            ..Default::default()
        };
        assert!(bad_template.validate().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"workers": 2, "correction": {{"spellcheck": true}}, "preprocess": {{"dilate": {{"enabled": false}}}}}}"#
        )
        .unwrap();

        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(config.workers, 2);
        assert!(config.correction.spellcheck);
        assert_eq!(config.correction.max_edit_distance, 2);
        assert!(!config.preprocess.dilate.enabled);
        assert_eq!(config.preprocess.dilate.kernel_size, 3);
        assert_eq!(config.engine.language, "eng");
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = PipelineConfig::load(file.path()).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_record_url_uses_template() {
        let config = PipelineConfig {
            url_template: Some(ARCHIVE_URL_TEMPLATE.to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.record_url("smith_john").as_deref(),
            Some("http://obit.glbthistory.org/olo/display.jsp?name=smith_john")
        );
        assert_eq!(PipelineConfig::default().record_url("x"), None);
    }
}
