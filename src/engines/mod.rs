//! OCR engine implementations
//!
//! This module contains implementations of the OcrEngine trait for different
//! OCR backends. Engines are conditionally compiled based on feature flags.

pub mod cache;

#[cfg(feature = "engine-ocrs")]
pub mod ocrs;

#[cfg(feature = "engine-leptess")]
pub mod leptess;

use crate::config::EngineConfig;
use crate::engine::OcrEngine;
use crate::error::OcrError;
use std::sync::Arc;

/// Registry of the compiled-in OCR engines
pub struct EngineRegistry {
    engines: Vec<Arc<dyn OcrEngine>>,
    default_engine: String,
}

impl EngineRegistry {
    /// Initialize every engine enabled by feature flags
    pub fn new(config: &EngineConfig) -> Result<Self, OcrError> {
        let mut registry = Self::empty();

        #[cfg(feature = "engine-ocrs")]
        {
            tracing::info!("Initializing ocrs engine...");
            registry.register(Arc::new(ocrs::OcrsEngine::new(config)?));
        }

        #[cfg(feature = "engine-leptess")]
        {
            tracing::info!("Initializing leptess engine...");
            registry.register(Arc::new(leptess::LeptessEngine::new(config)?));
        }

        #[cfg(not(any(feature = "engine-ocrs", feature = "engine-leptess")))]
        let _ = config;

        if registry.engines.is_empty() {
            return Err(OcrError::InitializationError(
                "No OCR engines available. Build with --features engine-ocrs or --features engine-leptess".to_string()
            ));
        }

        Ok(registry)
    }

    /// Registry with no engines; callers register their own
    pub fn empty() -> Self {
        Self {
            engines: Vec::new(),
            default_engine: String::new(),
        }
    }

    /// Add an engine. The first one registered becomes the default.
    pub fn register(&mut self, engine: Arc<dyn OcrEngine>) {
        if self.default_engine.is_empty() {
            self.default_engine = engine.name().to_string();
        }
        self.engines.push(engine);
    }

    /// Get an engine by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn OcrEngine>> {
        self.engines.iter().find(|e| e.name() == name).cloned()
    }

    /// Get the default engine
    pub fn default_engine(&self) -> Option<Arc<dyn OcrEngine>> {
        self.get(&self.default_engine)
    }

    /// Engine named in the config, or the default one
    pub fn select(&self, name: Option<&str>) -> Result<Arc<dyn OcrEngine>, OcrError> {
        let selected = match name {
            Some(name) => self.get(name),
            None => self.default_engine(),
        };
        selected.ok_or_else(|| {
            OcrError::ConfigError(format!(
                "Unknown engine '{}'. Available: {}",
                name.unwrap_or_default(),
                self.list().join(", ")
            ))
        })
    }

    /// List all available engine names
    pub fn list(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::RawTranscript;
    use crate::engine::ocr_fn;
    use crate::preprocessing::ProcessedImage;

    fn stub() -> Arc<dyn OcrEngine> {
        Arc::new(ocr_fn(|_: &ProcessedImage| Ok(RawTranscript::new("text"))))
    }

    #[test]
    fn test_first_registered_engine_is_default() {
        let mut registry = EngineRegistry::empty();
        registry.register(stub());
        assert_eq!(registry.list(), vec!["fn"]);
        assert_eq!(registry.select(None).unwrap().name(), "fn");
    }

    #[test]
    fn test_unknown_engine_is_config_error() {
        let mut registry = EngineRegistry::empty();
        registry.register(stub());
        let err = registry.select(Some("abbyy")).err().unwrap();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_empty_registry_has_no_default() {
        assert!(EngineRegistry::empty().select(None).is_err());
    }
}
