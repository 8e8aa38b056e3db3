use crate::error::OcrError;
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;

use super::steps;
use super::{ProcessedImage, RawImage, StepTiming};

/// Preprocessing preset names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// Clean, high-resolution scans
    /// Stages: grayscale, polarity
    Minimal,
    /// Typical archive scans
    /// Stages: all seven
    #[default]
    Default,
    /// Small, tightly set type where thickening merges glyphs
    /// Stages: all except dilation
    DensePrint,
}

impl Preset {
    /// Get the preset name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Default => "default",
            Self::DensePrint => "dense-print",
        }
    }

    /// Stage configuration for this preset, default numeric parameters
    pub fn config(&self) -> PreprocessConfig {
        let all = PreprocessConfig::default();
        match self {
            Self::Minimal => PreprocessConfig {
                threshold: ThresholdConfig {
                    enabled: false,
                    ..all.threshold
                },
                upscale: UpscaleConfig {
                    enabled: false,
                    ..all.upscale
                },
                denoise: DenoiseConfig {
                    enabled: false,
                    ..all.denoise
                },
                contrast: false,
                dilate: DilateConfig {
                    enabled: false,
                    ..all.dilate
                },
                ..all
            },
            Self::Default => all,
            Self::DensePrint => PreprocessConfig {
                dilate: DilateConfig {
                    enabled: false,
                    ..all.dilate
                },
                ..all
            },
        }
    }
}

impl FromStr for Preset {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "default" => Ok(Self::Default),
            "dense-print" | "dense" => Ok(Self::DensePrint),
            other => Err(OcrError::ConfigError(format!(
                "unknown preprocessing preset '{}'",
                other
            ))),
        }
    }
}

/// Adaptive threshold parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub enabled: bool,
    /// Side of the local window in pixels (odd)
    pub block_size: u32,
    /// Sauvola `k`; larger values push more pixels to ink
    pub bias: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            block_size: 15,
            bias: 0.2,
        }
    }
}

/// Glyph-height driven resize.
///
/// Not idempotent: when `max_factor` caps a pass, the glyphs are still short
/// of `min_glyph_height` and a second pass scales the page again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpscaleConfig {
    pub enabled: bool,
    /// Fixed factor; `None` derives it from the estimated glyph height
    pub factor: Option<f32>,
    pub min_glyph_height: u32,
    pub max_factor: f32,
    pub max_dimension: u32,
}

impl Default for UpscaleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            factor: None,
            min_glyph_height: 20,
            max_factor: 4.0,
            max_dimension: 8000,
        }
    }
}

/// Bilateral filter parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseConfig {
    pub enabled: bool,
    pub diameter: u32,
    pub sigma_color: f32,
    pub sigma_space: f32,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            diameter: 9,
            sigma_color: 75.0,
            sigma_space: 75.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DilateConfig {
    pub enabled: bool,
    /// Side of the square structuring element (1, 3 or 5)
    pub kernel_size: u32,
}

impl Default for DilateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            kernel_size: 3,
        }
    }
}

/// Per-stage toggles and parameters; every stage is on by default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub grayscale: bool,
    pub threshold: ThresholdConfig,
    pub upscale: UpscaleConfig,
    pub denoise: DenoiseConfig,
    pub contrast: bool,
    pub dilate: DilateConfig,
    pub polarity: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            grayscale: true,
            threshold: ThresholdConfig::default(),
            upscale: UpscaleConfig::default(),
            denoise: DenoiseConfig::default(),
            contrast: true,
            dilate: DilateConfig::default(),
            polarity: true,
        }
    }
}

impl PreprocessConfig {
    /// Reject parameters that would make every image fail
    pub fn validate(&self) -> Result<(), OcrError> {
        let t = &self.threshold;
        if t.block_size < 3 || t.block_size % 2 == 0 {
            return Err(OcrError::ConfigError(format!(
                "threshold.block_size must be odd and >= 3, got {}",
                t.block_size
            )));
        }
        if !t.bias.is_finite() {
            return Err(OcrError::ConfigError("threshold.bias must be finite".into()));
        }

        let u = &self.upscale;
        if let Some(factor) = u.factor {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(OcrError::ConfigError(format!(
                    "upscale.factor must be positive, got {}",
                    factor
                )));
            }
        }
        if !(u.max_factor.is_finite() && u.max_factor >= 1.0) || u.max_dimension == 0 {
            return Err(OcrError::ConfigError(
                "upscale.max_factor must be >= 1 and upscale.max_dimension > 0".into(),
            ));
        }

        let d = &self.denoise;
        if !(d.sigma_color > 0.0 && d.sigma_space > 0.0) {
            return Err(OcrError::ConfigError(
                "denoise sigmas must be positive".into(),
            ));
        }

        let k = self.dilate.kernel_size;
        if k == 0 || k % 2 == 0 || k > steps::dilate::MAX_KERNEL_SIZE {
            return Err(OcrError::ConfigError(format!(
                "dilate.kernel_size must be 1, 3 or 5, got {}",
                k
            )));
        }

        Ok(())
    }
}

/// Preprocessing pipeline that applies the enabled stages in fixed order
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PreprocessConfig,
}

impl Pipeline {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn from_preset(preset: Preset) -> Self {
        Self::new(preset.config())
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Run the enabled stages. Any stage failure aborts the whole image.
    pub fn process(&self, image: &RawImage) -> Result<ProcessedImage, OcrError> {
        let start = Instant::now();
        let mut timings = Vec::new();
        let cfg = &self.config;

        let mut img = if cfg.grayscale {
            let step_start = Instant::now();
            let gray = steps::grayscale::apply(image)?;
            record(&mut timings, "grayscale", step_start);
            gray
        } else {
            steps::grayscale::require_single_channel(image)?
        };

        if cfg.threshold.enabled {
            img = self.run_step("threshold", img, &mut timings, |i| {
                steps::threshold::apply(i, &cfg.threshold)
            })?;
        }

        if cfg.upscale.enabled {
            img = self.run_step("upscale", img, &mut timings, |i| {
                steps::upscale::apply(i, &cfg.upscale)
            })?;
        }

        if cfg.denoise.enabled {
            img = self.run_step("denoise", img, &mut timings, |i| {
                steps::denoise::apply(i, &cfg.denoise)
            })?;
        }

        if cfg.contrast {
            img = self.run_step("contrast", img, &mut timings, steps::contrast::apply)?;
        }

        if cfg.dilate.enabled {
            img = self.run_step("dilate", img, &mut timings, |i| {
                steps::dilate::apply(i, &cfg.dilate)
            })?;
        }

        if cfg.polarity {
            img = self.run_step("polarity", img, &mut timings, steps::polarity::apply)?;
        }

        Ok(ProcessedImage {
            image: img,
            total_time_ms: start.elapsed().as_millis() as u64,
            steps: timings,
        })
    }

    fn run_step<F>(
        &self,
        name: &str,
        img: GrayImage,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> Result<GrayImage, OcrError>
    where
        F: FnOnce(GrayImage) -> Result<GrayImage, OcrError>,
    {
        let step_start = Instant::now();
        let result = step_fn(img)?;
        record(timings, name, step_start);
        Ok(result)
    }
}

fn record(timings: &mut Vec<StepTiming>, name: &str, step_start: Instant) {
    let time_ms = step_start.elapsed().as_millis() as u64;
    tracing::debug!("Stage {} took {}ms", name, time_ms);
    timings.push(StepTiming {
        name: name.to_string(),
        time_ms,
    });
}

/// Preprocess a raw scan with the given configuration
pub fn preprocess(image: &RawImage, config: &PreprocessConfig) -> Result<ProcessedImage, OcrError> {
    Pipeline::new(config.clone()).process(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_names(processed: &ProcessedImage) -> Vec<&str> {
        processed.steps.iter().map(|s| s.name.as_str()).collect()
    }

    fn notice(width: u32, height: u32) -> RawImage {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let ink = (y / 4) % 3 == 1 && x % 5 != 0;
                let value: u8 = if ink { 30 } else { 225 };
                data.extend_from_slice(&[value, value, value.saturating_sub(10)]);
            }
        }
        RawImage::new(width, height, 3, data).unwrap()
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("minimal".parse::<Preset>().unwrap(), Preset::Minimal);
        assert_eq!("Dense-Print".parse::<Preset>().unwrap(), Preset::DensePrint);
        assert!("aggressive".parse::<Preset>().is_err());
        assert_eq!(Preset::DensePrint.as_str(), "dense-print");
    }

    #[test]
    fn test_default_runs_all_stages_in_order() {
        let processed = Pipeline::from_preset(Preset::Default)
            .process(&notice(40, 36))
            .unwrap();
        assert_eq!(
            stage_names(&processed),
            vec!["grayscale", "threshold", "upscale", "denoise", "contrast", "dilate", "polarity"]
        );
    }

    #[test]
    fn test_dense_print_skips_dilation() {
        let processed = Pipeline::from_preset(Preset::DensePrint)
            .process(&notice(40, 36))
            .unwrap();
        assert!(!stage_names(&processed).contains(&"dilate"));
    }

    #[test]
    fn test_minimal_keeps_dimensions() {
        let processed = Pipeline::from_preset(Preset::Minimal)
            .process(&notice(40, 36))
            .unwrap();
        assert_eq!(stage_names(&processed), vec!["grayscale", "polarity"]);
        assert_eq!((processed.width(), processed.height()), (40, 36));
    }

    #[test]
    fn test_preprocessing_is_deterministic() {
        let config = PreprocessConfig::default();
        let a = preprocess(&notice(30, 24), &config).unwrap();
        let b = preprocess(&notice(30, 24), &config).unwrap();
        assert_eq!(a.image, b.image);
    }

    #[test]
    fn test_normalization_chain_is_idempotent() {
        // Geometry-changing stages off: what remains must be a fixed point
        let config = PreprocessConfig {
            upscale: UpscaleConfig {
                enabled: false,
                ..UpscaleConfig::default()
            },
            denoise: DenoiseConfig {
                enabled: false,
                ..DenoiseConfig::default()
            },
            dilate: DilateConfig {
                enabled: false,
                ..DilateConfig::default()
            },
            ..PreprocessConfig::default()
        };

        let once = preprocess(&notice(30, 24), &config).unwrap().image;
        let again = RawImage::from_dynamic(image::DynamicImage::ImageLuma8(once.clone()));
        let twice = preprocess(&again, &config).unwrap().image;
        assert_eq!(once, twice);
    }

    #[test]
    fn test_degenerate_image_fails_with_stage_name() {
        let empty = RawImage::new(0, 0, 3, Vec::new()).unwrap();
        let err = preprocess(&empty, &PreprocessConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            OcrError::PreprocessingError {
                stage: "grayscale",
                ..
            }
        ));
    }

    #[test]
    fn test_disabled_grayscale_requires_single_channel() {
        let config = PreprocessConfig {
            grayscale: false,
            ..PreprocessConfig::default()
        };
        assert!(matches!(
            preprocess(&notice(10, 10), &config).unwrap_err(),
            OcrError::UnsupportedFormat(_)
        ));
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        assert!(PreprocessConfig::default().validate().is_ok());

        let mut config = PreprocessConfig::default();
        config.threshold.block_size = 10;
        assert!(config.validate().is_err());

        let mut config = PreprocessConfig::default();
        config.dilate.kernel_size = 9;
        assert!(config.validate().is_err());

        let mut config = PreprocessConfig::default();
        config.upscale.factor = Some(0.0);
        assert!(config.validate().is_err());
    }
}
