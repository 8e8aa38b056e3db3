//! Image preprocessing for OCR legibility
//!
//! Turns a raw notice scan into a single-channel image with dark text on a
//! light background. Stages run in a fixed order and each can be switched off
//! per archive batch.

pub mod buffer;
pub mod pipeline;
pub mod steps;

pub use buffer::{ProcessedImage, RawImage, StepTiming};
pub use pipeline::{
    preprocess, DenoiseConfig, DilateConfig, Pipeline, PreprocessConfig, Preset, ThresholdConfig,
    UpscaleConfig,
};
