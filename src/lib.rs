//! Scanned obituary notices to corrected text.
//!
//! Notice scans are cleaned up for OCR legibility, recognized by a pluggable
//! engine and repaired against an obituary vocabulary, in bounded parallel
//! batches.

pub mod config;
pub mod correction;
pub mod engine;
pub mod engines;
pub mod error;
pub mod input;
pub mod preprocessing;
pub mod transcription;

pub use config::PipelineConfig;
pub use correction::{correct, CorrectedTranscript, CorrectionDictionary, RawTranscript};
pub use engine::{ocr_fn, OcrEngine};
pub use error::OcrError;
pub use preprocessing::{preprocess, ProcessedImage, RawImage};
pub use transcription::{BatchReport, BatchSummary, ItemOutcome, ObituaryRecord, TranscriptionPipeline};
