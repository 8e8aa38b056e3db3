//! Batch transcription: preprocess, recognize, correct
//!
//! Each item runs through the preprocessor, the OCR engine and the text
//! corrector independently. A failing item is recorded in the report and
//! never stops the rest of the batch.

use crate::config::PipelineConfig;
use crate::correction::{CorrectionStats, RawTranscript, SharedDictionary, TextCorrector};
use crate::engine::OcrEngine;
use crate::error::{ErrorResponse, OcrError};
use crate::input::SourceImage;
use crate::preprocessing::{Pipeline, ProcessedImage};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A transcribed notice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObituaryRecord {
    pub source_id: String,
    pub text: String,
    pub spellchecked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obituary_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_confidence: Option<f32>,
    pub corrections: CorrectionStats,
}

#[derive(Debug)]
pub enum ItemOutcome {
    Succeeded(ObituaryRecord),
    Failed { source_id: String, error: OcrError },
}

impl ItemOutcome {
    pub fn source_id(&self) -> &str {
        match self {
            ItemOutcome::Succeeded(record) => &record.source_id,
            ItemOutcome::Failed { source_id, .. } => source_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Succeeded(_))
    }

    fn from_result(source_id: String, result: Result<ObituaryRecord, OcrError>) -> Self {
        match result {
            Ok(record) => ItemOutcome::Succeeded(record),
            Err(error) => {
                warn!("{} failed: {} ({})", source_id, error, error.code());
                ItemOutcome::Failed { source_id, error }
            }
        }
    }
}

/// Per-item outcomes in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &ObituaryRecord> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            ItemOutcome::Succeeded(record) => Some(record),
            ItemOutcome::Failed { .. } => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &OcrError)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            ItemOutcome::Failed { source_id, error } => Some((source_id.as_str(), error)),
            ItemOutcome::Succeeded(_) => None,
        })
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            total: self.len(),
            succeeded: self.succeeded().cloned().collect(),
            failed: self
                .failed()
                .map(|(source_id, error)| FailedItem {
                    source_id: source_id.to_string(),
                    error: ErrorResponse::from(error),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedItem {
    pub source_id: String,
    #[serde(flatten)]
    pub error: ErrorResponse,
}

/// Serializable view of a batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: Vec<ObituaryRecord>,
    pub failed: Vec<FailedItem>,
}

/// Orchestrates preprocessing, OCR and correction for notice scans
pub struct TranscriptionPipeline {
    preprocessor: Pipeline,
    corrector: TextCorrector,
    dictionary: SharedDictionary,
    engine: Arc<dyn OcrEngine>,
    config: PipelineConfig,
}

impl TranscriptionPipeline {
    pub fn new(
        config: PipelineConfig,
        engine: Arc<dyn OcrEngine>,
        dictionary: impl Into<SharedDictionary>,
    ) -> Result<Self, OcrError> {
        config.validate()?;
        info!(
            "Transcription pipeline ready (engine: {}, workers: {}, spellcheck: {})",
            engine.name(),
            config.workers,
            config.correction.spellcheck
        );

        Ok(Self {
            preprocessor: Pipeline::new(config.preprocess.clone()),
            corrector: TextCorrector::new(config.correction.clone()),
            dictionary: dictionary.into(),
            engine,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Handle for swapping the dictionary while batches run
    pub fn dictionary(&self) -> &SharedDictionary {
        &self.dictionary
    }

    /// Transcribe one item on the calling thread, without a time limit
    pub fn process(&self, item: &SourceImage) -> ItemOutcome {
        let result = self
            .preprocess(item)
            .and_then(|processed| self.engine.recognize(&processed))
            .and_then(|raw| self.finish(&item.id, raw));
        ItemOutcome::from_result(item.id.clone(), result)
    }

    /// Transcribe a batch on the blocking pool, at most `workers` items at a
    /// time. Outcomes keep the input order.
    pub async fn process_batch(self: &Arc<Self>, items: Vec<SourceImage>) -> BatchReport {
        let started = Instant::now();
        let count = items.len();
        info!("Processing batch of {} items", count);

        let outcomes: Vec<ItemOutcome> = stream::iter(items)
            .map(|item| Arc::clone(self).run_item(item))
            .buffered(self.config.workers)
            .collect()
            .await;

        let report = BatchReport { outcomes };
        info!(
            "Batch finished in {}ms: {} succeeded, {} failed",
            started.elapsed().as_millis(),
            report.succeeded().count(),
            report.failed().count()
        );
        report
    }

    async fn run_item(self: Arc<Self>, item: SourceImage) -> ItemOutcome {
        let source_id = item.id.clone();
        let result = self.run_stages(item).await;
        ItemOutcome::from_result(source_id, result)
    }

    async fn run_stages(self: Arc<Self>, item: SourceImage) -> Result<ObituaryRecord, OcrError> {
        let source_id = item.id.clone();

        let pipeline = Arc::clone(&self);
        let processed = tokio::task::spawn_blocking(move || pipeline.preprocess(&item))
            .await
            .map_err(join_error)??;

        let raw = self.recognize_with_timeout(processed).await?;

        let pipeline = Arc::clone(&self);
        tokio::task::spawn_blocking(move || pipeline.finish(&source_id, raw))
            .await
            .map_err(join_error)?
    }

    /// Run the engine on the blocking pool. On timeout the blocking thread is
    /// abandoned and stops counting against `workers`; its result is dropped
    /// when it eventually finishes.
    async fn recognize_with_timeout(
        &self,
        processed: ProcessedImage,
    ) -> Result<RawTranscript, OcrError> {
        let timeout_ms = self.config.ocr_timeout_ms;
        let engine = Arc::clone(&self.engine);
        let task = tokio::task::spawn_blocking(move || engine.recognize(&processed));

        match tokio::time::timeout(Duration::from_millis(timeout_ms), task).await {
            Ok(joined) => joined.map_err(join_error)?,
            Err(_) => Err(OcrError::OcrTimeout { timeout_ms }),
        }
    }

    fn preprocess(&self, item: &SourceImage) -> Result<ProcessedImage, OcrError> {
        let raw = item.load()?;
        let processed = self.preprocessor.process(&raw)?;
        debug!(
            "{} preprocessed in {}ms ({}x{})",
            item.id,
            processed.total_time_ms,
            processed.width(),
            processed.height()
        );
        Ok(processed)
    }

    /// Correct a raw transcript against the current dictionary snapshot
    fn finish(&self, source_id: &str, raw: RawTranscript) -> Result<ObituaryRecord, OcrError> {
        if raw.is_blank() {
            return Err(OcrError::OcrEmptyResult);
        }

        let dictionary = self.dictionary.snapshot();
        let corrected = self
            .corrector
            .correct(&raw, &dictionary, self.config.correction.spellcheck);

        Ok(ObituaryRecord {
            source_id: source_id.to_string(),
            text: corrected.text,
            spellchecked: corrected.spellchecked,
            obituary_url: self.config.record_url(source_id),
            ocr_confidence: raw.confidence,
            corrections: corrected.stats,
        })
    }
}

fn join_error(e: tokio::task::JoinError) -> OcrError {
    OcrError::Internal(format!("worker task failed: {}", e))
}
