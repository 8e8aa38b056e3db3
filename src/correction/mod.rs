//! OCR text correction
//!
//! Repairs engine output in a fixed order: line normalization, hyphenation
//! repair, character-confusion fixes, irregular-character removal and, when
//! enabled, dictionary spellchecking.

pub mod cleanup;
pub mod confusion;
pub mod dictionary;
pub mod hyphenation;
pub mod spellcheck;

pub use dictionary::{CorrectionDictionary, SharedDictionary};

use crate::error::OcrError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Text as returned by the OCR engine, before any correction
#[derive(Debug, Clone, PartialEq)]
pub struct RawTranscript {
    pub text: String,
    /// Engine confidence in 0.0..=1.0 when the engine reports one
    pub confidence: Option<f32>,
}

impl RawTranscript {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    /// Whitespace-only output counts as no output
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// How many edits each correction stage made
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CorrectionStats {
    pub hyphens_merged: usize,
    pub confusions_fixed: usize,
    pub chars_removed: usize,
    pub words_corrected: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectedTranscript {
    pub text: String,
    pub spellchecked: bool,
    pub stats: CorrectionStats,
}

/// What to do when several dictionary entries are equally close
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmbiguityPolicy {
    /// Leave the token unchanged
    #[default]
    Skip,
    /// Take the earliest entry in dictionary order
    FirstOccurrence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    pub spellcheck: bool,
    pub max_edit_distance: usize,
    pub ambiguity: AmbiguityPolicy,
    pub min_token_len: usize,
    /// Never touch capitalized tokens, not only listed exceptions
    pub skip_capitalized: bool,
    pub confusion_rules: bool,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            spellcheck: false,
            max_edit_distance: 2,
            ambiguity: AmbiguityPolicy::Skip,
            min_token_len: 2,
            skip_capitalized: false,
            confusion_rules: true,
        }
    }
}

impl CorrectionConfig {
    pub fn validate(&self) -> Result<(), OcrError> {
        if self.max_edit_distance == 0 || self.max_edit_distance > 4 {
            return Err(OcrError::ConfigError(format!(
                "max_edit_distance must be between 1 and 4, got {}",
                self.max_edit_distance
            )));
        }
        if self.min_token_len == 0 {
            return Err(OcrError::ConfigError(
                "min_token_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runs the correction stages over one transcript at a time
#[derive(Debug, Clone, Default)]
pub struct TextCorrector {
    config: CorrectionConfig,
}

impl TextCorrector {
    pub fn new(config: CorrectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CorrectionConfig {
        &self.config
    }

    /// Correct a transcript. The result depends only on the inputs.
    pub fn correct(
        &self,
        raw: &RawTranscript,
        dictionary: &CorrectionDictionary,
        spellcheck_enabled: bool,
    ) -> CorrectedTranscript {
        let mut stats = CorrectionStats::default();

        let text = cleanup::normalize_lines(&raw.text);

        let (text, merged) = hyphenation::repair(&text, dictionary);
        stats.hyphens_merged = merged;

        let text = if self.config.confusion_rules {
            let (fixed, count) = confusion::fix_confusions(&text);
            stats.confusions_fixed = count;
            fixed
        } else {
            text
        };

        let (text, removed) = cleanup::remove_irregular(&text);
        stats.chars_removed = removed;

        let text = if spellcheck_enabled {
            let (checked, count) = spellcheck::spellcheck(&text, dictionary, &self.config);
            stats.words_corrected = count;
            checked
        } else {
            text
        };

        debug!(
            "Corrected transcript: {} merges, {} confusions, {} chars removed, {} words",
            stats.hyphens_merged, stats.confusions_fixed, stats.chars_removed, stats.words_corrected
        );

        CorrectedTranscript {
            text,
            spellchecked: spellcheck_enabled,
            stats,
        }
    }
}

/// Correct with default settings
pub fn correct(
    raw: &RawTranscript,
    dictionary: &CorrectionDictionary,
    spellcheck_enabled: bool,
) -> CorrectedTranscript {
    TextCorrector::default().correct(raw, dictionary, spellcheck_enabled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> CorrectionDictionary {
        CorrectionDictionary::from_words(["organizing", "loved", "partner", "survived", "he"])
    }

    #[test]
    fn test_hyphenated_break_is_merged() {
        let result = correct(&RawTranscript::new("organiz-\ning"), &dict(), false);
        assert_eq!(result.text, "organizing");
        assert_eq!(result.stats.hyphens_merged, 1);
    }

    #[test]
    fn test_contextual_digit_fix() {
        let result = correct(&RawTranscript::new("He 1oved his partner"), &dict(), false);
        assert_eq!(result.text, "He loved his partner");

        let result = correct(&RawTranscript::new("In 1991"), &dict(), false);
        assert_eq!(result.text, "In 1991");
    }

    #[test]
    fn test_ambiguous_token_is_unchanged() {
        let dict = CorrectionDictionary::from_words(["cat", "car"]);
        let result = correct(&RawTranscript::new("cta"), &dict, true);
        assert_eq!(result.text, "cta");
        assert_eq!(result.stats.words_corrected, 0);
    }

    #[test]
    fn test_listed_proper_noun_is_not_spellchecked() {
        let mut dict = CorrectionDictionary::from_words(["harvest"]);
        dict.add_exception("Harvey");
        let result = correct(&RawTranscript::new("Harvey"), &dict, true);
        assert_eq!(result.text, "Harvey");
    }

    #[test]
    fn test_correction_is_deterministic() {
        let raw = RawTranscript::new("He  1oved his  partnr,\r\nand was survlved by\tfriends §");
        let dict = CorrectionDictionary::builtin();
        let first = correct(&raw, &dict, true);
        for _ in 0..5 {
            assert_eq!(correct(&raw, &dict, true), first);
        }
        assert_eq!(first.text, "He loved his partner,\nand was survived by friends");
    }

    #[test]
    fn test_plain_prose_survives_spellcheck() {
        let dict = CorrectionDictionary::builtin();
        for line in [
            "she taught piano and sang in the choir",
            "he was a carpenter who built boats",
            "she enjoyed gardening cooking and travel",
            "his dog",
            "she worked as a nurse for thirty years",
        ] {
            let result = correct(&RawTranscript::new(line), &dict, true);
            assert_eq!(result.text, line);
            assert_eq!(result.stats.words_corrected, 0);
        }
    }

    #[test]
    fn test_spellcheck_flag_is_reported() {
        let raw = RawTranscript::new("partnr");
        let off = correct(&raw, &dict(), false);
        assert_eq!(off.text, "partnr");
        assert!(!off.spellchecked);

        let on = correct(&raw, &dict(), true);
        assert_eq!(on.text, "partner");
        assert!(on.spellchecked);
    }

    #[test]
    fn test_confusion_rules_can_be_disabled() {
        let corrector = TextCorrector::new(CorrectionConfig {
            confusion_rules: false,
            ..Default::default()
        });
        let result = corrector.correct(&RawTranscript::new("1oved"), &dict(), false);
        assert_eq!(result.text, "1oved");
    }

    #[test]
    fn test_config_validation() {
        assert!(CorrectionConfig::default().validate().is_ok());
        let bad = CorrectionConfig {
            max_edit_distance: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_confidence_is_clamped() {
        let raw = RawTranscript::new("text").with_confidence(1.7);
        assert_eq!(raw.confidence, Some(1.0));
        assert!(RawTranscript::new(" \n\t").is_blank());
    }
}
