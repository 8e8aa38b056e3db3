//! Domain dictionary shared by every correction worker

use crate::error::OcrError;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Obituary vocabulary compiled into the binary
const OBITUARY_WORDS: &str = include_str!("../../data/obituary_words.txt");

/// General English vocabulary, so ordinary prose is never "corrected"
const ENGLISH_WORDS: &str = include_str!("../../data/english_words.txt");

/// Lowercase domain-valid tokens in first-occurrence order.
///
/// Exception tokens (proper nouns, place names, archive terms) are valid
/// words too, and are additionally remembered so the spellchecker never
/// touches them.
#[derive(Debug, Clone, Default)]
pub struct CorrectionDictionary {
    entries: Vec<String>,
    index: HashSet<String>,
    exceptions: HashSet<String>,
}

impl CorrectionDictionary {
    /// Empty dictionary
    pub fn new() -> Self {
        Self::default()
    }

    /// Dictionary seeded with the built-in obituary and general English
    /// vocabularies. Obituary terms come first, so they win under
    /// first-occurrence ambiguity.
    pub fn builtin() -> Self {
        let mut dict = Self::new();
        for word in tokens(OBITUARY_WORDS).chain(tokens(ENGLISH_WORDS)) {
            dict.add_word(word);
        }
        dict
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dict = Self::new();
        for word in words {
            dict.add_word(word.as_ref());
        }
        dict
    }

    /// Add a word; returns false when it was already present or blank
    pub fn add_word(&mut self, word: &str) -> bool {
        let word = word.trim().to_lowercase();
        if word.is_empty() || self.index.contains(&word) {
            return false;
        }
        self.index.insert(word.clone());
        self.entries.push(word);
        true
    }

    /// Add a custom-exception token
    pub fn add_exception(&mut self, token: &str) {
        let token = token.trim();
        if token.is_empty() {
            return;
        }
        self.exceptions.insert(token.to_lowercase());
        self.add_word(token);
    }

    /// Merge a word list file. A missing or unreadable file is a startup
    /// failure: every item would be corrected against the wrong vocabulary.
    pub fn extend_from_file(&mut self, path: &Path) -> Result<usize, OcrError> {
        let text = read_list(path)?;
        let added = tokens(&text).filter(|word| self.add_word(word)).count();
        tracing::info!("Loaded {} words from {:?}", added, path);
        Ok(added)
    }

    /// Merge an exception list file
    pub fn add_exceptions_from_file(&mut self, path: &Path) -> Result<usize, OcrError> {
        let text = read_list(path)?;
        let mut count = 0;
        for token in tokens(&text) {
            self.add_exception(token);
            count += 1;
        }
        tracing::info!("Loaded {} exception terms from {:?}", count, path);
        Ok(count)
    }

    /// Case-insensitive membership
    pub fn contains(&self, word: &str) -> bool {
        self.index.contains(&word.to_lowercase())
    }

    /// Whether the token is on the domain exception list (case-insensitive)
    pub fn is_exception(&self, word: &str) -> bool {
        self.exceptions.contains(&word.to_lowercase())
    }

    /// Entries in first-occurrence order
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_list(path: &Path) -> Result<String, OcrError> {
    std::fs::read_to_string(path).map_err(|e| {
        OcrError::InitializationError(format!("Failed to read word list {:?}: {}", path, e))
    })
}

/// Whitespace-separated tokens, skipping `#` comment lines
fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(str::split_whitespace)
}

/// Handle to the current dictionary.
///
/// Workers take a snapshot per item and keep it for the whole correction;
/// `replace` swaps the entire dictionary at once, so a reader sees either the
/// old or the new one, never a mix.
#[derive(Debug, Clone)]
pub struct SharedDictionary {
    current: Arc<RwLock<Arc<CorrectionDictionary>>>,
}

impl SharedDictionary {
    pub fn new(dictionary: CorrectionDictionary) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(dictionary))),
        }
    }

    pub fn snapshot(&self) -> Arc<CorrectionDictionary> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install a new dictionary, returning the previous one
    pub fn replace(&self, dictionary: CorrectionDictionary) -> Arc<CorrectionDictionary> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *guard, Arc::new(dictionary));
        tracing::info!(
            "Dictionary replaced ({} -> {} entries)",
            previous.len(),
            guard.len()
        );
        previous
    }
}

impl From<CorrectionDictionary> for SharedDictionary {
    fn from(dictionary: CorrectionDictionary) -> Self {
        Self::new(dictionary)
    }
}
