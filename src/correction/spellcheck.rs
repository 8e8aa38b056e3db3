//! Dictionary-based spellchecking with edit-distance candidates

use super::cleanup::is_latin_letter;
use super::dictionary::CorrectionDictionary;
use super::{AmbiguityPolicy, CorrectionConfig};
use strsim::levenshtein;
use tracing::debug;

/// Correct every out-of-dictionary token that has a safe replacement.
///
/// Whitespace and line structure are preserved; surrounding punctuation is
/// stripped for lookup and re-attached. Returns the text and the number of
/// tokens replaced.
pub fn spellcheck(
    text: &str,
    dictionary: &CorrectionDictionary,
    config: &CorrectionConfig,
) -> (String, usize) {
    let mut corrected = 0;

    let lines: Vec<String> = text
        .split('\n')
        .map(|line| {
            line.split(' ')
                .map(|token| match correct_token(token, dictionary, config) {
                    Some(fixed) => {
                        corrected += 1;
                        fixed
                    }
                    None => token.to_string(),
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    (lines.join("\n"), corrected)
}

fn correct_token(
    token: &str,
    dictionary: &CorrectionDictionary,
    config: &CorrectionConfig,
) -> Option<String> {
    if token.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let start = token.find(is_latin_letter)?;
    let end = token
        .char_indices()
        .rev()
        .find(|(_, c)| is_latin_letter(*c))
        .map(|(idx, c)| idx + c.len_utf8())?;
    let (lead, core, trail) = (&token[..start], &token[start..end], &token[end..]);

    // Hyphenated compounds are left as printed
    if !core.chars().all(|c| is_latin_letter(c) || c == '\'') {
        return None;
    }

    let (word, possessive) = match core.strip_suffix("'s") {
        Some(base) => (base, "'s"),
        None => (core, ""),
    };
    if word.chars().count() < config.min_token_len || dictionary.contains(word) {
        return None;
    }

    let capitalized = word.chars().next().is_some_and(char::is_uppercase);
    if capitalized && (config.skip_capitalized || dictionary.is_exception(word)) {
        return None;
    }

    let candidate = find_correction(word, dictionary, config.max_edit_distance, config.ambiguity)?;
    let replacement = match_case(word, candidate);
    debug!("Spellcheck: '{}' -> '{}'", word, replacement);

    Some(format!("{}{}{}{}", lead, replacement, possessive, trail))
}

/// Closest dictionary entry within `max_distance` edits.
///
/// Candidates are visited in dictionary order. Under `AmbiguityPolicy::Skip`
/// a tie between equidistant entries yields `None`.
pub fn find_correction<'a>(
    word: &str,
    dictionary: &'a CorrectionDictionary,
    max_distance: usize,
    policy: AmbiguityPolicy,
) -> Option<&'a str> {
    let word = word.to_lowercase();
    let word_len = word.chars().count();

    let mut best: Option<(&str, usize)> = None;
    let mut tied = false;

    for entry in dictionary.entries() {
        let bound = best.map_or(max_distance, |(_, d)| d);
        // Length difference is a lower bound on the edit distance
        if entry.chars().count().abs_diff(word_len) > bound {
            continue;
        }

        let distance = levenshtein(&word, entry);
        if distance > bound {
            continue;
        }
        match best {
            Some((_, d)) if distance == d => tied = true,
            _ => {
                best = Some((entry, distance));
                tied = false;
            }
        }
    }

    match (best, policy) {
        (Some((_, 0)), _) => None,
        (Some(_), AmbiguityPolicy::Skip) if tied => None,
        (Some((entry, _)), _) => Some(entry),
        (None, _) => None,
    }
}

fn match_case(original: &str, replacement: &str) -> String {
    let letters: Vec<char> = original.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase()) {
        return replacement.to_uppercase();
    }
    if letters.first().is_some_and(|c| c.is_uppercase()) {
        let mut chars = replacement.chars();
        return match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
    }
    replacement.to_string()
}
