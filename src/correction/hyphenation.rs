//! Rejoin words split across a line break by the typesetter

use super::cleanup::is_latin_letter;
use super::dictionary::CorrectionDictionary;

/// Merge `prefix-` at a line end with the first word of the next line when
/// the joined word is in the dictionary. The continuation word moves up to
/// the hyphenated line; an emptied line is dropped. Returns the repaired
/// text and the number of merges.
pub fn repair(text: &str, dictionary: &CorrectionDictionary) -> (String, usize) {
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    let mut merged = 0;
    let mut i = 0;

    while i + 1 < lines.len() {
        let Some(joined) = try_merge(&lines[i], &lines[i + 1], dictionary) else {
            i += 1;
            continue;
        };

        let (line, rest) = joined;
        lines[i] = line;
        if rest.is_empty() {
            lines.remove(i + 1);
        } else {
            lines[i + 1] = rest;
        }
        merged += 1;
        // The merged line may end in another hyphenated fragment
    }

    (lines.join("\n"), merged)
}

fn try_merge(
    line: &str,
    next: &str,
    dictionary: &CorrectionDictionary,
) -> Option<(String, String)> {
    let line = line.trim_end();
    let head = line.strip_suffix('-')?;

    let prefix_start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_latin_letter(*c))
        .last()
        .map(|(idx, _)| idx)?;
    let prefix = &head[prefix_start..];
    // A fragment glued to other text is part of a compound
    if prefix_start > 0 && !head[..prefix_start].ends_with(char::is_whitespace) {
        return None;
    }

    let next = next.trim_start();
    let word_end = next.find(char::is_whitespace).unwrap_or(next.len());
    let continuation = &next[..word_end];
    let letters_end = continuation
        .char_indices()
        .find(|(_, c)| !is_latin_letter(*c))
        .map(|(idx, _)| idx)
        .unwrap_or(continuation.len());
    if letters_end == 0 {
        return None;
    }

    let candidate = format!("{}{}", prefix, &continuation[..letters_end]);
    if !dictionary.contains(&candidate) {
        return None;
    }

    let joined = format!("{}{}", head, continuation);
    let rest = next[word_end..].trim_start().to_string();
    Some((joined, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> CorrectionDictionary {
        CorrectionDictionary::from_words(["organizing", "memorial", "beloved", "community"])
    }

    #[test]
    fn test_split_word_is_rejoined() {
        let (text, merged) = repair("organiz-\ning", &dict());
        assert_eq!(text, "organizing");
        assert_eq!(merged, 1);
    }

    #[test]
    fn test_rest_of_next_line_is_kept() {
        let (text, merged) = repair("He led the com-\nmunity center for years", &dict());
        assert_eq!(text, "He led the community\ncenter for years");
        assert_eq!(merged, 1);
    }

    #[test]
    fn test_trailing_punctuation_moves_with_word() {
        let (text, _) = repair("A memo-\nrial, held Sunday", &dict());
        assert_eq!(text, "A memorial,\nheld Sunday");
    }

    #[test]
    fn test_merge_is_case_insensitive() {
        let (text, merged) = repair("BE-\nLOVED son", &dict());
        assert_eq!(text, "BELOVED\nson");
        assert_eq!(merged, 1);
    }

    #[test]
    fn test_unknown_join_is_left_intact() {
        let input = "well-\nknown activist";
        let (text, merged) = repair(input, &dict());
        assert_eq!(text, input);
        assert_eq!(merged, 0);
    }

    #[test]
    fn test_blank_next_line_blocks_merge() {
        let input = "organiz-\n\ning";
        let (text, merged) = repair(input, &dict());
        assert_eq!(text, input);
        assert_eq!(merged, 0);
    }

    #[test]
    fn test_dash_without_word_is_ignored() {
        let input = "Services Friday -\nall welcome";
        assert_eq!(repair(input, &dict()).0, input);
    }

    #[test]
    fn test_compound_prefix_is_not_merged() {
        let input = "ex-organiz-\ning";
        assert_eq!(repair(input, &dict()).0, input);
    }
}
