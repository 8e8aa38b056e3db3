//! Contextual digit/letter confusion fixes
//!
//! Scanned newsprint routinely reads `l` as `1` inside words and `0` as `o`
//! inside years. Each maximal run of letters and ASCII digits is classified
//! on its own; nothing is replaced globally.

use super::cleanup::is_latin_letter;

/// Letter suffixes that legitimately follow a number
const NUMERIC_SUFFIXES: &[&str] = &[
    "st", "nd", "rd", "th", "s", // ordinals, decades
    "am", "pm", "h", "hr", "hrs", "min", "mins", // clock
    "yr", "yrs", "mo", "mos", "wk", "wks", // age
    "ft", "lb", "lbs", "oz", "mm", "cm", "km", "kg", "mi", "mph", // units
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunKind {
    Numeric,
    Alphabetic,
    Other,
}

/// Apply the confusion policy to every alphanumeric run.
/// Returns the fixed text and the number of characters changed.
pub fn fix_confusions(text: &str) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();
    let mut fixes = 0;

    for c in text.chars() {
        if is_run_char(c) {
            run.push(c);
            continue;
        }
        fixes += flush(&mut run, &mut out);
        out.push(c);
    }
    fixes += flush(&mut run, &mut out);

    (out, fixes)
}

fn is_run_char(c: char) -> bool {
    c.is_ascii_digit() || is_latin_letter(c)
}

fn flush(run: &mut String, out: &mut String) -> usize {
    if run.is_empty() {
        return 0;
    }
    let (fixed, changed) = fix_run(run);
    out.push_str(&fixed);
    run.clear();
    changed
}

fn fix_run(run: &str) -> (String, usize) {
    match classify(run) {
        RunKind::Numeric => map_chars(run, |c| match c {
            'O' | 'o' => Some('0'),
            'l' | 'I' => Some('1'),
            _ => None,
        }),
        RunKind::Alphabetic => {
            let letters: Vec<char> = run.chars().filter(|c| !c.is_ascii_digit()).collect();
            let upper = letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase());
            map_chars(run, |c| {
                let lower = match c {
                    '0' => 'o',
                    '1' => 'l',
                    '4' => 'a',
                    '5' => 's',
                    _ => return None,
                };
                Some(if upper { lower.to_ascii_uppercase() } else { lower })
            })
        }
        RunKind::Other => (run.to_string(), 0),
    }
}

fn map_chars(run: &str, f: impl Fn(char) -> Option<char>) -> (String, usize) {
    let mut changed = 0;
    let fixed = run
        .chars()
        .map(|c| match f(c) {
            Some(replacement) => {
                changed += 1;
                replacement
            }
            None => c,
        })
        .collect();
    (fixed, changed)
}

fn classify(run: &str) -> RunKind {
    let digits = run.chars().filter(char::is_ascii_digit).count();
    let letters = run.chars().count() - digits;

    if digits == 0 || letters == 0 {
        return RunKind::Other;
    }

    let confusable_letters = run
        .chars()
        .filter(|c| !c.is_ascii_digit())
        .all(|c| matches!(c, 'O' | 'o' | 'l' | 'I'));
    if confusable_letters && digits >= letters {
        return RunKind::Numeric;
    }

    if letters > digits && !has_numeric_suffix(run) {
        return RunKind::Alphabetic;
    }

    RunKind::Other
}

/// Digits followed by an ordinal, decade, clock or unit suffix:
/// `21st`, `1990s`, `1pm`, `10am`, `6ft`, `12lbs`
fn has_numeric_suffix(run: &str) -> bool {
    let digits_end = run
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(idx, _)| idx)
        .unwrap_or(run.len());
    if digits_end == 0 {
        return false;
    }
    let suffix = run[digits_end..].to_ascii_lowercase();
    NUMERIC_SUFFIXES.contains(&suffix.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_inside_word_becomes_letter() {
        let (text, fixes) = fix_confusions("He 1oved his partner");
        assert_eq!(text, "He loved his partner");
        assert_eq!(fixes, 1);
    }

    #[test]
    fn test_years_are_untouched() {
        let (text, fixes) = fix_confusions("In 1991");
        assert_eq!(text, "In 1991");
        assert_eq!(fixes, 0);
    }

    #[test]
    fn test_letter_inside_year_becomes_digit() {
        assert_eq!(fix_confusions("class of '9o").0, "class of '90");
        assert_eq!(fix_confusions("born 19O5").0, "born 1905");
        assert_eq!(fix_confusions("died l987").0, "died 1987");
    }

    #[test]
    fn test_ordinals_and_decades_survive() {
        let input = "the 21st and 3rd of May, in the 1990s, 5th floor";
        assert_eq!(fix_confusions(input), (input.to_string(), 0));
    }

    #[test]
    fn test_clock_times_and_units_survive() {
        for input in [
            "Services at 1pm",
            "at 4pm Sunday",
            "5am",
            "10:30am Mass",
            "Reception 2PM",
            "aged 5yrs, 6ft tall",
        ] {
            assert_eq!(fix_confusions(input), (input.to_string(), 0));
        }
        // A letter run behind the digit is still a word
        assert_eq!(fix_confusions("5urvived").0, "survived");
    }

    #[test]
    fn test_uppercase_run_keeps_case() {
        assert_eq!(fix_confusions("IN L0VING MEM0RY").0, "IN LOVING MEMORY");
    }

    #[test]
    fn test_runs_without_letter_majority_are_kept() {
        assert_eq!(fix_confusions("A5").0, "A5");
        assert_eq!(fix_confusions("F0r").0, "For");
        assert_eq!(fix_confusions("a0b1").0, "a0b1");
    }

    #[test]
    fn test_common_substitutions() {
        assert_eq!(fix_confusions("p4rtner").0, "partner");
        assert_eq!(fix_confusions("5urvived").0, "survived");
        assert_eq!(fix_confusions("fami1y").0, "family");
    }

    #[test]
    fn test_mixed_runs_are_left_alone() {
        let input = "Suite 4B, zip 94103";
        assert_eq!(fix_confusions(input).0, input);
    }
}
