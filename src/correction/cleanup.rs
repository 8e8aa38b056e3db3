//! Line normalization and irregular-character removal

/// Punctuation that carries meaning in a notice and survives cleanup
const KEPT_PUNCTUATION: &[char] = &['.', ',', '\'', '-', '(', ')', ':', ';', '!', '?', '&', '/'];

/// Unify line endings and trim every line
pub fn normalize_lines(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strip control characters and glyphs outside the Latin script.
///
/// Quote glyphs fold to an apostrophe, long dashes to a hyphen, and runs of
/// spaces collapse. Returns the cleaned text and how many characters were
/// dropped.
pub fn remove_irregular(text: &str) -> (String, usize) {
    let mut kept = String::with_capacity(text.len());
    let mut removed = 0;

    for c in text.chars() {
        match c {
            '\n' => kept.push('\n'),
            c if c.is_whitespace() => kept.push(' '),
            c if c.is_control() => removed += 1,
            '"' | '`' | '´' | '‘' | '’' | '“' | '”' => kept.push('\''),
            '–' | '—' => kept.push('-'),
            c if is_latin_letter(c) || c.is_ascii_digit() || KEPT_PUNCTUATION.contains(&c) => {
                kept.push(c)
            }
            _ => removed += 1,
        }
    }

    let collapsed = kept
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n");

    (collapsed, removed)
}

/// ASCII letters plus the accented Latin ranges used in names
pub fn is_latin_letter(c: char) -> bool {
    c.is_ascii_alphabetic()
        || (c.is_alphabetic() && matches!(c, '\u{00C0}'..='\u{024F}' | '\u{1E00}'..='\u{1EFF}'))
}
