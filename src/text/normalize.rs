//! String normalization shared by the tokenizer and every strategy.

use unicode_normalization::UnicodeNormalization;

/// Characters treated as a dimension separator between two numbers
const DIMENSION_SEPARATORS: &[char] = &['x', 'X', 'х', 'Х', '×', '*'];

/// Punctuation that survives inside a token (article codes, decimals)
const INNER_PUNCTUATION: &[char] = &['-', '.', '/'];

/// NFC + lowercase + `ё`→`е`
#[inline]
pub fn fold_case(text: &str) -> String {
    text.nfc()
        .collect::<String>()
        .to_lowercase()
        .replace('ё', "е")
}

/// Split free text into case-preserving tokens.
///
/// Dimension separators between digits collapse to `x` (`100 х 200` →
/// `100x200`), the first comma inside a number becomes a decimal point, and
/// any other punctuation acts as a separator.
pub fn split_raw(text: &str) -> Vec<String> {
    let text: String = text.nfc().collect::<String>().replace('ё', "е").replace('Ё', "Е");
    let chars: Vec<char> = text.chars().collect();

    let mut buf = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        if DIMENSION_SEPARATORS.contains(&c) && prev_is_digit(&buf) {
            if let Some(next) = next_non_space(&chars, i + 1) {
                if chars[next].is_ascii_digit() {
                    buf.truncate(buf.trim_end().len());
                    buf.push('x');
                    i = next;
                    continue;
                }
            }
        }

        if c == ',' && i > 0 && chars[i - 1].is_ascii_digit() && !current_number_has_point(&buf) {
            if chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()) {
                buf.push('.');
                i += 1;
                continue;
            }
        }

        buf.push(c);
        i += 1;
    }

    buf.split(|c: char| !(c.is_alphanumeric() || INNER_PUNCTUATION.contains(&c)))
        .map(|t| t.trim_matches(|c: char| INNER_PUNCTUATION.contains(&c)))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Canonical comparable form: folded tokens joined by single spaces
pub fn normalize_text(text: &str) -> String {
    split_raw(text)
        .iter()
        .map(|t| fold_case(t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Article form used for code comparison (`065B-8310R` == `065b8310r`)
#[inline]
pub fn compact(token: &str) -> String {
    token
        .chars()
        .filter(|c| !INNER_PUNCTUATION.contains(c))
        .collect()
}

#[inline]
fn prev_is_digit(buf: &str) -> bool {
    buf.trim_end()
        .chars()
        .last()
        .is_some_and(|c| c.is_ascii_digit())
}

/// A number already carries a decimal point (`10.20` in `10,20,30`)
#[inline]
fn current_number_has_point(buf: &str) -> bool {
    buf.chars()
        .rev()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .any(|c| c == '.')
}

#[inline]
fn next_non_space(chars: &[char], from: usize) -> Option<usize> {
    (from..chars.len()).find(|&j| !chars[j].is_whitespace())
}
