use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ResolvedConfig;
use crate::text::normalize::{fold_case, split_raw};

/// Dimension token: `32`, `1.5`, `100x200x3`, `50мм`
static SIZE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+(?:\.\d+)?(?:x\d+(?:\.\d+)?)*(?:мм|см|дм|м|mm|cm|m)?$").unwrap()
});

const MIN_ARTICLE_LEN: usize = 4;

const VOWELS: &[char] = &[
    'a', 'e', 'i', 'o', 'u', 'y', 'а', 'е', 'ё', 'и', 'о', 'у', 'ы', 'э', 'ю', 'я',
];

/// Query or candidate text split into typed token groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Descriptive words
    pub material: Vec<String>,
    /// Numbers and dimensions
    pub size: Vec<String>,
    /// Manufacturer / brand names
    pub brand: Vec<String>,
    /// Part numbers and codes
    pub article: Vec<String>,
}

impl TokenSet {
    pub fn is_empty(&self) -> bool {
        self.material.is_empty()
            && self.size.is_empty()
            && self.brand.is_empty()
            && self.article.is_empty()
    }

    pub fn len(&self) -> usize {
        self.material.len() + self.size.len() + self.brand.len() + self.article.len()
    }

    /// Every token regardless of bucket
    pub fn all(&self) -> impl Iterator<Item = &String> {
        self.material
            .iter()
            .chain(self.size.iter())
            .chain(self.brand.iter())
            .chain(self.article.iter())
    }

    fn push_unique(bucket: &mut Vec<String>, token: String) {
        if !bucket.contains(&token) {
            bucket.push(token);
        }
    }
}

/// Normalize `text` and sort its tokens into material/size/brand/article.
///
/// Ignored terms never reach any bucket; the minimum word length only
/// applies to material words.
pub fn tokenize(text: &str, config: &ResolvedConfig) -> TokenSet {
    let raw_tokens = split_raw(text);
    // A query typed entirely in capitals carries no brand signal in its casing
    let casing_is_informative = text.chars().any(|c| c.is_lowercase());

    let mut set = TokenSet::default();
    for raw in raw_tokens {
        let token = fold_case(&raw);
        if config.is_ignored(&token) {
            continue;
        }

        if SIZE_RE.is_match(&token) {
            TokenSet::push_unique(&mut set.size, token);
        } else if is_article(&token) {
            TokenSet::push_unique(&mut set.article, token);
        } else if config.is_known_brand(&token)
            || (casing_is_informative && looks_like_brand(&raw))
        {
            TokenSet::push_unique(&mut set.brand, token);
        } else if token.chars().count() >= config.min_word_length {
            TokenSet::push_unique(&mut set.material, token);
        }
    }

    set
}

/// Normalized text with ignored terms dropped, other tokens in typed order
pub fn normalize_query(text: &str, config: &ResolvedConfig) -> String {
    split_raw(text)
        .iter()
        .map(|raw| fold_case(raw))
        .filter(|token| !config.is_ignored(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Mixed letters and digits, at least four characters
fn is_article(token: &str) -> bool {
    token.chars().count() >= MIN_ARTICLE_LEN
        && token.chars().any(|c| c.is_numeric())
        && token.chars().any(|c| c.is_alphabetic())
        && token
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '.' | '/'))
}

/// Upper-case consonant cluster such as `BVR-R`
fn looks_like_brand(raw: &str) -> bool {
    if !raw.chars().all(|c| c.is_alphabetic() || c == '-') {
        return false;
    }

    let letters: Vec<char> = raw.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2
        && letters.iter().all(|c| c.is_uppercase())
        && letters
            .iter()
            .all(|c| !c.to_lowercase().any(|l| VOWELS.contains(&l)))
}
