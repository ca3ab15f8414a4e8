use serde::{Deserialize, Serialize};

use crate::text::tokenizer::TokenSet;

/// Shape of a query, drives strategy weighting in the adaptive matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryKind {
    /// Pure descriptive name
    Simple,
    /// Dominated by a part number
    Technical,
    /// Description plus structured tokens
    Mixed,
}

impl QueryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::Simple => "SIMPLE",
            QueryKind::Technical => "TECHNICAL",
            QueryKind::Mixed => "MIXED",
        }
    }
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label a tokenized query.
///
/// Material words count as minimal for TECHNICAL when there is at most one
/// of them or they do not outnumber the article tokens.
pub fn classify(tokens: &TokenSet) -> QueryKind {
    if tokens.article.is_empty() && tokens.size.is_empty() && tokens.brand.is_empty() {
        return QueryKind::Simple;
    }

    let materials = tokens.material.len();
    if !tokens.article.is_empty() && (materials <= 1 || materials <= tokens.article.len()) {
        QueryKind::Technical
    } else {
        QueryKind::Mixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::text::tokenizer::tokenize;

    fn kind(text: &str) -> QueryKind {
        classify(&tokenize(text, &EngineConfig::default().resolve()))
    }

    #[test]
    fn test_simple() {
        assert_eq!(kind("бетон товарный"), QueryKind::Simple);
        assert_eq!(kind(""), QueryKind::Simple);
    }

    #[test]
    fn test_technical() {
        assert_eq!(kind("065B8310R"), QueryKind::Technical);
        assert_eq!(kind("кран 065B8310R"), QueryKind::Technical);
        assert_eq!(kind("Кран шаровой DN32 065B8310R Ридан"), QueryKind::Technical);
    }

    #[test]
    fn test_mixed() {
        assert_eq!(kind("Пеноплэкс Комфорт 50мм"), QueryKind::Mixed);
        assert_eq!(kind("кран шаровой латунный 065B8310R"), QueryKind::Mixed);
        assert_eq!(kind("утеплитель Rockwool"), QueryKind::Mixed);
    }
}
