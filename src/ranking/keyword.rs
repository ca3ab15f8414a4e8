//! Keyword/semantic matcher.
//!
//! Scores candidates by how many query material words they contain, either
//! verbatim, through a pluggable synonym table, or by a shared word stem
//! (Russian inflection: `шаровой` / `шаровый`).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::core::{MatchResult, MatchType, StrategyKind};
use crate::error::Result;
use crate::ranking::{check_cancelled, MatchStrategy, PassContext, PreparedCandidate};
use crate::text::fold_case;

const SYNONYM_HIT_WEIGHT: f64 = 0.9;
const STEM_HIT_WEIGHT: f64 = 0.75;

/// Shortest common prefix counted as a shared stem
const MIN_STEM_LEN: usize = 4;
/// Inflection tail allowed on the shorter word
const MAX_STEM_TAIL: usize = 2;

/// Pluggable synonym/morphology table
pub trait SynonymLookup: Send + Sync {
    /// Case-folded synonyms of a case-folded term (without the term itself)
    fn synonyms(&self, term: &str) -> Vec<String>;
}

/// Lookup with no entries
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSynonyms;

impl SynonymLookup for NoSynonyms {
    fn synonyms(&self, _term: &str) -> Vec<String> {
        Vec::new()
    }
}

/// In-memory table of bidirectional synonym groups
#[derive(Debug, Default, Clone)]
pub struct SynonymTable {
    entries: HashMap<String, Vec<String>>,
}

impl SynonymTable {
    /// Every word in a group is a synonym of every other word in it
    pub fn from_groups<I, G, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: HashMap<String, Vec<String>> = HashMap::new();
        for group in groups {
            let words: Vec<String> = group
                .into_iter()
                .map(|w| fold_case(w.as_ref().trim()))
                .filter(|w| !w.is_empty())
                .collect();
            for word in &words {
                let slot = entries.entry(word.clone()).or_default();
                for other in &words {
                    if other != word && !slot.contains(other) {
                        slot.push(other.clone());
                    }
                }
            }
        }
        Self { entries }
    }

    /// Parse `[["пеноплекс", "экструдированный пенополистирол"], ...]`
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let groups: Vec<Vec<String>> = serde_json::from_str(json)?;
        Ok(Self::from_groups(groups))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SynonymLookup for SynonymTable {
    fn synonyms(&self, term: &str) -> Vec<String> {
        self.entries.get(term).cloned().unwrap_or_default()
    }
}

/// How well a candidate covers the query keywords
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordOverlap {
    /// Verbatim hits
    pub exact: usize,
    /// Synonym or stem hits
    pub soft: usize,
    /// Weighted hits / query keywords (0.0 - 1.0)
    pub ratio: f64,
    /// Query keywords that hit
    pub matched: Vec<String>,
}

impl KeywordOverlap {
    pub fn hits(&self) -> usize {
        self.exact + self.soft
    }
}

/// Overlap between query keywords and candidate terms
pub fn keyword_overlap(
    query_terms: &[String],
    candidate_terms: &[&String],
    synonyms: &dyn SynonymLookup,
) -> KeywordOverlap {
    if query_terms.is_empty() || candidate_terms.is_empty() {
        return KeywordOverlap::default();
    }

    let terms: HashSet<&str> = candidate_terms.iter().map(|t| t.as_str()).collect();
    let mut overlap = KeywordOverlap::default();
    let mut weight = 0.0;

    for term in query_terms {
        if terms.contains(term.as_str()) {
            overlap.exact += 1;
            weight += 1.0;
        } else if synonyms
            .synonyms(term)
            .iter()
            .any(|s| terms.contains(s.as_str()))
        {
            overlap.soft += 1;
            weight += SYNONYM_HIT_WEIGHT;
        } else if terms.iter().any(|c| shares_stem(term, c)) {
            overlap.soft += 1;
            weight += STEM_HIT_WEIGHT;
        } else {
            continue;
        }
        overlap.matched.push(term.clone());
    }

    overlap.ratio = (weight / query_terms.len() as f64).clamp(0.0, 1.0);
    overlap
}

/// Same word up to a short inflection tail
pub fn shares_stem(a: &str, b: &str) -> bool {
    let prefix = a
        .chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .count();
    let shorter = a.chars().count().min(b.chars().count());
    prefix >= MIN_STEM_LEN && prefix + MAX_STEM_TAIL >= shorter
}

/// Keyword overlap + configured bonuses
pub struct KeywordStrategy {
    synonyms: Arc<dyn SynonymLookup>,
}

impl KeywordStrategy {
    pub fn new(synonyms: Arc<dyn SynonymLookup>) -> Self {
        Self { synonyms }
    }
}

impl Default for KeywordStrategy {
    fn default() -> Self {
        Self::new(Arc::new(NoSynonyms))
    }
}

impl MatchStrategy for KeywordStrategy {
    fn run(
        &self,
        ctx: &PassContext<'_>,
        corpus: &[PreparedCandidate<'_>],
        cancel: &CancellationToken,
    ) -> Result<Vec<MatchResult>> {
        let keywords = &ctx.tokens.material;
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let config = ctx.config;
        let mut results = Vec::new();

        for (i, prepared) in corpus.iter().enumerate() {
            check_cancelled(i, cancel)?;

            let candidate_terms: Vec<&String> = prepared.name_tokens.all().collect();
            let overlap = keyword_overlap(keywords, &candidate_terms, self.synonyms.as_ref());
            if overlap.hits() == 0 {
                continue;
            }

            let contains = prepared.normalized.contains(ctx.normalized.as_str());
            let prefix = prepared.normalized.starts_with(ctx.normalized.as_str());

            let mut raw = config.keyword_weight * overlap.ratio
                + config.keyword_bonus * overlap.exact as f64;
            if contains {
                raw += config.exact_match_bonus;
            }
            if prefix {
                raw += config.prefix_bonus;
            }
            let confidence = raw.clamp(0.0, 1.0);

            let match_type = if overlap.hits() == keywords.len() {
                MatchType::Semantic
            } else {
                MatchType::Partial
            };
            let explanation = format!(
                "keywords {}/{} (exact {}, soft {}) ratio {:.2}{}{}",
                overlap.hits(),
                keywords.len(),
                overlap.exact,
                overlap.soft,
                overlap.ratio,
                if contains { ", contains query" } else { "" },
                if prefix { ", starts with query" } else { "" },
            );

            results.push(
                MatchResult::new(prepared.candidate, confidence, StrategyKind::Keyword)
                    .with_reasoning(format!("Keywords: {}", overlap.matched.join(", ")))
                    .with_details(prepared.details(&ctx.tokens, match_type, raw * 100.0, explanation)),
            );
        }

        Ok(results)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Keyword
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::core::{Candidate, Query};
    use crate::ranking::prepare_corpus;

    fn run_with(strategy: &KeywordStrategy, query: &str, candidates: &[Candidate]) -> Vec<MatchResult> {
        let config = EngineConfig::default().resolve();
        let query = Query::new(query);
        let ctx = PassContext::new(&query, &config);
        let token = CancellationToken::new();
        let corpus = prepare_corpus(candidates, &config, &token).unwrap();
        strategy.run(&ctx, &corpus, &token).unwrap()
    }

    #[test]
    fn test_ignored_terms_keep_full_bonuses() {
        let config = EngineConfig {
            ignored_terms: vec!["м3".to_string()],
            ..Default::default()
        }
        .resolve();
        let candidates = vec![Candidate::new("1", "Бетон")];
        let token = CancellationToken::new();
        let corpus = prepare_corpus(&candidates, &config, &token).unwrap();
        let strategy = KeywordStrategy::new(Arc::new(NoSynonyms));

        let score = |text: &str| {
            let query = Query::new(text);
            let ctx = PassContext::new(&query, &config);
            strategy.run(&ctx, &corpus, &token).unwrap()[0].confidence
        };

        assert!((score("бетон") - 0.95).abs() < 1e-9);
        assert_eq!(score("бетон м3"), score("бетон"));
    }

    #[test]
    fn test_shares_stem() {
        assert!(shares_stem("шаровой", "шаровый"));
        assert!(shares_stem("кран", "краны"));
        assert!(!shares_stem("пеноплэкс", "пенополистирол"));
        assert!(!shares_stem("бак", "баки"));
    }

    #[test]
    fn test_keyword_overlap_weights() {
        let query = vec!["кран".to_string(), "шаровой".to_string(), "латунь".to_string()];
        let candidate = ["кран".to_string(), "шаровый".to_string()];
        let refs: Vec<&String> = candidate.iter().collect();

        let overlap = keyword_overlap(&query, &refs, &NoSynonyms);
        assert_eq!(overlap.exact, 1);
        assert_eq!(overlap.soft, 1);
        assert!((overlap.ratio - (1.0 + STEM_HIT_WEIGHT) / 3.0).abs() < 1e-9);
        assert_eq!(overlap.matched, vec!["кран", "шаровой"]);
    }

    #[test]
    fn test_synonym_table() {
        let table = SynonymTable::from_json(r#"[["Утеплитель", "теплоизоляция"]]"#).unwrap();
        assert_eq!(table.synonyms("утеплитель"), vec!["теплоизоляция"]);
        assert_eq!(table.synonyms("теплоизоляция"), vec!["утеплитель"]);
        assert!(table.synonyms("бетон").is_empty());
    }

    #[test]
    fn test_bonuses_are_additive_and_clamped() {
        let candidates = vec![
            Candidate::new("1", "Бетон М300"),
            Candidate::new("2", "Раствор бетон"),
            Candidate::new("3", "Кирпич"),
        ];
        let results = run_with(&KeywordStrategy::default(), "бетон", &candidates);

        assert_eq!(results.len(), 2);
        let prefix = results.iter().find(|r| r.id == "1").unwrap();
        let inner = results.iter().find(|r| r.id == "2").unwrap();
        // 0.6 + 0.05 + 0.2 + 0.1
        assert!((prefix.confidence - 0.95).abs() < 1e-9);
        // 0.6 + 0.05 + 0.2
        assert!((inner.confidence - 0.85).abs() < 1e-9);
        assert_eq!(prefix.match_type(), MatchType::Semantic);
    }

    #[test]
    fn test_synonym_hit_is_semantic() {
        let synonyms: Arc<dyn SynonymLookup> =
            Arc::new(SynonymTable::from_groups([["утеплитель", "теплоизоляция"]]));
        let strategy = KeywordStrategy::new(synonyms);
        let candidates = vec![Candidate::new("1", "Теплоизоляция минераловатная")];

        let results = run_with(&strategy, "утеплитель", &candidates);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].match_type(), MatchType::Semantic);
        assert!((results[0].confidence - 0.6 * SYNONYM_HIT_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn test_partial_coverage() {
        let candidates = vec![Candidate::new("1", "Кран латунный")];
        let results = run_with(&KeywordStrategy::default(), "кран шаровой", &candidates);
        assert_eq!(results[0].match_type(), MatchType::Partial);
    }

    #[test]
    fn test_no_material_tokens_yields_nothing() {
        let candidates = vec![Candidate::new("1", "Кран 065B8310R")];
        assert!(run_with(&KeywordStrategy::default(), "065B8310R", &candidates).is_empty());
    }
}
