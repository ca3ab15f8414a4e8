//! Adaptive hybrid strategy.
//!
//! Classifies the query and picks a blend of sub-scores for it:
//!
//! | kind      | blend                                   | bonuses                  |
//! |-----------|-----------------------------------------|--------------------------|
//! | SIMPLE    | `w·sim + (1-w)·kw`                      | none                     |
//! | TECHNICAL | `0.5·art + 0.5·w·sim + 0.5·(1-w)·kw`    | article                  |
//! | MIXED     | `0.8·w·sim + 0.8·(1-w)·kw + 0.2·art`    | article, size, brand     |
//!
//! `w` is `similarity_weight`. The blend is scaled to points (x100), bonuses
//! are added in points, and `confidence = clamp(points / 100, 0, 1)`.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::ResolvedConfig;
use crate::core::{MatchResult, MatchType, StrategyKind};
use crate::error::Result;
use crate::ranking::keyword::{keyword_overlap, NoSynonyms, SynonymLookup};
use crate::ranking::similarity::levenshtein_similarity;
use crate::ranking::{check_cancelled, MatchStrategy, PassContext, PreparedCandidate};
use crate::text::QueryKind;

/// Results below this confidence are not emitted
const ADAPTIVE_FLOOR: f64 = 0.05;

/// Keyword overlap needed to call a match SEMANTIC
const SEMANTIC_OVERLAP: f64 = 0.5;

/// Sub-score weights for one query kind (sum to 1)
#[derive(Debug, Clone, Copy, PartialEq)]
struct Blend {
    similarity: f64,
    keyword: f64,
    article: f64,
}

impl Blend {
    fn for_kind(kind: QueryKind, similarity_weight: f64) -> Self {
        let w = similarity_weight;
        match kind {
            QueryKind::Simple => Blend {
                similarity: w,
                keyword: 1.0 - w,
                article: 0.0,
            },
            QueryKind::Technical => Blend {
                similarity: 0.5 * w,
                keyword: 0.5 * (1.0 - w),
                article: 0.5,
            },
            QueryKind::Mixed => Blend {
                similarity: 0.8 * w,
                keyword: 0.8 * (1.0 - w),
                article: 0.2,
            },
        }
    }
}

/// Structural bonuses awarded to one candidate, in points
#[derive(Debug, Default)]
struct Bonuses {
    points: f64,
    trace: Vec<String>,
}

impl Bonuses {
    fn add(&mut self, label: &str, points: f64, tokens: &[&String]) {
        if tokens.is_empty() || points == 0.0 {
            return;
        }
        self.points += points;
        let names: Vec<&str> = tokens.iter().map(|t| t.as_str()).collect();
        self.trace
            .push(format!("+{} {} [{}]", points, label, names.join(", ")));
    }
}

/// Classifier-driven blend of similarity, keyword and structural matches
pub struct AdaptiveStrategy {
    synonyms: Arc<dyn SynonymLookup>,
}

impl AdaptiveStrategy {
    pub fn new(synonyms: Arc<dyn SynonymLookup>) -> Self {
        Self { synonyms }
    }

    fn score_candidate(
        &self,
        ctx: &PassContext<'_>,
        prepared: &PreparedCandidate<'_>,
        blend: Blend,
    ) -> Option<MatchResult> {
        let config: &ResolvedConfig = ctx.config;
        let tokens = &ctx.tokens;

        let sim = levenshtein_similarity(&ctx.normalized, &prepared.normalized);
        let candidate_terms: Vec<&String> = prepared.name_tokens.all().collect();
        let keywords = keyword_overlap(&tokens.material, &candidate_terms, self.synonyms.as_ref());

        let article_hits = prepared.matched(&tokens.article);
        let size_hits = prepared.matched(&tokens.size);
        let brand_hits = prepared.matched(&tokens.brand);
        let article_coverage = if tokens.article.is_empty() {
            0.0
        } else {
            article_hits.len() as f64 / tokens.article.len() as f64
        };

        let base = 100.0
            * (blend.similarity * sim
                + blend.keyword * keywords.ratio
                + blend.article * article_coverage);

        let mut bonuses = Bonuses::default();
        match ctx.kind {
            QueryKind::Simple => {}
            QueryKind::Technical => {
                bonuses.add("article", config.article_bonus, &article_hits);
            }
            QueryKind::Mixed => {
                bonuses.add("article", config.article_bonus, &article_hits);
                bonuses.add("size", config.size_bonus, &size_hits);
                bonuses.add("brand", config.brand_bonus, &brand_hits);
            }
        }

        let score = base + bonuses.points;
        let confidence = (score / 100.0).clamp(0.0, 1.0);
        if confidence < ADAPTIVE_FLOOR {
            return None;
        }

        let match_type = if prepared.normalized == ctx.normalized || !article_hits.is_empty() {
            MatchType::Exact
        } else if !brand_hits.is_empty() {
            MatchType::Brand
        } else if !size_hits.is_empty() {
            MatchType::Size
        } else if keywords.ratio >= SEMANTIC_OVERLAP {
            MatchType::Semantic
        } else {
            MatchType::Partial
        };

        let mut explanation = format!(
            "{}: similarity {:.2} x {:.2}, keywords {}/{} ({:.2}) x {:.2}, articles {}/{} x {:.2}",
            ctx.kind,
            sim,
            blend.similarity,
            keywords.hits(),
            tokens.material.len(),
            keywords.ratio,
            blend.keyword,
            article_hits.len(),
            tokens.article.len(),
            blend.article,
        );
        for entry in &bonuses.trace {
            explanation.push_str("; ");
            explanation.push_str(entry);
        }
        explanation.push_str(&format!("; score {:.1}", score));

        let reasoning = format!(
            "{} query, {} match ({:.0}%)",
            ctx.kind,
            match_type.as_str(),
            confidence * 100.0
        );

        Some(
            MatchResult::new(prepared.candidate, confidence, StrategyKind::Adaptive)
                .with_reasoning(reasoning)
                .with_details(prepared.details(tokens, match_type, score, explanation)),
        )
    }
}

impl Default for AdaptiveStrategy {
    fn default() -> Self {
        Self::new(Arc::new(NoSynonyms))
    }
}

impl MatchStrategy for AdaptiveStrategy {
    fn run(
        &self,
        ctx: &PassContext<'_>,
        corpus: &[PreparedCandidate<'_>],
        cancel: &CancellationToken,
    ) -> Result<Vec<MatchResult>> {
        if ctx.tokens.is_empty() {
            return Ok(Vec::new());
        }

        let blend = Blend::for_kind(ctx.kind, ctx.config.similarity_weight);
        tracing::trace!("Adaptive blend for {}: {:?}", ctx.kind, blend);

        let mut results = Vec::new();
        for (i, prepared) in corpus.iter().enumerate() {
            check_cancelled(i, cancel)?;
            if let Some(result) = self.score_candidate(ctx, prepared, blend) {
                results.push(result);
            }
        }

        Ok(results)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Adaptive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::core::{Candidate, Query};
    use crate::ranking::prepare_corpus;

    fn run(query: &str, candidates: &[Candidate]) -> Vec<MatchResult> {
        let config = EngineConfig::default().resolve();
        let query = Query::new(query);
        let ctx = PassContext::new(&query, &config);
        let token = CancellationToken::new();
        let corpus = prepare_corpus(candidates, &config, &token).unwrap();
        AdaptiveStrategy::default().run(&ctx, &corpus, &token).unwrap()
    }

    fn find<'a>(results: &'a [MatchResult], id: &str) -> &'a MatchResult {
        results.iter().find(|r| r.id == id).unwrap()
    }

    #[test]
    fn test_blends_sum_to_one() {
        for kind in [QueryKind::Simple, QueryKind::Technical, QueryKind::Mixed] {
            let blend = Blend::for_kind(kind, 0.6);
            let total = blend.similarity + blend.keyword + blend.article;
            assert!((total - 1.0).abs() < 1e-9, "{:?}", kind);
        }
    }

    #[test]
    fn test_technical_article_bonus() {
        let candidates = vec![
            Candidate::new("full", "Кран шаровой резьбовой BVR-R DN32 065B8310R Ридан"),
            Candidate::new("no-article", "Кран шаровой резьбовой BVR-R DN32 Ридан"),
        ];
        let results = run("Кран шаровой DN32 065B8310R Ридан", &candidates);

        let full = find(&results, "full");
        let partial = find(&results, "no-article");
        assert!(full.confidence > partial.confidence);
        assert_eq!(full.match_type(), MatchType::Exact);

        let details = full.match_details.as_ref().unwrap();
        assert_eq!(details.article_tokens, vec!["dn32", "065b8310r"]);
        assert!(details.explanation.starts_with("TECHNICAL"));
        assert!(details.explanation.contains("+20 article"));
    }

    #[test]
    fn test_mixed_size_and_brand_bonuses() {
        let candidates = vec![
            Candidate::new("1", "Утеплитель Rockwool Лайт Баттс 50мм"),
            Candidate::new("2", "Утеплитель Rockwool Лайт Баттс 100мм"),
            Candidate::new("3", "Утеплитель Isover Лайт 50мм"),
        ];
        let results = run("утеплитель Rockwool 50мм", &candidates);

        let both = find(&results, "1");
        let brand_only = find(&results, "2");
        let size_only = find(&results, "3");
        assert!(both.confidence > brand_only.confidence);
        assert!(both.confidence > size_only.confidence);
        assert_eq!(brand_only.match_type(), MatchType::Brand);
        assert_eq!(size_only.match_type(), MatchType::Size);

        let details = both.match_details.as_ref().unwrap();
        assert!(details.explanation.contains("+10 size"));
        assert!(details.explanation.contains("+8 brand"));
    }

    #[test]
    fn test_simple_query_has_no_bonuses() {
        let candidates = vec![Candidate::new("1", "Бетон товарный М300")];
        let results = run("бетон товарный", &candidates);

        let details = results[0].match_details.as_ref().unwrap();
        assert!(details.explanation.starts_with("SIMPLE"));
        assert!(!details.explanation.contains('+'));
        assert_eq!(results[0].match_type(), MatchType::Semantic);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let candidates = vec![Candidate::new("1", "Кран 065B8310R")];
        let results = run("Кран 065B8310R", &candidates);
        assert_eq!(results[0].confidence, 1.0);
        assert!(results[0].match_details.as_ref().unwrap().score > 100.0);
    }
}
