use rapidfuzz::distance::{jaro_winkler, levenshtein};
use tokio_util::sync::CancellationToken;

use crate::core::{MatchResult, MatchType, StrategyKind};
use crate::error::Result;
use crate::ranking::{check_cancelled, MatchStrategy, PassContext, PreparedCandidate};
use crate::text::normalize_text;

/// Results below this confidence are not emitted
const SIMILARITY_FLOOR: f64 = 0.05;

/// `1 - distance / max(len)` over already-normalized strings (0.0 - 1.0)
#[inline]
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    levenshtein::normalized_similarity(a.chars(), b.chars())
}

/// Normalized edit-distance similarity between raw query and candidate name
pub fn score(query: &str, candidate_name: &str) -> f64 {
    levenshtein_similarity(&normalize_text(query), &normalize_text(candidate_name))
}

/// Levenshtein blended with Jaro-Winkler by `similarity_weight`
#[inline]
pub fn blended_similarity(a: &str, b: &str, similarity_weight: f64) -> (f64, f64, f64) {
    let lev = levenshtein_similarity(a, b);
    let jw = if a.is_empty() || b.is_empty() {
        0.0
    } else {
        jaro_winkler::normalized_similarity(a.chars(), b.chars())
    };
    let blended = similarity_weight * lev + (1.0 - similarity_weight) * jw;
    (blended.clamp(0.0, 1.0), lev, jw)
}

/// Whole-name string similarity strategy
#[derive(Debug, Default, Clone, Copy)]
pub struct SimilarityStrategy;

impl SimilarityStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl MatchStrategy for SimilarityStrategy {
    fn run(
        &self,
        ctx: &PassContext<'_>,
        corpus: &[PreparedCandidate<'_>],
        cancel: &CancellationToken,
    ) -> Result<Vec<MatchResult>> {
        let weight = ctx.config.similarity_weight;
        let mut results = Vec::new();

        for (i, prepared) in corpus.iter().enumerate() {
            check_cancelled(i, cancel)?;

            let (confidence, lev, jw) =
                blended_similarity(&ctx.normalized, &prepared.normalized, weight);
            if confidence < SIMILARITY_FLOOR {
                continue;
            }

            let match_type = if prepared.normalized == ctx.normalized {
                MatchType::Exact
            } else {
                MatchType::Partial
            };
            let explanation = format!(
                "levenshtein {:.2} x {:.2} + jaro-winkler {:.2} x {:.2}",
                lev,
                weight,
                jw,
                1.0 - weight
            );

            results.push(
                MatchResult::new(prepared.candidate, confidence, StrategyKind::Similarity)
                    .with_reasoning(format!("Similar name ({:.0}%)", confidence * 100.0))
                    .with_details(prepared.details(
                        &ctx.tokens,
                        match_type,
                        confidence * 100.0,
                        explanation,
                    )),
            );
        }

        Ok(results)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Similarity
    }
}
