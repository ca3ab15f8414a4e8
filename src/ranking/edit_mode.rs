//! Edit-mode matcher: the "pick the nearest name" cascade used to fill the
//! supplier-name column.
//!
//! Stages run in a fixed order and each only adds candidates that earlier
//! stages did not take. The cascade stops between stages once
//! `edit_mode_min_results` candidates were collected. Confidence bands are
//! disjoint (stage 1: 1.0, stage 2: 0.75-0.95, stage 3: 0.65-0.75,
//! stage 4: below 0.65), so a later stage never outranks an earlier one.

use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

use crate::config::CascadeProfile;
use crate::core::{MatchResult, MatchType, StrategyKind};
use crate::error::Result;
use crate::ranking::similarity::levenshtein_similarity;
use crate::ranking::{check_cancelled, MatchStrategy, PassContext, PreparedCandidate};

/// Shorter side of a containment match must have at least this many chars
const MIN_CONTAINMENT_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Exact,
    Containment,
    TokenOverlap,
    RelaxedSimilarity,
}

impl Stage {
    const CASCADE: [Stage; 4] = [
        Stage::Exact,
        Stage::Containment,
        Stage::TokenOverlap,
        Stage::RelaxedSimilarity,
    ];

    fn label(self) -> &'static str {
        match self {
            Stage::Exact => "exact",
            Stage::Containment => "containment",
            Stage::TokenOverlap => "token overlap",
            Stage::RelaxedSimilarity => "relaxed similarity",
        }
    }

    fn number(self) -> usize {
        match self {
            Stage::Exact => 1,
            Stage::Containment => 2,
            Stage::TokenOverlap => 3,
            Stage::RelaxedSimilarity => 4,
        }
    }

    /// Confidence and the measured value, or `None` when the stage misses
    fn evaluate(
        self,
        query: &str,
        query_words: &HashSet<&str>,
        candidate: &str,
        cascade: &CascadeProfile,
    ) -> Option<(f64, f64)> {
        match self {
            Stage::Exact => (candidate == query).then_some((1.0, 1.0)),
            Stage::Containment => {
                let (q_len, c_len) = (query.chars().count(), candidate.chars().count());
                let (shorter, longer) = (q_len.min(c_len), q_len.max(c_len));
                if shorter < MIN_CONTAINMENT_LEN {
                    return None;
                }
                if candidate.contains(query) || query.contains(candidate) {
                    let ratio = shorter as f64 / longer as f64;
                    Some((0.75 + 0.2 * ratio, ratio))
                } else {
                    None
                }
            }
            Stage::TokenOverlap => {
                if query_words.is_empty() {
                    return None;
                }
                let candidate_words: HashSet<&str> = candidate.split(' ').collect();
                let overlap = query_words.intersection(&candidate_words).count() as f64
                    / query_words.len() as f64;
                (overlap >= cascade.token_overlap_threshold)
                    .then_some((0.5 + 0.25 * overlap, overlap))
            }
            Stage::RelaxedSimilarity => {
                let similarity = levenshtein_similarity(query, candidate);
                (similarity >= cascade.similarity_threshold)
                    .then_some((0.65 * similarity, similarity))
            }
        }
    }
}

/// Ordered exact → containment → token overlap → relaxed similarity cascade
#[derive(Debug, Default, Clone, Copy)]
pub struct EditModeStrategy;

impl EditModeStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl MatchStrategy for EditModeStrategy {
    fn run(
        &self,
        ctx: &PassContext<'_>,
        corpus: &[PreparedCandidate<'_>],
        cancel: &CancellationToken,
    ) -> Result<Vec<MatchResult>> {
        let query = ctx.normalized.as_str();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let cascade = ctx.config.cascade;
        let min_results = ctx.config.edit_mode_min_results;
        let query_words: HashSet<&str> = query.split(' ').collect();

        let mut taken = vec![false; corpus.len()];
        let mut results = Vec::new();

        for stage in Stage::CASCADE {
            if results.len() >= min_results {
                break;
            }
            if stage == Stage::RelaxedSimilarity && !cascade.relaxed_stage {
                continue;
            }

            for (i, prepared) in corpus.iter().enumerate() {
                check_cancelled(i, cancel)?;
                if taken[i] {
                    continue;
                }

                let Some((confidence, measure)) =
                    stage.evaluate(query, &query_words, &prepared.normalized, &cascade)
                else {
                    continue;
                };
                taken[i] = true;

                let match_type = if stage == Stage::Exact {
                    MatchType::Exact
                } else {
                    MatchType::Partial
                };
                let explanation = format!(
                    "stage {} {} ({:.2})",
                    stage.number(),
                    stage.label(),
                    measure
                );

                results.push(
                    MatchResult::new(prepared.candidate, confidence, StrategyKind::EditMode)
                        .with_reasoning(format!("Nearest name: {}", stage.label()))
                        .with_details(prepared.details(
                            &ctx.tokens,
                            match_type,
                            confidence * 100.0,
                            explanation,
                        )),
                );
            }

            tracing::trace!("Edit-mode stage {} collected {}", stage.label(), results.len());
        }

        Ok(results)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::EditMode
    }
}
