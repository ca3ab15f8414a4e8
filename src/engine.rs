use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::{EngineConfig, ResolvedConfig};
use crate::core::{Candidate, FallbackReason, MatchResult, ModelUsed, Prediction, Query, StrategyKind};
use crate::error::{MatcherError, Result};
use crate::ranking::{
    prepare_corpus, rank, rank_with_report, AdaptiveStrategy, EditModeStrategy, KeywordStrategy,
    MatchStrategy, NoSynonyms, PassContext, SimilarityStrategy, StrategyOutput, SynonymLookup,
};

/// Main matching engine orchestrator.
///
/// Stateless between calls: every pass takes its config by value and
/// builds its own prepared corpus.
pub struct MatchEngine {
    strategies: Vec<Arc<dyn MatchStrategy>>,
    synonyms: Arc<dyn SynonymLookup>,
}

impl MatchEngine {
    /// Engine with the four built-in strategies and no synonym table
    pub fn new() -> Self {
        Self::with_synonyms(Arc::new(NoSynonyms))
    }

    /// Engine with the four built-in strategies sharing a synonym table
    pub fn with_synonyms(synonyms: Arc<dyn SynonymLookup>) -> Self {
        let strategies: Vec<Arc<dyn MatchStrategy>> = vec![
            Arc::new(SimilarityStrategy::new()),
            Arc::new(KeywordStrategy::new(synonyms.clone())),
            Arc::new(EditModeStrategy::new()),
            Arc::new(AdaptiveStrategy::new(synonyms.clone())),
        ];
        Self {
            strategies,
            synonyms,
        }
    }

    /// Engine running only the given strategies
    pub fn with_strategies(strategies: Vec<Arc<dyn MatchStrategy>>) -> Self {
        Self {
            strategies,
            synonyms: Arc::new(NoSynonyms),
        }
    }

    /// Add a strategy to the pass
    pub fn add_strategy(&mut self, strategy: Arc<dyn MatchStrategy>) {
        self.strategies.push(strategy);
    }

    pub fn strategies(&self) -> impl Iterator<Item = StrategyKind> + '_ {
        self.strategies.iter().map(|s| s.kind())
    }

    /// Run every strategy and return the merged, ranked suggestions.
    ///
    /// Degenerate inputs (disabled config, blank or too-short query, empty
    /// corpus) yield an empty `fallback` prediction rather than an error.
    /// The only error a caller should expect is [`MatcherError::Cancelled`].
    pub fn predict(
        &self,
        query: &Query,
        candidates: &[Candidate],
        config: &EngineConfig,
        cancel: &CancellationToken,
    ) -> Result<Prediction> {
        let start = Instant::now();
        let elapsed_ms = || start.elapsed().as_secs_f64() * 1000.0;
        let config = config.resolve();

        if !config.enabled {
            return Ok(Prediction::fallback(FallbackReason::Disabled, elapsed_ms()));
        }
        if query.text.trim().is_empty() {
            return Ok(Prediction::fallback(FallbackReason::EmptyQuery, elapsed_ms()));
        }

        let ctx = PassContext::new(query, &config);
        if ctx.tokens.is_empty() {
            tracing::debug!("Query '{}' has no tokens after filtering", query.text);
            return Ok(Prediction::fallback(FallbackReason::QueryTooShort, elapsed_ms()));
        }
        if candidates.is_empty() {
            return Ok(Prediction::fallback(FallbackReason::NoCandidates, elapsed_ms()));
        }

        let corpus = prepare_corpus(candidates, &config, cancel)?;

        let runs: Vec<(StrategyKind, Result<Vec<MatchResult>>)> = self
            .strategies
            .par_iter()
            .map(|strategy| (strategy.kind(), strategy.run(&ctx, &corpus, cancel)))
            .collect();

        let mut outputs = Vec::with_capacity(runs.len());
        let mut failed = Vec::new();
        for (kind, run) in runs {
            match run {
                Ok(results) => {
                    tracing::debug!("Strategy {} returned {} results", kind, results.len());
                    outputs.push(StrategyOutput::new(kind, results));
                }
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    tracing::warn!("Strategy {} failed: {}", kind, e);
                    failed.push(kind);
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(MatcherError::Cancelled);
        }

        let outcome = rank_with_report(outputs, &config);

        let mut dropped: Vec<StrategyKind> = Vec::new();
        for kind in failed.into_iter().chain(outcome.dropped) {
            if !dropped.contains(&kind) {
                dropped.push(kind);
            }
        }

        let suggestions = outcome.suggestions;
        let (model_used, fallback_reason) = match (suggestions.is_empty(), dropped.is_empty()) {
            (false, true) => (ModelUsed::Similarity, None),
            (false, false) => (
                ModelUsed::Similarity,
                Some(FallbackReason::StrategiesDropped(dropped)),
            ),
            (true, true) => (ModelUsed::Fallback, Some(FallbackReason::NoMatches)),
            (true, false) => (
                ModelUsed::Fallback,
                Some(FallbackReason::StrategiesDropped(dropped)),
            ),
        };

        let prediction = Prediction {
            suggestions,
            processing_time_ms: elapsed_ms(),
            model_used,
            fallback_reason,
        };
        tracing::debug!(
            "Predicted '{}' ({}, {} candidates): {}",
            query.text,
            ctx.kind,
            candidates.len(),
            prediction.display()
        );

        Ok(prediction)
    }

    /// Adaptive hybrid strategy alone, ranked and capped
    pub fn adaptive_match(
        &self,
        query: &Query,
        candidates: &[Candidate],
        config: &EngineConfig,
    ) -> Result<Vec<MatchResult>> {
        let strategy = AdaptiveStrategy::new(self.synonyms.clone());
        run_single(&strategy, query, candidates, &config.resolve())
    }

    /// Edit-mode cascade alone, ranked and capped (supplier-name column fill)
    pub fn match_editing_mode(
        &self,
        query: &Query,
        candidates: &[Candidate],
        config: &EngineConfig,
    ) -> Result<Vec<MatchResult>> {
        run_single(&EditModeStrategy::new(), query, candidates, &config.resolve())
    }

    /// Keyword matcher alone, ranked and capped
    pub fn match_by_keywords(
        &self,
        query: &Query,
        candidates: &[Candidate],
        config: &EngineConfig,
    ) -> Result<Vec<MatchResult>> {
        let strategy = KeywordStrategy::new(self.synonyms.clone());
        run_single(&strategy, query, candidates, &config.resolve())
    }

    /// Each configured strategy's own ranked output, in engine order
    pub fn compare_strategies(
        &self,
        query: &Query,
        candidates: &[Candidate],
        config: &EngineConfig,
        cancel: &CancellationToken,
    ) -> Result<Vec<StrategyOutput>> {
        let config = config.resolve();
        let ctx = PassContext::new(query, &config);
        if !config.enabled || ctx.tokens.is_empty() || candidates.is_empty() {
            return Ok(self
                .strategies
                .iter()
                .map(|s| StrategyOutput::new(s.kind(), Vec::new()))
                .collect());
        }

        let corpus = prepare_corpus(candidates, &config, cancel)?;
        self.strategies
            .par_iter()
            .map(|strategy| {
                let results = strategy.run(&ctx, &corpus, cancel)?;
                let ranked = rank(vec![StrategyOutput::new(strategy.kind(), results)], &config);
                Ok(StrategyOutput::new(strategy.kind(), ranked))
            })
            .collect()
    }
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// One strategy over a fresh corpus, without cancellation
fn run_single(
    strategy: &dyn MatchStrategy,
    query: &Query,
    candidates: &[Candidate],
    config: &ResolvedConfig,
) -> Result<Vec<MatchResult>> {
    let ctx = PassContext::new(query, config);
    if !config.enabled || ctx.tokens.is_empty() || candidates.is_empty() {
        return Ok(Vec::new());
    }

    let cancel = CancellationToken::new();
    let corpus = prepare_corpus(candidates, config, &cancel)?;
    let results = strategy.run(&ctx, &corpus, &cancel)?;
    Ok(rank(vec![StrategyOutput::new(strategy.kind(), results)], config))
}
