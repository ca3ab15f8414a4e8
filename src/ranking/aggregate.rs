//! Cross-strategy aggregation.
//!
//! Merges per-strategy result lists into one ranked list: malformed outputs
//! are dropped whole, duplicates keep their best result, the effective
//! threshold is applied, then the list is sorted and capped.

use std::collections::HashMap;

use crate::config::ResolvedConfig;
use crate::core::{MatchResult, StrategyKind};

/// Results of one strategy run
#[derive(Debug, Clone)]
pub struct StrategyOutput {
    pub strategy: StrategyKind,
    pub results: Vec<MatchResult>,
}

impl StrategyOutput {
    pub fn new(strategy: StrategyKind, results: Vec<MatchResult>) -> Self {
        Self { strategy, results }
    }

    /// Every confidence is finite and inside [0, 1]
    pub fn is_well_formed(&self) -> bool {
        self.results.iter().all(MatchResult::is_well_formed)
    }
}

/// Ranked suggestions plus the strategies that were discarded
#[derive(Debug, Clone, Default)]
pub struct RankOutcome {
    pub suggestions: Vec<MatchResult>,
    pub dropped: Vec<StrategyKind>,
}

/// Merge, dedup, filter, sort and cap
pub fn rank(outputs: Vec<StrategyOutput>, config: &ResolvedConfig) -> Vec<MatchResult> {
    rank_with_report(outputs, config).suggestions
}

/// Same as [`rank`], also reporting which strategy outputs were dropped
pub fn rank_with_report(outputs: Vec<StrategyOutput>, config: &ResolvedConfig) -> RankOutcome {
    let mut outcome = RankOutcome::default();
    if !config.enabled {
        return outcome;
    }

    let mut best: HashMap<String, MatchResult> = HashMap::new();
    for output in outputs {
        if !output.is_well_formed() {
            tracing::warn!(
                "Dropping {} output: confidence outside [0, 1]",
                output.strategy
            );
            outcome.dropped.push(output.strategy);
            continue;
        }

        for result in output.results {
            match best.get_mut(&result.id) {
                Some(existing) => {
                    if result.ranking_cmp(existing).is_lt() {
                        *existing = result;
                    }
                }
                None => {
                    best.insert(result.id.clone(), result);
                }
            }
        }
    }

    let threshold = config.confidence_threshold;
    let mut suggestions: Vec<MatchResult> = best
        .into_values()
        .filter(|r| r.confidence >= threshold)
        .collect();
    suggestions.sort_by(|a, b| a.ranking_cmp(b));
    suggestions.truncate(config.max_suggestions);

    tracing::debug!(
        "Ranked {} suggestions (threshold {:.2}, {} dropped)",
        suggestions.len(),
        threshold,
        outcome.dropped.len()
    );

    outcome.suggestions = suggestions;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Algorithm, EngineConfig};
    use crate::core::{Candidate, MatchDetails, MatchType};

    fn result(id: &str, confidence: f64, kind: StrategyKind) -> MatchResult {
        MatchResult::new(&Candidate::new(id, format!("Материал {}", id)), confidence, kind)
            .with_details(MatchDetails::new(MatchType::Partial, confidence * 100.0, ""))
    }

    fn output(kind: StrategyKind, results: &[(&str, f64)]) -> StrategyOutput {
        StrategyOutput::new(
            kind,
            results.iter().map(|(id, c)| result(id, *c, kind)).collect(),
        )
    }

    #[test]
    fn test_dedup_keeps_best() {
        let config = EngineConfig::default().resolve();
        let outputs = vec![
            output(StrategyKind::Similarity, &[("1", 0.5), ("2", 0.9)]),
            output(StrategyKind::Keyword, &[("1", 0.8)]),
        ];

        let ranked = rank(outputs, &config);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, "2");
        assert_eq!(ranked[1].id, "1");
        assert_eq!(ranked[1].confidence, 0.8);
        assert_eq!(ranked[1].strategy, StrategyKind::Keyword);
    }

    #[test]
    fn test_threshold_and_cap() {
        let config = EngineConfig {
            confidence_threshold: 0.5,
            max_suggestions: 2,
            ..Default::default()
        }
        .resolve();
        let outputs = vec![output(
            StrategyKind::Similarity,
            &[("1", 0.4), ("2", 0.5), ("3", 0.7), ("4", 0.9)],
        )];

        let ranked = rank(outputs, &config);
        let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["4", "3"]);
    }

    #[test]
    fn test_threshold_is_inclusive_and_uses_algorithm() {
        let fuzzy = EngineConfig {
            confidence_threshold: 0.5,
            algorithm: Algorithm::Fuzzy,
            ..Default::default()
        }
        .resolve();
        let outputs = vec![output(StrategyKind::Similarity, &[("1", 0.4), ("2", 0.3)])];

        let ranked = rank(outputs, &fuzzy);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, "1");
    }

    #[test]
    fn test_malformed_output_is_dropped() {
        let config = EngineConfig::default().resolve();
        let mut bad = output(StrategyKind::Keyword, &[("1", 0.9)]);
        bad.results.push(result("2", f64::NAN, StrategyKind::Keyword));

        let outcome = rank_with_report(
            vec![bad, output(StrategyKind::Similarity, &[("3", 0.6)])],
            &config,
        );
        assert_eq!(outcome.dropped, vec![StrategyKind::Keyword]);
        assert_eq!(outcome.suggestions.len(), 1);
        assert_eq!(outcome.suggestions[0].id, "3");
    }

    #[test]
    fn test_disabled_returns_nothing() {
        let config = EngineConfig {
            enabled: false,
            ..Default::default()
        }
        .resolve();
        let outputs = vec![output(StrategyKind::Similarity, &[("1", 1.0)])];
        assert!(rank(outputs, &config).is_empty());
    }

    #[test]
    fn test_order_is_independent_of_input_order() {
        let config = EngineConfig::default().resolve();
        let a = output(StrategyKind::Similarity, &[("1", 0.7), ("2", 0.7), ("3", 0.9)]);
        let b = output(StrategyKind::Keyword, &[("2", 0.7), ("4", 0.6)]);

        let forward = rank(vec![a.clone(), b.clone()], &config);
        let backward = rank(vec![b, a], &config);
        let ids = |v: &[MatchResult]| v.iter().map(|r| r.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&forward), ids(&backward));
        assert_eq!(ids(&forward), vec!["3", "1", "2", "4"]);
    }
}
