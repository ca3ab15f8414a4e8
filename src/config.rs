//! Tunable matching policy.
//!
//! [`EngineConfig`] is the externally owned policy object. It is passed by
//! value into every pass and never mutated. Before a pass runs it is
//! [`resolve`](EngineConfig::resolve)d into a [`ResolvedConfig`]: out-of-range
//! values are clamped to the nearest valid value and the [`Algorithm`] profile
//! is applied to the threshold and to the edit-mode cascade.
//!
//! ```
//! use nomenclature_matcher::config::{Algorithm, EngineConfig};
//!
//! let mut config = EngineConfig::default();
//! config.confidence_threshold = 1.7; // clamped, never an error
//! config.algorithm = Algorithm::Strict;
//!
//! let resolved = config.resolve();
//! assert_eq!(resolved.confidence_threshold, 1.0);
//! assert!(!resolved.cascade.relaxed_stage);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::text::normalize::fold_case;

/// Threshold shift applied by the `strict` and `fuzzy` profiles
const ALGORITHM_THRESHOLD_SHIFT: f64 = 0.15;

/// Edit-mode token-overlap threshold (stage 3)
const STRICT_TOKEN_OVERLAP: f64 = 0.75;
const FUZZY_TOKEN_OVERLAP: f64 = 0.6;

/// Edit-mode relaxed similarity threshold (stage 4)
const RELAXED_SIMILARITY: f64 = 0.55;
const FUZZY_RELAXED_SIMILARITY: f64 = 0.45;

/// Matching strictness profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Higher threshold, no relaxed similarity stage
    Strict,
    /// Configured values unmodified
    #[default]
    Balanced,
    /// Lower threshold, relaxed cascade thresholds
    Fuzzy,
}

impl Algorithm {
    /// Apply the profile to a (clamped) confidence threshold
    pub fn effective_threshold(self, threshold: f64) -> f64 {
        match self {
            Algorithm::Strict => (threshold + ALGORITHM_THRESHOLD_SHIFT).min(1.0),
            Algorithm::Balanced => threshold,
            Algorithm::Fuzzy => (threshold - ALGORITHM_THRESHOLD_SHIFT).max(0.0),
        }
    }

    /// Edit-mode cascade settings for this profile
    pub fn cascade(self) -> CascadeProfile {
        match self {
            Algorithm::Strict => CascadeProfile {
                relaxed_stage: false,
                token_overlap_threshold: STRICT_TOKEN_OVERLAP,
                similarity_threshold: RELAXED_SIMILARITY,
            },
            Algorithm::Balanced => CascadeProfile {
                relaxed_stage: true,
                token_overlap_threshold: STRICT_TOKEN_OVERLAP,
                similarity_threshold: RELAXED_SIMILARITY,
            },
            Algorithm::Fuzzy => CascadeProfile {
                relaxed_stage: true,
                token_overlap_threshold: FUZZY_TOKEN_OVERLAP,
                similarity_threshold: FUZZY_RELAXED_SIMILARITY,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Strict => "strict",
            Algorithm::Balanced => "balanced",
            Algorithm::Fuzzy => "fuzzy",
        }
    }
}

impl std::str::FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Algorithm::Strict),
            "balanced" => Ok(Algorithm::Balanced),
            "fuzzy" => Ok(Algorithm::Fuzzy),
            other => Err(format!("unknown algorithm: {}", other)),
        }
    }
}

/// Edit-mode cascade thresholds derived from [`Algorithm`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeProfile {
    /// Whether stage 4 (relaxed similarity) runs
    pub relaxed_stage: bool,
    /// Minimum query-token coverage for stage 3
    pub token_overlap_threshold: f64,
    /// Minimum Levenshtein similarity for stage 4
    pub similarity_threshold: f64,
}

/// Matching policy as supplied by the host application.
///
/// Integer fields are signed so that a bad value coming from JSON is clamped
/// instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Master switch; `false` short-circuits every pass
    pub enabled: bool,

    /// Minimum confidence of a returned suggestion (0.0 - 1.0)
    pub confidence_threshold: f64,

    /// Maximum number of suggestions (> 0)
    pub max_suggestions: i64,

    /// Strictness profile
    pub algorithm: Algorithm,

    /// Added per exact keyword hit
    pub keyword_bonus: f64,

    /// Added when the whole normalized query is a substring of the candidate
    pub exact_match_bonus: f64,

    /// Added when the candidate starts with the query
    pub prefix_bonus: f64,

    /// Share of Levenshtein similarity in blended scores (0.0 - 1.0)
    pub similarity_weight: f64,

    /// Share of keyword overlap in the keyword matcher score (0.0 - 1.0)
    pub keyword_weight: f64,

    /// Minimum length of a material token
    pub min_word_length: i64,

    /// Terms dropped by the tokenizer (case-insensitive)
    pub ignored_terms: Vec<String>,

    /// Brand names recognized by the tokenizer (case-insensitive)
    pub known_brands: Vec<String>,

    /// Adaptive strategy: points for a matching article token
    pub article_bonus: f64,

    /// Adaptive strategy: points for a matching size token
    pub size_bonus: f64,

    /// Adaptive strategy: points for a matching brand token
    pub brand_bonus: f64,

    /// Edit-mode cascade stops once this many results exist
    pub edit_mode_min_results: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            confidence_threshold: 0.3,
            max_suggestions: 10,
            algorithm: Algorithm::Balanced,
            keyword_bonus: 0.05,
            exact_match_bonus: 0.2,
            prefix_bonus: 0.1,
            similarity_weight: 0.6,
            keyword_weight: 0.6,
            min_word_length: 2,
            ignored_terms: Vec::new(),
            known_brands: [
                "ридан", "danfoss", "технониколь", "knauf", "кнауф", "rockwool",
                "grundfos", "rehau", "valtec", "ursa", "isover", "oventrop",
            ]
            .iter()
            .map(|b| b.to_string())
            .collect(),
            article_bonus: 20.0,
            size_bonus: 10.0,
            brand_bonus: 8.0,
            edit_mode_min_results: 60,
        }
    }
}

impl EngineConfig {
    /// Parse a config from host-application JSON; missing keys take defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Build a config from flat numeric overrides, falling back to defaults
    /// per key. Keys use the camelCase JSON names.
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use nomenclature_matcher::config::EngineConfig;
    ///
    /// let mut overrides = HashMap::new();
    /// overrides.insert("confidenceThreshold".to_string(), 0.5);
    /// overrides.insert("maxSuggestions".to_string(), 3.0);
    ///
    /// let config = EngineConfig::from_overrides(&overrides);
    /// assert_eq!(config.confidence_threshold, 0.5);
    /// assert_eq!(config.max_suggestions, 3);
    /// assert_eq!(config.prefix_bonus, 0.1); // default
    /// ```
    pub fn from_overrides(overrides: &HashMap<String, f64>) -> Self {
        let defaults = Self::default();
        let get = |key: &str, default: f64| overrides.get(key).copied().unwrap_or(default);

        Self {
            enabled: get("enabled", 1.0) != 0.0,
            confidence_threshold: get("confidenceThreshold", defaults.confidence_threshold),
            max_suggestions: get("maxSuggestions", defaults.max_suggestions as f64) as i64,
            keyword_bonus: get("keywordBonus", defaults.keyword_bonus),
            exact_match_bonus: get("exactMatchBonus", defaults.exact_match_bonus),
            prefix_bonus: get("prefixBonus", defaults.prefix_bonus),
            similarity_weight: get("similarityWeight", defaults.similarity_weight),
            keyword_weight: get("keywordWeight", defaults.keyword_weight),
            min_word_length: get("minWordLength", defaults.min_word_length as f64) as i64,
            article_bonus: get("articleBonus", defaults.article_bonus),
            size_bonus: get("sizeBonus", defaults.size_bonus),
            brand_bonus: get("brandBonus", defaults.brand_bonus),
            edit_mode_min_results: get("editModeMinResults", defaults.edit_mode_min_results as f64)
                as i64,
            ..defaults
        }
    }

    /// Clamp every value into its valid range and apply the algorithm profile
    pub fn resolve(&self) -> ResolvedConfig {
        let defaults = Self::default();
        let threshold = unit_or(self.confidence_threshold, defaults.confidence_threshold);

        let resolved = ResolvedConfig {
            enabled: self.enabled,
            algorithm: self.algorithm,
            confidence_threshold: self.algorithm.effective_threshold(threshold),
            max_suggestions: self.max_suggestions.max(1) as usize,
            keyword_bonus: non_negative_or(self.keyword_bonus, defaults.keyword_bonus),
            exact_match_bonus: non_negative_or(self.exact_match_bonus, defaults.exact_match_bonus),
            prefix_bonus: non_negative_or(self.prefix_bonus, defaults.prefix_bonus),
            similarity_weight: unit_or(self.similarity_weight, defaults.similarity_weight),
            keyword_weight: unit_or(self.keyword_weight, defaults.keyword_weight),
            min_word_length: self.min_word_length.max(0) as usize,
            article_bonus: non_negative_or(self.article_bonus, defaults.article_bonus),
            size_bonus: non_negative_or(self.size_bonus, defaults.size_bonus),
            brand_bonus: non_negative_or(self.brand_bonus, defaults.brand_bonus),
            edit_mode_min_results: self.edit_mode_min_results.max(1) as usize,
            cascade: self.algorithm.cascade(),
            ignored_terms: fold_terms(&self.ignored_terms),
            known_brands: fold_terms(&self.known_brands),
        };

        if threshold != self.confidence_threshold
            || self.max_suggestions < 1
            || resolved.similarity_weight != self.similarity_weight
            || resolved.keyword_weight != self.keyword_weight
            || self.min_word_length < 0
        {
            tracing::debug!(
                "Clamped engine config: threshold={} max_suggestions={} similarity_weight={}",
                resolved.confidence_threshold,
                resolved.max_suggestions,
                resolved.similarity_weight
            );
        }

        resolved
    }
}

impl std::fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "enabled={}, algorithm={}, threshold={}, max={}, similarity_weight={}",
            self.enabled,
            self.algorithm.as_str(),
            self.confidence_threshold,
            self.max_suggestions,
            self.similarity_weight
        )
    }
}

fn unit_or(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        default
    }
}

fn non_negative_or(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        default
    }
}

fn fold_terms(terms: &[String]) -> HashSet<String> {
    terms
        .iter()
        .map(|t| fold_case(t.trim()))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Clamped policy consumed by the tokenizer, strategies and ranker
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub enabled: bool,
    pub algorithm: Algorithm,
    /// Threshold after the algorithm profile was applied
    pub confidence_threshold: f64,
    pub max_suggestions: usize,
    pub keyword_bonus: f64,
    pub exact_match_bonus: f64,
    pub prefix_bonus: f64,
    pub similarity_weight: f64,
    pub keyword_weight: f64,
    pub min_word_length: usize,
    pub article_bonus: f64,
    pub size_bonus: f64,
    pub brand_bonus: f64,
    pub edit_mode_min_results: usize,
    pub cascade: CascadeProfile,
    ignored_terms: HashSet<String>,
    known_brands: HashSet<String>,
}

impl ResolvedConfig {
    /// `term` must already be case-folded
    pub fn is_ignored(&self, term: &str) -> bool {
        self.ignored_terms.contains(term)
    }

    /// `term` must already be case-folded
    pub fn is_known_brand(&self, term: &str) -> bool {
        self.known_brands.contains(term)
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        EngineConfig::default().resolve()
    }
}

/// Getter for the current policy (host settings store, static value, ...)
pub trait ConfigSource: Send + Sync {
    fn current(&self) -> EngineConfig;
}

impl ConfigSource for EngineConfig {
    fn current(&self) -> EngineConfig {
        self.clone()
    }
}

impl<F> ConfigSource for F
where
    F: Fn() -> EngineConfig + Send + Sync,
{
    fn current(&self) -> EngineConfig {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = EngineConfig::default();
        assert!(config.enabled);
        assert_eq!(config.algorithm, Algorithm::Balanced);
        assert_eq!(config.article_bonus, 20.0);
        assert_eq!(config.size_bonus, 10.0);
        assert_eq!(config.brand_bonus, 8.0);
        assert_eq!(config.edit_mode_min_results, 60);
    }

    #[test]
    fn test_resolve_clamps_bad_values() {
        let config = EngineConfig {
            confidence_threshold: -0.4,
            max_suggestions: -3,
            similarity_weight: 2.5,
            min_word_length: -1,
            keyword_bonus: f64::NAN,
            prefix_bonus: -1.0,
            ..Default::default()
        };

        let resolved = config.resolve();
        assert_eq!(resolved.confidence_threshold, 0.0);
        assert_eq!(resolved.max_suggestions, 1);
        assert_eq!(resolved.similarity_weight, 1.0);
        assert_eq!(resolved.min_word_length, 0);
        assert_eq!(resolved.keyword_bonus, 0.05);
        assert_eq!(resolved.prefix_bonus, 0.0);
    }

    #[test]
    fn test_nan_threshold_falls_back_to_default() {
        let config = EngineConfig {
            confidence_threshold: f64::NAN,
            ..Default::default()
        };
        assert_eq!(config.resolve().confidence_threshold, 0.3);
    }

    #[test]
    fn test_algorithm_profiles() {
        let base = EngineConfig {
            confidence_threshold: 0.5,
            ..Default::default()
        };

        let strict = EngineConfig { algorithm: Algorithm::Strict, ..base.clone() }.resolve();
        let balanced = base.resolve();
        let fuzzy = EngineConfig { algorithm: Algorithm::Fuzzy, ..base.clone() }.resolve();

        assert!(strict.confidence_threshold > balanced.confidence_threshold);
        assert!(fuzzy.confidence_threshold < balanced.confidence_threshold);
        assert_eq!(balanced.confidence_threshold, 0.5);
        assert!(!strict.cascade.relaxed_stage);
        assert!(balanced.cascade.relaxed_stage);
        assert!(fuzzy.cascade.similarity_threshold < balanced.cascade.similarity_threshold);
    }

    #[test]
    fn test_strict_threshold_never_exceeds_one() {
        assert_eq!(Algorithm::Strict.effective_threshold(0.95), 1.0);
        assert_eq!(Algorithm::Fuzzy.effective_threshold(0.05), 0.0);
    }

    #[test]
    fn test_from_json_camel_case_and_defaults() {
        let json = r#"{"confidenceThreshold": 0.6, "algorithm": "fuzzy", "ignoredTerms": ["М3", "кг"]}"#;
        let config = EngineConfig::from_json(json).unwrap();
        assert_eq!(config.confidence_threshold, 0.6);
        assert_eq!(config.algorithm, Algorithm::Fuzzy);
        assert_eq!(config.max_suggestions, 10);

        let resolved = config.resolve();
        assert!(resolved.is_ignored("м3"));
        assert!(resolved.is_ignored("кг"));
    }

    #[test]
    fn test_negative_max_suggestions_from_json() {
        let config = EngineConfig::from_json(r#"{"maxSuggestions": -5}"#).unwrap();
        assert_eq!(config.resolve().max_suggestions, 1);
    }

    #[test]
    fn test_known_brands_case_insensitive() {
        let resolved = EngineConfig::default().resolve();
        assert!(resolved.is_known_brand("ридан"));
        assert!(resolved.is_known_brand("danfoss"));
    }

    #[test]
    fn test_config_source_closure() {
        let source = || EngineConfig {
            max_suggestions: 3,
            ..Default::default()
        };
        assert_eq!(source.current().max_suggestions, 3);
    }

    #[test]
    fn test_from_overrides() {
        let mut overrides = HashMap::new();
        overrides.insert("enabled".to_string(), 0.0);
        overrides.insert("articleBonus".to_string(), 30.0);

        let config = EngineConfig::from_overrides(&overrides);
        assert!(!config.enabled);
        assert_eq!(config.article_bonus, 30.0);
        assert_eq!(config.brand_bonus, 8.0);
        assert_eq!(config.known_brands, EngineConfig::default().known_brands);
    }

    #[test]
    fn test_to_json_uses_host_names() {
        let json = EngineConfig::default().to_json().unwrap();
        assert!(json.contains("\"confidenceThreshold\":0.3"));
        assert!(json.contains("\"algorithm\":\"balanced\""));
        assert_eq!(EngineConfig::from_json(&json).unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("STRICT".parse::<Algorithm>().unwrap(), Algorithm::Strict);
        assert!("loose".parse::<Algorithm>().is_err());
    }
}
