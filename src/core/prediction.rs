use serde::{Deserialize, Serialize};

use crate::core::{MatchResult, StrategyKind};

/// Backend that produced a prediction (for caller telemetry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelUsed {
    /// This engine's string/keyword strategies
    Similarity,
    /// Reserved for embedding-based backends in the calling shell
    Embedding,
    /// Reserved for LLM-based backends in the calling shell
    Llm,
    /// Nothing was matched; see `fallback_reason`
    Fallback,
}

impl ModelUsed {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelUsed::Similarity => "similarity",
            ModelUsed::Embedding => "embedding",
            ModelUsed::Llm => "llm",
            ModelUsed::Fallback => "fallback",
        }
    }
}

/// Why a prediction is empty or degraded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum FallbackReason {
    /// Blank query text
    EmptyQuery,
    /// Nothing left after tokenization
    QueryTooShort,
    /// Empty corpus
    NoCandidates,
    /// `enabled == false`
    Disabled,
    /// Strategies ran but nothing cleared the threshold
    NoMatches,
    /// These strategies returned malformed output or failed and were dropped
    StrategiesDropped(Vec<StrategyKind>),
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::EmptyQuery => f.write_str("empty_query"),
            FallbackReason::QueryTooShort => f.write_str("query_too_short"),
            FallbackReason::NoCandidates => f.write_str("no_candidates"),
            FallbackReason::Disabled => f.write_str("disabled"),
            FallbackReason::NoMatches => f.write_str("no_matches"),
            FallbackReason::StrategiesDropped(kinds) => {
                let names: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
                write!(f, "strategies_dropped:{}", names.join(","))
            }
        }
    }
}

impl From<FallbackReason> for String {
    fn from(reason: FallbackReason) -> Self {
        reason.to_string()
    }
}

impl TryFrom<String> for FallbackReason {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "empty_query" => Ok(FallbackReason::EmptyQuery),
            "query_too_short" => Ok(FallbackReason::QueryTooShort),
            "no_candidates" => Ok(FallbackReason::NoCandidates),
            "disabled" => Ok(FallbackReason::Disabled),
            "no_matches" => Ok(FallbackReason::NoMatches),
            other => match other.strip_prefix("strategies_dropped:") {
                Some(list) => list
                    .split(',')
                    .filter(|name| !name.is_empty())
                    .map(str::parse)
                    .collect::<Result<Vec<StrategyKind>, String>>()
                    .map(FallbackReason::StrategiesDropped),
                None => Err(format!("unknown fallback reason: {}", other)),
            },
        }
    }
}

/// Output of one `predict` pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// Ranked suggestions, best first
    pub suggestions: Vec<MatchResult>,

    /// Pass latency in milliseconds
    pub processing_time_ms: f64,

    /// Backend that produced the suggestions
    pub model_used: ModelUsed,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
}

impl Prediction {
    /// Empty result with a reason and no suggestions
    pub fn fallback(reason: FallbackReason, processing_time_ms: f64) -> Self {
        Self {
            suggestions: Vec::new(),
            processing_time_ms,
            model_used: ModelUsed::Fallback,
            fallback_reason: Some(reason),
        }
    }

    /// Best suggestion, if any
    pub fn best(&self) -> Option<&MatchResult> {
        self.suggestions.first()
    }

    pub fn is_success(&self) -> bool {
        !self.suggestions.is_empty()
    }

    /// Get display string for logging
    pub fn display(&self) -> String {
        match self.best() {
            Some(best) => format!(
                "{} (+{} more) {:.2}ms [{}]",
                best.display(),
                self.suggestions.len() - 1,
                self.processing_time_ms,
                self.model_used.as_str()
            ),
            None => format!(
                "no suggestions {:.2}ms [{}] {}",
                self.processing_time_ms,
                self.model_used.as_str(),
                self.fallback_reason
                    .as_ref()
                    .map(|r| r.to_string())
                    .unwrap_or_default()
            ),
        }
    }
}
