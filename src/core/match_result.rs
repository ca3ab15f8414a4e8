use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::core::Candidate;

/// Why a candidate matched.
///
/// Declaration order is precedence: EXACT > BRAND > SIZE > SEMANTIC > PARTIAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchType {
    Exact,
    Brand,
    Size,
    Semantic,
    Partial,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchType::Exact => "EXACT",
            MatchType::Brand => "BRAND",
            MatchType::Size => "SIZE",
            MatchType::Semantic => "SEMANTIC",
            MatchType::Partial => "PARTIAL",
        }
    }
}

/// Matching strategy that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Similarity,
    Keyword,
    EditMode,
    Adaptive,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Similarity => "similarity",
            StrategyKind::Keyword => "keyword",
            StrategyKind::EditMode => "edit_mode",
            StrategyKind::Adaptive => "adaptive",
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "similarity" => Ok(StrategyKind::Similarity),
            "keyword" => Ok(StrategyKind::Keyword),
            "edit_mode" => Ok(StrategyKind::EditMode),
            "adaptive" => Ok(StrategyKind::Adaptive),
            other => Err(format!("unknown strategy: {}", other)),
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trace of which query tokens and bonuses contributed to a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    /// Query material words found in the candidate
    pub material_tokens: Vec<String>,
    /// Query size tokens found in the candidate
    pub size_tokens: Vec<String>,
    /// Query brand tokens found in the candidate
    pub brand_tokens: Vec<String>,
    /// Query article tokens found in the candidate
    pub article_tokens: Vec<String>,
    /// Dominant reason
    pub match_type: MatchType,
    /// Raw strategy score in points (0 - 100 scale, before clamping)
    pub score: f64,
    /// Human-readable explanation for tooltips and debugging
    pub explanation: String,
}

impl MatchDetails {
    pub fn new(match_type: MatchType, score: f64, explanation: impl Into<String>) -> Self {
        Self {
            material_tokens: Vec::new(),
            size_tokens: Vec::new(),
            brand_tokens: Vec::new(),
            article_tokens: Vec::new(),
            match_type,
            score,
            explanation: explanation.into(),
        }
    }
}

/// One ranked suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub id: String,
    pub name: String,
    /// Match strength (0.0 - 1.0)
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_details: Option<MatchDetails>,
    /// Strategy that produced this result
    pub strategy: StrategyKind,
}

impl MatchResult {
    pub fn new(candidate: &Candidate, confidence: f64, strategy: StrategyKind) -> Self {
        Self {
            id: candidate.id.clone(),
            name: candidate.name.clone(),
            confidence,
            reasoning: None,
            match_details: None,
            strategy,
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn with_details(mut self, details: MatchDetails) -> Self {
        self.match_details = Some(details);
        self
    }

    /// Dominant reason; results without details count as PARTIAL
    pub fn match_type(&self) -> MatchType {
        self.match_details
            .as_ref()
            .map(|d| d.match_type)
            .unwrap_or(MatchType::Partial)
    }

    /// Confidence is finite and inside [0, 1]
    pub fn is_well_formed(&self) -> bool {
        self.confidence.is_finite() && (0.0..=1.0).contains(&self.confidence)
    }

    /// Total ranking order: confidence desc, match type precedence, name asc, id asc
    pub fn ranking_cmp(&self, other: &Self) -> Ordering {
        other
            .confidence
            .total_cmp(&self.confidence)
            .then_with(|| self.match_type().cmp(&other.match_type()))
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.id.cmp(&other.id))
    }

    /// Get display string for logging
    pub fn display(&self) -> String {
        format!(
            "{} - {:.1}% [{}] {}",
            self.name,
            self.confidence * 100.0,
            self.strategy,
            self.match_type().as_str()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, name: &str, confidence: f64, match_type: MatchType) -> MatchResult {
        MatchResult::new(&Candidate::new(id, name), confidence, StrategyKind::Similarity)
            .with_details(MatchDetails::new(match_type, confidence * 100.0, ""))
    }

    #[test]
    fn test_match_type_precedence() {
        assert!(MatchType::Exact < MatchType::Brand);
        assert!(MatchType::Brand < MatchType::Size);
        assert!(MatchType::Size < MatchType::Semantic);
        assert!(MatchType::Semantic < MatchType::Partial);
    }

    #[test]
    fn test_ranking_order() {
        let a = result("1", "Б", 0.8, MatchType::Partial);
        let b = result("2", "А", 0.8, MatchType::Partial);
        let c = result("3", "В", 0.8, MatchType::Exact);
        let d = result("4", "Г", 0.9, MatchType::Partial);

        let mut all = vec![a, b, c, d];
        all.sort_by(|x, y| x.ranking_cmp(y));
        let ids: Vec<_> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["4", "3", "2", "1"]);
    }

    #[test]
    fn test_well_formed() {
        assert!(result("1", "a", 1.0, MatchType::Exact).is_well_formed());
        assert!(!result("1", "a", 1.2, MatchType::Exact).is_well_formed());
        assert!(!result("1", "a", f64::NAN, MatchType::Exact).is_well_formed());
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let json = serde_json::to_string(&result("1", "a", 0.5, MatchType::Brand)).unwrap();
        assert!(json.contains("\"matchDetails\""));
        assert!(json.contains("\"matchType\":\"BRAND\""));
        assert!(json.contains("\"strategy\":\"similarity\""));
    }
}
