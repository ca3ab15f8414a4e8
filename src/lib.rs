//! # Nomenclature Matcher
//!
//! Matching/ranking engine that suggests canonical nomenclature entries and
//! supplier product names for free-text material entries:
//! - Tokenizer and query classifier (material / size / brand / article)
//! - Four independent strategies: string similarity, keyword/semantic,
//!   edit-mode cascade, adaptive hybrid
//! - Deterministic merge, dedup, threshold and cap
//! - Explicit cancellation and caller-side metrics
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use nomenclature_matcher::{Candidate, EngineConfig, MatchEngine, Query};
//! use tokio_util::sync::CancellationToken;
//!
//! fn main() -> nomenclature_matcher::Result<()> {
//!     let engine = MatchEngine::new();
//!     let candidates = vec![
//!         Candidate::new("1", "Кран шаровой резьбовой BVR-R DN32 065B8310R Ридан"),
//!         Candidate::new("2", "Кран шаровой резьбовой BVR-R DN32 Ридан"),
//!     ];
//!
//!     let prediction = engine.predict(
//!         &Query::new("Кран шаровой DN32 065B8310R Ридан"),
//!         &candidates,
//!         &EngineConfig::default(),
//!         &CancellationToken::new(),
//!     )?;
//!
//!     if let Some(best) = prediction.best() {
//!         println!("{}", best.display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod providers;
pub mod ranking;
pub mod session;
pub mod text;

// Re-export primary types
pub use config::{Algorithm, ConfigSource, EngineConfig, ResolvedConfig};
pub use core::{
    Candidate, FallbackReason, MatchDetails, MatchResult, MatchType, ModelUsed, Prediction, Query,
    QueryContext, StrategyKind,
};
pub use engine::MatchEngine;
pub use error::{MatcherError, Result};
pub use metrics::{Metrics, MetricsAggregator, MetricsSink, PredictionSample};
pub use providers::{CandidateSource, CorpusScope, InMemoryCorpus};
pub use ranking::{rank, MatchStrategy, SynonymLookup, SynonymTable};
pub use session::{predict_with_deadline, QuerySession};
pub use text::{classify, tokenize, QueryKind, TokenSet};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
