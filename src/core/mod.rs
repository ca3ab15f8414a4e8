pub mod candidate;
pub mod match_result;
pub mod prediction;

pub use candidate::{Candidate, Query, QueryContext};
pub use match_result::{MatchDetails, MatchResult, MatchType, StrategyKind};
pub use prediction::{FallbackReason, ModelUsed, Prediction};
