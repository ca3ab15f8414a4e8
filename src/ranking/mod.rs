pub mod adaptive;
pub mod aggregate;
pub mod edit_mode;
pub mod keyword;
pub mod prepared;
pub mod similarity;

use tokio_util::sync::CancellationToken;

use crate::config::ResolvedConfig;
use crate::core::{MatchResult, Query, StrategyKind};
use crate::error::{MatcherError, Result};
use crate::text::{classify, normalize_query, tokenize, QueryKind, TokenSet};

pub use adaptive::AdaptiveStrategy;
pub use aggregate::{rank, rank_with_report, RankOutcome, StrategyOutput};
pub use edit_mode::EditModeStrategy;
pub use keyword::{KeywordStrategy, NoSynonyms, SynonymLookup, SynonymTable};
pub use prepared::{prepare_corpus, PreparedCandidate};
pub use similarity::SimilarityStrategy;

/// Candidate loops poll the cancellation token this often
pub const CANCEL_CHECK_INTERVAL: usize = 256;

/// Trait for matching strategies run by the engine
pub trait MatchStrategy: Send + Sync {
    /// Score the prepared corpus against the query.
    ///
    /// Implementations must be pure over their inputs and return
    /// `MatcherError::Cancelled` once `cancel` fires.
    fn run(
        &self,
        ctx: &PassContext<'_>,
        corpus: &[PreparedCandidate<'_>],
        cancel: &CancellationToken,
    ) -> Result<Vec<MatchResult>>;

    /// Strategy identity for results and telemetry
    fn kind(&self) -> StrategyKind;
}

/// Query-side state shared read-only by every strategy in a pass
#[derive(Debug)]
pub struct PassContext<'a> {
    pub query: &'a Query,
    /// Normalized query text without ignored terms
    pub normalized: String,
    pub tokens: TokenSet,
    pub kind: QueryKind,
    pub config: &'a ResolvedConfig,
}

impl<'a> PassContext<'a> {
    pub fn new(query: &'a Query, config: &'a ResolvedConfig) -> Self {
        let tokens = tokenize(&query.text, config);
        let kind = classify(&tokens);
        Self {
            query,
            normalized: normalize_query(&query.text, config),
            tokens,
            kind,
            config,
        }
    }
}

/// Poll `cancel` every [`CANCEL_CHECK_INTERVAL`] items
#[inline]
pub(crate) fn check_cancelled(index: usize, cancel: &CancellationToken) -> Result<()> {
    if index % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
        return Err(MatcherError::Cancelled);
    }
    Ok(())
}
