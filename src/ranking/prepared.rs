//! Per-pass candidate preparation.
//!
//! Every strategy needs the normalized name and token set of each candidate,
//! so they are computed once per pass, in parallel, into a read-only slice.

use rayon::prelude::*;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

use crate::config::ResolvedConfig;
use crate::core::{Candidate, MatchDetails, MatchType};
use crate::error::{MatcherError, Result};
use crate::ranking::CANCEL_CHECK_INTERVAL;
use crate::text::{compact, normalize_text, tokenize, TokenSet};

/// Candidate with its normalized forms
#[derive(Debug, Clone)]
pub struct PreparedCandidate<'a> {
    pub candidate: &'a Candidate,
    /// Normalized name
    pub normalized: String,
    /// Tokens of the name
    pub name_tokens: TokenSet,
    /// Tokens of name, supplier and characteristics, plus compact article forms
    vocabulary: HashSet<String>,
}

impl<'a> PreparedCandidate<'a> {
    pub fn new(candidate: &'a Candidate, config: &ResolvedConfig) -> Self {
        let name_tokens = tokenize(&candidate.name, config);

        let mut vocabulary: HashSet<String> = name_tokens.all().cloned().collect();
        for extra in [&candidate.supplier, &candidate.characteristics].into_iter().flatten() {
            vocabulary.extend(tokenize(extra, config).all().cloned());
        }
        let compacted: Vec<String> = vocabulary.iter().map(|t| compact(t)).collect();
        vocabulary.extend(compacted);

        Self {
            candidate,
            normalized: normalize_text(&candidate.name),
            name_tokens,
            vocabulary,
        }
    }

    /// Whether a query token occurs anywhere in the candidate
    pub fn has_token(&self, token: &str) -> bool {
        self.vocabulary.contains(token) || self.vocabulary.contains(&compact(token))
    }

    /// Query tokens of one bucket that occur in the candidate
    pub fn matched<'q>(&self, tokens: &'q [String]) -> Vec<&'q String> {
        tokens.iter().filter(|t| self.has_token(t)).collect()
    }

    /// Details listing which query tokens the candidate contains
    pub fn details(
        &self,
        query: &TokenSet,
        match_type: MatchType,
        score: f64,
        explanation: impl Into<String>,
    ) -> MatchDetails {
        let owned = |tokens: Vec<&String>| tokens.into_iter().cloned().collect::<Vec<_>>();
        MatchDetails {
            material_tokens: owned(self.matched(&query.material)),
            size_tokens: owned(self.matched(&query.size)),
            brand_tokens: owned(self.matched(&query.brand)),
            article_tokens: owned(self.matched(&query.article)),
            ..MatchDetails::new(match_type, score, explanation)
        }
    }
}

/// Prepare the corpus in parallel batches, polling `cancel` between batches
pub fn prepare_corpus<'a>(
    candidates: &'a [Candidate],
    config: &ResolvedConfig,
    cancel: &CancellationToken,
) -> Result<Vec<PreparedCandidate<'a>>> {
    let batches: Vec<Vec<PreparedCandidate<'a>>> = candidates
        .par_chunks(CANCEL_CHECK_INTERVAL)
        .map(|batch| {
            if cancel.is_cancelled() {
                return Err(MatcherError::Cancelled);
            }
            Ok(batch
                .iter()
                .map(|candidate| PreparedCandidate::new(candidate, config))
                .collect())
        })
        .collect::<Result<_>>()?;

    Ok(batches.into_iter().flatten().collect())
}
