//! Request lifecycle helpers for async hosts.
//!
//! The engine itself is synchronous. A host that re-runs prediction as the
//! operator types uses [`QuerySession`] to supersede the previous pass, and
//! [`predict_with_deadline`] to run a pass off the async executor with a
//! time limit.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::core::{Candidate, Prediction, Query};
use crate::engine::MatchEngine;
use crate::error::{MatcherError, Result};

/// Hands out one live cancellation token at a time
#[derive(Debug, Default)]
pub struct QuerySession {
    current: Mutex<Option<CancellationToken>>,
}

impl QuerySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the previous pass (if any) and return a token for the next one
    pub fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = current.replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    /// Cancel the live pass without starting a new one
    pub fn cancel(&self) {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = current.take() {
            previous.cancel();
        }
    }
}

/// Run `predict` on the blocking pool, cancelling `cancel` if `deadline` elapses
pub async fn predict_with_deadline(
    engine: Arc<MatchEngine>,
    query: Query,
    candidates: Arc<Vec<Candidate>>,
    config: EngineConfig,
    cancel: CancellationToken,
    deadline: Duration,
) -> Result<Prediction> {
    let pass_token = cancel.clone();
    let handle = tokio::task::spawn_blocking(move || {
        engine.predict(&query, &candidates, &config, &pass_token)
    });

    match tokio::time::timeout(deadline, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(MatcherError::Other(format!(
            "prediction task failed: {}",
            join_error
        ))),
        Err(_) => {
            tracing::debug!("Prediction exceeded {:?}, cancelling", deadline);
            cancel.cancel();
            Err(MatcherError::Cancelled)
        }
    }
}
