//! Caller-side prediction metrics.
//!
//! The engine keeps no state between passes. Hosts that want usage numbers
//! feed each [`Prediction`] into a [`MetricsSink`]; [`MetricsAggregator`] is
//! the in-process implementation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::core::{ModelUsed, Prediction};

/// Telemetry view of one prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionSample {
    pub success: bool,
    /// Best suggestion's confidence, 0.0 when there is none
    pub confidence: f64,
    pub processing_time_ms: f64,
    pub model_used: ModelUsed,
}

impl Prediction {
    pub fn sample(&self) -> PredictionSample {
        PredictionSample {
            success: self.is_success(),
            confidence: self.best().map(|b| b.confidence).unwrap_or(0.0),
            processing_time_ms: self.processing_time_ms,
            model_used: self.model_used,
        }
    }
}

/// Aggregated prediction statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_predictions: u64,
    pub successful_predictions: u64,
    /// Mean best-suggestion confidence over successful predictions
    pub average_confidence: f64,
    /// Mean latency over all predictions (ms)
    pub average_processing_time: f64,
    pub model_usage_stats: BTreeMap<ModelUsed, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_prediction_at: Option<DateTime<Utc>>,
}

impl Metrics {
    /// Fold one sample into the running means
    pub fn record(&mut self, sample: &PredictionSample, at: DateTime<Utc>) {
        self.total_predictions += 1;
        let n = self.total_predictions as f64;
        self.average_processing_time += (sample.processing_time_ms - self.average_processing_time) / n;

        if sample.success {
            self.successful_predictions += 1;
            let s = self.successful_predictions as f64;
            self.average_confidence += (sample.confidence - self.average_confidence) / s;
        }

        *self.model_usage_stats.entry(sample.model_used).or_insert(0) += 1;
        self.last_prediction_at = Some(at);
    }

    /// Share of predictions with at least one suggestion (0.0 - 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.total_predictions == 0 {
            0.0
        } else {
            self.successful_predictions as f64 / self.total_predictions as f64
        }
    }
}

/// Metrics observer for prediction passes
pub trait MetricsSink: Send + Sync {
    fn record(&self, sample: PredictionSample);
}

/// Thread-safe in-process [`MetricsSink`]
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    metrics: Mutex<Metrics>,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a prediction directly
    pub fn observe(&self, prediction: &Prediction) {
        MetricsSink::record(self, prediction.sample());
    }

    pub fn snapshot(&self) -> Metrics {
        self.metrics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn reset(&self) {
        let mut guard = self
            .metrics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Metrics::default();
    }
}

impl MetricsSink for MetricsAggregator {
    fn record(&self, sample: PredictionSample) {
        let mut guard = self
            .metrics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.record(&sample, Utc::now());
    }
}
