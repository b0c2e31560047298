//! # Symptom Classifier
//!
//! The recommender treats the symptom model as an opaque collaborator: free
//! text in, ranked `(label, confidence)` pairs out. Loading and running the
//! model lives outside this crate.
//!
//! Until a model is plugged in, [`UnavailableClassifier`] answers every call
//! with `ClassifierUnavailable` and recommendations come back empty.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use pharma_core::{CoreError, CoreResult};

/// One ranked label from the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Prediction {
    pub label: String,
    /// Between 0.0 and 1.0.
    pub confidence: f64,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Prediction {
            label: label.into(),
            confidence,
        }
    }
}

#[async_trait]
pub trait SymptomClassifier: Send + Sync {
    /// Ranks labels for `symptoms`. Order of the result is not significant.
    async fn predict(&self, symptoms: &str) -> CoreResult<Vec<Prediction>>;
}

/// Stand-in used when no model is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableClassifier;

#[async_trait]
impl SymptomClassifier for UnavailableClassifier {
    async fn predict(&self, _symptoms: &str) -> CoreResult<Vec<Prediction>> {
        Err(CoreError::ClassifierUnavailable(
            "no symptom model is configured".to_string(),
        ))
    }
}
