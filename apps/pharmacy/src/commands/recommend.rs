//! # Recommendation Command
//!
//! Symptoms in, up to three suggestions out.
//!
//! ```text
//! symptoms ──► validate ──► classifier.predict()
//!                                │
//!                                ├── Err  ──► warn!, empty list
//!                                │
//!                                ▼
//!                     top 3 by confidence
//!                                │
//!                   for each label: medicine name LIKE %label%
//!                                │
//!                     ├── hit  ──► suggestion with medicine detail
//!                     └── miss ──► label-only suggestion
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::context::AppContext;
use crate::error::ApiResult;
use pharma_core::validation::validate_symptoms;
use pharma_core::Medicine;

/// How many predictions are turned into suggestions.
pub const MAX_RECOMMENDATIONS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Recommendation {
    /// The classifier's label.
    pub label: String,
    /// Confidence as a percentage, 0 to 100.
    pub confidence_pct: f64,
    /// The first catalogue medicine whose name contains the label.
    pub medicine: Option<Medicine>,
}

pub async fn recommend(ctx: &AppContext, symptoms: &str) -> ApiResult<Vec<Recommendation>> {
    let symptoms = validate_symptoms(symptoms)?;

    let mut predictions = match ctx.classifier().predict(&symptoms).await {
        Ok(predictions) => predictions,
        Err(e) => {
            warn!(error = %e, "Symptom classifier unavailable, no recommendations");
            return Ok(Vec::new());
        }
    };

    predictions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    predictions.truncate(MAX_RECOMMENDATIONS);

    let medicines = ctx.db().medicines();
    let mut recommendations = Vec::with_capacity(predictions.len());
    for prediction in predictions {
        let medicine = medicines.find_by_name_fragment(&prediction.label).await?;
        debug!(
            label = %prediction.label,
            matched = medicine.is_some(),
            "Recommendation resolved"
        );

        recommendations.push(Recommendation {
            confidence_pct: (prediction.confidence * 10_000.0).round() / 100.0,
            label: prediction.label,
            medicine,
        });
    }

    Ok(recommendations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Prediction, SymptomClassifier};
    use crate::commands::test_support::{context, medicine};
    use crate::error::ErrorCode;
    use async_trait::async_trait;
    use pharma_core::CoreResult;
    use std::sync::Arc;

    struct FixedClassifier(Vec<Prediction>);

    #[async_trait]
    impl SymptomClassifier for FixedClassifier {
        async fn predict(&self, _symptoms: &str) -> CoreResult<Vec<Prediction>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_empty_symptoms_rejected() {
        let ctx = context().await;
        let err = recommend(&ctx, "   ").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_unavailable_classifier_degrades_to_empty() {
        let ctx = context().await;
        let recs = recommend(&ctx, "headache and fever").await.unwrap();
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn test_top_three_with_catalogue_lookup() {
        let ctx = context().await;
        medicine(&ctx, "Paracetamol 500mg").await;

        let ctx = ctx.with_classifier(Arc::new(FixedClassifier(vec![
            Prediction::new("Cetirizine", 0.10),
            Prediction::new("Paracetamol", 0.62),
            Prediction::new("Ibuprofen", 0.20),
            Prediction::new("Omeprazole", 0.08),
        ])));

        let recs = recommend(&ctx, "headache and fever").await.unwrap();
        let labels: Vec<_> = recs.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Paracetamol", "Ibuprofen", "Cetirizine"]);

        assert_eq!(recs[0].confidence_pct, 62.0);
        assert_eq!(
            recs[0].medicine.as_ref().map(|m| m.name.as_str()),
            Some("Paracetamol 500mg")
        );
        // Not in the catalogue: label only
        assert!(recs[1].medicine.is_none());
    }
}
