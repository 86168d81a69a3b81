//! # Forecast Service
//!
//! Wraps an opaque [`ForecastOracle`] so the till only ever sees a
//! [`ForecastOutcome`]. A missing oracle or an error becomes `Unavailable`;
//! an empty answer stays `Empty`. Lines with a negative or non-finite
//! recommendation are dropped one by one, the rest of the answer is kept.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use gastro_core::forecast::{ForecastOutcome, ForecastRequest, Prediction};

use crate::error::{SyncError, SyncResult};

/// Anything that can turn stock levels and recent sales into predictions.
#[async_trait]
pub trait ForecastOracle: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn predict(&self, request: &ForecastRequest) -> SyncResult<Vec<Prediction>>;
}

#[derive(Clone, Default)]
pub struct ForecastService {
    oracle: Option<Arc<dyn ForecastOracle>>,
}

impl ForecastService {
    pub fn new(oracle: Arc<dyn ForecastOracle>) -> Self {
        ForecastService {
            oracle: Some(oracle),
        }
    }

    /// A service with no oracle; every forecast is `Unavailable`.
    pub fn disabled() -> Self {
        ForecastService { oracle: None }
    }

    pub fn is_configured(&self) -> bool {
        self.oracle.is_some()
    }

    pub async fn forecast(&self, request: &ForecastRequest) -> ForecastOutcome {
        let Some(oracle) = &self.oracle else {
            return ForecastOutcome::unavailable(SyncError::OracleNotConfigured.to_string());
        };

        match oracle.predict(request).await {
            Ok(predictions) => {
                let received = predictions.len();
                let kept: Vec<Prediction> = predictions
                    .into_iter()
                    .filter(|p| {
                        let plausible = is_plausible(p);
                        if !plausible {
                            warn!(
                                oracle = oracle.name(),
                                ingredient_id = %p.ingredient_id,
                                quantity = p.recommended_quantity,
                                "Dropping prediction with an implausible recommendation"
                            );
                        }
                        plausible
                    })
                    .collect();
                info!(
                    oracle = oracle.name(),
                    received,
                    kept = kept.len(),
                    "Forecast received"
                );
                ForecastOutcome::from_predictions(kept)
            }
            Err(e) => {
                warn!(oracle = oracle.name(), error = %e, "Forecast unavailable");
                ForecastOutcome::unavailable(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for ForecastService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastService")
            .field("oracle", &self.oracle.as_ref().map(|o| o.name().to_string()))
            .finish()
    }
}

fn is_plausible(prediction: &Prediction) -> bool {
    prediction.recommended_quantity.is_finite() && prediction.recommended_quantity >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use gastro_core::forecast::Urgency;

    struct FixedOracle(SyncResult<Vec<Prediction>>);

    #[async_trait]
    impl ForecastOracle for FixedOracle {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn predict(&self, _request: &ForecastRequest) -> SyncResult<Vec<Prediction>> {
            match &self.0 {
                Ok(p) => Ok(p.clone()),
                Err(e) => Err(SyncError::OracleFailed(e.to_string())),
            }
        }
    }

    fn request() -> ForecastRequest {
        ForecastRequest::new(&[], &[], &[], 50)
    }

    fn prediction(quantity: f64) -> Prediction {
        Prediction {
            ingredient_id: "ing_leche".into(),
            name: "Leche".into(),
            estimated_depletion_date: NaiveDate::from_ymd_opt(2024, 6, 20).unwrap(),
            recommended_quantity: quantity,
            urgency: Urgency::High,
        }
    }

    #[tokio::test]
    async fn test_missing_oracle_is_unavailable() {
        let outcome = ForecastService::disabled().forecast(&request()).await;
        assert!(!outcome.is_available());
    }

    #[tokio::test]
    async fn test_empty_answer_is_not_unavailable() {
        let service = ForecastService::new(Arc::new(FixedOracle(Ok(vec![]))));
        let outcome = service.forecast(&request()).await;
        assert_eq!(outcome, ForecastOutcome::Empty);
        assert!(outcome.is_available());
    }

    #[tokio::test]
    async fn test_oracle_error_is_unavailable() {
        let service = ForecastService::new(Arc::new(FixedOracle(Err(SyncError::OracleFailed(
            "quota exceeded".into(),
        )))));
        match service.forecast(&request()).await {
            ForecastOutcome::Unavailable { reason } => assert!(reason.contains("quota exceeded")),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_predictions_are_ready() {
        let service = ForecastService::new(Arc::new(FixedOracle(Ok(vec![prediction(12.0)]))));
        let outcome = service.forecast(&request()).await;
        assert_eq!(outcome.predictions().len(), 1);
    }

    #[tokio::test]
    async fn test_implausible_lines_are_dropped() {
        let mut cerveza = prediction(20.0);
        cerveza.ingredient_id = "ing_cerveza".into();
        let service = ForecastService::new(Arc::new(FixedOracle(Ok(vec![
            cerveza,
            prediction(-1.0),
            prediction(f64::NAN),
        ]))));

        match service.forecast(&request()).await {
            ForecastOutcome::Ready { predictions } => {
                assert_eq!(predictions.len(), 1);
                assert_eq!(predictions[0].ingredient_id, "ing_cerveza");
                assert_eq!(predictions[0].recommended_quantity, 20.0);
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_all_lines_implausible_is_still_available() {
        let service = ForecastService::new(Arc::new(FixedOracle(Ok(vec![prediction(-3.0)]))));
        let outcome = service.forecast(&request()).await;
        assert_eq!(outcome, ForecastOutcome::Empty);
        assert!(outcome.is_available());
    }
}
