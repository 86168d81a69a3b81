//! # Forecast Commands
//!
//! The forecasting screen and the one-click auto order. Auto orders are kept
//! on the till as a record of what was requested; none of this touches stock
//! until the goods are booked in through
//! [`receive_purchase`](crate::commands::inventory::receive_purchase).

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use gastro_core::forecast::{
    consumption_alerts, plan_auto_order, ForecastOutcome, ForecastRequest, Prediction,
    PurchaseOrder,
};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::Terminal;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastReport {
    pub outcome: ForecastOutcome,
    /// Predictions for ingredients that are already low or run out soon.
    pub alerts: Vec<Prediction>,
}

async fn run_forecast(terminal: &Terminal) -> ForecastOutcome {
    let request = ForecastRequest::new(
        &terminal.ingredients,
        &terminal.sales,
        &terminal.products,
        terminal.sales_window,
    );
    terminal.forecaster.forecast(&request).await
}

pub async fn forecast(terminal: &Terminal) -> ForecastReport {
    let outcome = run_forecast(terminal).await;
    let alerts = consumption_alerts(
        outcome.predictions(),
        &terminal.ingredients,
        Utc::now().date_naive(),
        terminal.alert_days,
    )
    .into_iter()
    .cloned()
    .collect();

    ForecastReport { outcome, alerts }
}

/// One order per supplier covering every prediction. The new orders are
/// recorded ahead of the earlier ones and returned.
///
/// An unavailable forecast is an error; an empty one is simply no orders.
pub async fn auto_order(terminal: &mut Terminal) -> ApiResult<Vec<PurchaseOrder>> {
    let outcome = run_forecast(terminal).await;
    match outcome {
        ForecastOutcome::Unavailable { reason } => Err(ApiError::new(
            ErrorCode::SyncError,
            format!("Forecast unavailable: {reason}"),
        )),
        ForecastOutcome::Empty => Ok(Vec::new()),
        ForecastOutcome::Ready { predictions } => {
            let orders = plan_auto_order(
                &predictions,
                &terminal.ingredients,
                &terminal.suppliers,
                Utc::now(),
            );
            for order in &orders {
                info!(
                    order_id = %order.id,
                    supplier = %order.supplier_name,
                    items = order.items.len(),
                    "Purchase order generated"
                );
            }
            let mut recorded = orders.clone();
            recorded.append(&mut terminal.purchase_orders);
            terminal.purchase_orders = recorded;
            Ok(orders)
        }
    }
}

pub fn purchase_orders(terminal: &Terminal) -> Vec<PurchaseOrder> {
    terminal.purchase_orders.clone()
}

/// Flags a recorded order as delivered. Stock is booked separately, line by
/// line, with `receive_purchase`.
pub fn mark_order_received(terminal: &mut Terminal, order_id: &str) -> ApiResult<PurchaseOrder> {
    let order = terminal
        .purchase_orders
        .iter_mut()
        .find(|o| o.id == order_id)
        .ok_or_else(|| ApiError::not_found("Purchase order", order_id))?;
    order.mark_received();

    info!(order_id, supplier = %order.supplier_name, "Purchase order received");
    Ok(order.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};
    use gastro_core::forecast::{PurchaseOrderStatus, Urgency};
    use gastro_sync::{ForecastOracle, ForecastService, SyncError, SyncResult, TerminalConfig};
    use std::sync::Arc;

    struct FixedOracle(SyncResult<Vec<Prediction>>);

    #[async_trait]
    impl ForecastOracle for FixedOracle {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn predict(&self, _request: &ForecastRequest) -> SyncResult<Vec<Prediction>> {
            match &self.0 {
                Ok(predictions) => Ok(predictions.clone()),
                Err(_) => Err(SyncError::OracleFailed("timeout".into())),
            }
        }
    }

    fn with_oracle(answer: SyncResult<Vec<Prediction>>) -> Terminal {
        Terminal::local(&TerminalConfig::default())
            .with_forecaster(ForecastService::new(Arc::new(FixedOracle(answer))))
    }

    fn prediction(ingredient_id: &str, depletes: NaiveDate, quantity: f64) -> Prediction {
        Prediction {
            ingredient_id: ingredient_id.into(),
            name: ingredient_id.trim_start_matches("ing_").into(),
            estimated_depletion_date: depletes,
            recommended_quantity: quantity,
            urgency: Urgency::Medium,
        }
    }

    #[tokio::test]
    async fn test_no_oracle_is_unavailable() {
        let mut terminal = Terminal::local(&TerminalConfig::default());

        let report = forecast(&terminal).await;
        assert!(!report.outcome.is_available());
        assert!(report.alerts.is_empty());

        let err = auto_order(&mut terminal).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SyncError);
        assert!(terminal.purchase_orders().is_empty());
    }

    #[tokio::test]
    async fn test_alerts_keep_imminent_depletions() {
        let today = Utc::now().date_naive();
        let terminal = with_oracle(Ok(vec![
            prediction("ing_cerveza", today + Duration::days(2), 50.0),
            prediction("ing_leche", today + Duration::days(30), 24.0),
        ]));

        let report = forecast(&terminal).await;
        assert_eq!(report.outcome.predictions().len(), 2);
        let alerted: Vec<&str> = report.alerts.iter().map(|p| p.ingredient_id.as_str()).collect();
        assert_eq!(alerted, vec!["ing_cerveza"]);
    }

    #[tokio::test]
    async fn test_empty_forecast_orders_nothing() {
        let mut terminal = with_oracle(Ok(vec![]));
        assert_eq!(forecast(&terminal).await.outcome, ForecastOutcome::Empty);
        assert!(auto_order(&mut terminal).await.unwrap().is_empty());
        assert!(terminal.purchase_orders().is_empty());
    }

    #[tokio::test]
    async fn test_failing_oracle_blocks_auto_order() {
        let mut terminal = with_oracle(Err(SyncError::OracleFailed("timeout".into())));
        let err = auto_order(&mut terminal).await.unwrap_err();
        assert!(err.message.contains("unavailable"));
    }

    #[tokio::test]
    async fn test_auto_order_groups_by_supplier() {
        let soon = Utc::now().date_naive() + Duration::days(3);
        let mut terminal = with_oracle(Ok(vec![
            prediction("ing_cerveza", soon, 50.0),
            prediction("ing_leche", soon, 24.0),
            prediction("ing_tonica", soon, 48.0),
        ]));

        let orders = auto_order(&mut terminal).await.unwrap();

        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].supplier_name, "Distribuciones Mahou");
        assert_eq!(orders[0].items.len(), 2);
        assert_eq!(orders[1].supplier_name, "Makro Cash & Carry");
        assert_eq!(orders[1].items[0].ingredient_id, "ing_leche");
        // Nothing is received until someone books the goods in.
        assert_eq!(
            terminal.ingredient("ing_cerveza").unwrap().stock,
            gastro_db::seed::ingredients()[0].stock
        );
    }

    #[tokio::test]
    async fn test_auto_orders_are_recorded_newest_first() {
        let soon = Utc::now().date_naive() + Duration::days(3);
        let mut terminal = with_oracle(Ok(vec![
            prediction("ing_cerveza", soon, 50.0),
            prediction("ing_leche", soon, 24.0),
        ]));

        let first = auto_order(&mut terminal).await.unwrap();
        let second = auto_order(&mut terminal).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);

        let recorded = purchase_orders(&terminal);
        assert_eq!(recorded.len(), 4);
        assert_eq!(recorded[..2], second[..]);
        assert_eq!(recorded[2..], first[..]);
        assert!(recorded.iter().all(|o| o.status == PurchaseOrderStatus::Sent));
    }

    #[tokio::test]
    async fn test_mark_order_received() {
        let soon = Utc::now().date_naive() + Duration::days(3);
        let mut terminal = with_oracle(Ok(vec![prediction("ing_leche", soon, 24.0)]));
        let orders = auto_order(&mut terminal).await.unwrap();

        let order = mark_order_received(&mut terminal, &orders[0].id).unwrap();
        assert_eq!(order.status, PurchaseOrderStatus::Received);
        assert_eq!(terminal.purchase_orders()[0].status, PurchaseOrderStatus::Received);

        let err = mark_order_received(&mut terminal, "NOPE").unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
