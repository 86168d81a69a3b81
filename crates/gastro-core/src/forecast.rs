//! # Forecast Planning
//!
//! Pure side of purchase forecasting. The oracle that produces predictions
//! lives behind a trait in `gastro-sync`; this module only shapes what goes
//! in and interprets what comes out.
//!
//! ## Flow
//! ```text
//! ForecastRequest ──► ForecastOracle (opaque) ──► ForecastOutcome
//!  stock levels                                     ├── Ready(predictions)
//!  recent sales                                     ├── Empty
//!  recipes                                          └── Unavailable { reason }
//!                                                          │
//!                          ┌───────────────────────────────┴──────┐
//!                          ▼                                      ▼
//!                 consumption_alerts()                   plan_auto_order()
//!                 below minimum OR depletes               one PurchaseOrder
//!                 within alert_days                       per supplier
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::types::{Ingredient, Product, Sale, Supplier};

/// Supplier name used when an ingredient has no (known) supplier.
pub const GENERAL_SUPPLIER: &str = "General supplier";

/// Default look-ahead window for alerts, in days.
pub const DEFAULT_ALERT_DAYS: i64 = 10;

// =============================================================================
// Predictions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    High,
    Medium,
    Low,
}

/// One line of the oracle's answer. Values are displayed as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub ingredient_id: String,
    pub name: String,
    #[ts(as = "String")]
    pub estimated_depletion_date: NaiveDate,
    pub recommended_quantity: f64,
    pub urgency: Urgency,
}

/// Everything the oracle gets to look at.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    pub ingredients: Vec<Ingredient>,
    pub recent_sales: Vec<Sale>,
    pub recipes: Vec<Product>,
}

impl ForecastRequest {
    /// Builds a request from the newest `window` sales.
    pub fn new(ingredients: &[Ingredient], sales: &[Sale], products: &[Product], window: usize) -> Self {
        let skip = sales.len().saturating_sub(window);
        Self {
            ingredients: ingredients.to_vec(),
            recent_sales: sales[skip..].to_vec(),
            recipes: products.iter().filter(|p| p.tracks_stock()).cloned().collect(),
        }
    }
}

/// What the forecasting screen shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastOutcome {
    /// The oracle answered with at least one prediction.
    Ready { predictions: Vec<Prediction> },
    /// The oracle answered and foresees nothing.
    Empty,
    /// No answer: oracle not configured, failed, or overloaded.
    Unavailable { reason: String },
}

impl ForecastOutcome {
    pub fn from_predictions(predictions: Vec<Prediction>) -> Self {
        if predictions.is_empty() {
            ForecastOutcome::Empty
        } else {
            ForecastOutcome::Ready { predictions }
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        ForecastOutcome::Unavailable {
            reason: reason.into(),
        }
    }

    /// Predictions, empty unless `Ready`.
    pub fn predictions(&self) -> &[Prediction] {
        match self {
            ForecastOutcome::Ready { predictions } => predictions,
            _ => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, ForecastOutcome::Unavailable { .. })
    }
}

// =============================================================================
// Alerts
// =============================================================================

/// Predictions worth shouting about.
///
/// Kept when the ingredient is already at or below its minimum, or when it
/// runs out within `alert_days` of `today`.
pub fn consumption_alerts<'a>(
    predictions: &'a [Prediction],
    ingredients: &[Ingredient],
    today: NaiveDate,
    alert_days: i64,
) -> Vec<&'a Prediction> {
    predictions
        .iter()
        .filter(|p| {
            let low = ingredients
                .iter()
                .find(|i| i.id == p.ingredient_id)
                .is_some_and(Ingredient::is_below_minimum);
            let days_left = (p.estimated_depletion_date - today).num_days();
            low || days_left <= alert_days
        })
        .collect()
}

// =============================================================================
// Auto Order
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Sent,
    Received,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderItem {
    pub ingredient_id: String,
    pub name: String,
    pub quantity: f64,
}

/// A synthetic order record. Nothing is actually sent to the supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: String,
    pub supplier_name: String,
    pub items: Vec<PurchaseOrderItem>,
    pub status: PurchaseOrderStatus,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
}

impl PurchaseOrder {
    pub fn mark_received(&mut self) {
        self.status = PurchaseOrderStatus::Received;
    }
}

/// Groups every prediction into one order per supplier.
///
/// Suppliers appear in the order their first prediction does.
pub fn plan_auto_order(
    predictions: &[Prediction],
    ingredients: &[Ingredient],
    suppliers: &[Supplier],
    now: DateTime<Utc>,
) -> Vec<PurchaseOrder> {
    let mut grouped: Vec<(String, Vec<PurchaseOrderItem>)> = Vec::new();

    for prediction in predictions {
        let supplier_name = ingredients
            .iter()
            .find(|i| i.id == prediction.ingredient_id)
            .and_then(|i| i.supplier_id.as_deref())
            .and_then(|sid| suppliers.iter().find(|s| s.id == sid))
            .map(|s| s.name.clone())
            .unwrap_or_else(|| GENERAL_SUPPLIER.to_string());

        let item = PurchaseOrderItem {
            ingredient_id: prediction.ingredient_id.clone(),
            name: prediction.name.clone(),
            quantity: prediction.recommended_quantity,
        };
        match grouped.iter_mut().find(|(name, _)| *name == supplier_name) {
            Some((_, items)) => items.push(item),
            None => grouped.push((supplier_name, vec![item])),
        }
    }

    grouped
        .into_iter()
        .map(|(supplier_name, items)| PurchaseOrder {
            id: order_reference(),
            supplier_name,
            items,
            status: PurchaseOrderStatus::Sent,
            date: now,
        })
        .collect()
}

/// Short uppercase reference printed on the order.
fn order_reference() -> String {
    Uuid::new_v4().simple().to_string()[..9].to_uppercase()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
    }

    fn ingredient(id: &str, stock: f64, min: f64, supplier: Option<&str>) -> Ingredient {
        Ingredient {
            id: id.into(),
            name: id.into(),
            stock,
            unit: "L".into(),
            min_stock: min,
            cost_per_unit: Money::from_cents(100),
            supplier_id: supplier.map(str::to_string),
        }
    }

    fn prediction(id: &str, days: i64, qty: f64) -> Prediction {
        Prediction {
            ingredient_id: id.into(),
            name: id.into(),
            estimated_depletion_date: today() + chrono::Duration::days(days),
            recommended_quantity: qty,
            urgency: Urgency::Medium,
        }
    }

    #[test]
    fn test_outcome_distinguishes_empty_from_unavailable() {
        assert_eq!(ForecastOutcome::from_predictions(vec![]), ForecastOutcome::Empty);
        let down = ForecastOutcome::unavailable("timeout");
        assert!(!down.is_available());
        assert!(down.predictions().is_empty());
        assert!(ForecastOutcome::Empty.is_available());
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(ForecastOutcome::unavailable("no key")).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["reason"], "no key");
    }

    #[test]
    fn test_alerts() {
        let ingredients = vec![
            ingredient("ing_cerveza", 10.0, 15.0, None),
            ingredient("ing_cafe", 9.0, 2.0, None),
            ingredient("ing_leche", 30.0, 5.0, None),
        ];
        let predictions = vec![
            // below minimum although far away
            prediction("ing_cerveza", 40, 50.0),
            // exactly on the window edge
            prediction("ing_cafe", 10, 5.0),
            // fine
            prediction("ing_leche", 11, 12.0),
        ];

        let alerts = consumption_alerts(&predictions, &ingredients, today(), DEFAULT_ALERT_DAYS);
        let ids: Vec<_> = alerts.iter().map(|p| p.ingredient_id.as_str()).collect();
        assert_eq!(ids, vec!["ing_cerveza", "ing_cafe"]);
    }

    #[test]
    fn test_auto_order_groups_by_supplier() {
        let suppliers = vec![Supplier {
            id: "sup_mahou".into(),
            name: "Distribuciones Mahou".into(),
            contact_name: None,
            phone: None,
            email: None,
        }];
        let ingredients = vec![
            ingredient("ing_cerveza", 10.0, 15.0, Some("sup_mahou")),
            ingredient("ing_tonica", 10.0, 15.0, Some("sup_mahou")),
            ingredient("ing_cafe", 1.0, 2.0, Some("sup_unknown")),
        ];
        let predictions = vec![
            prediction("ing_cerveza", 2, 50.0),
            prediction("ing_cafe", 3, 5.0),
            prediction("ing_tonica", 4, 24.0),
        ];

        let orders = plan_auto_order(&predictions, &ingredients, &suppliers, Utc::now());
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].supplier_name, "Distribuciones Mahou");
        assert_eq!(orders[0].items.len(), 2);
        assert_eq!(orders[1].supplier_name, GENERAL_SUPPLIER);
        assert!(orders.iter().all(|o| o.status == PurchaseOrderStatus::Sent));
        assert_eq!(orders[0].id.len(), 9);
    }

    #[test]
    fn test_request_keeps_newest_sales() {
        use crate::types::PaymentMethod;
        let sales: Vec<Sale> = (0..5)
            .map(|n| Sale {
                id: format!("v{n}"),
                timestamp: Utc::now(),
                items: Vec::new(),
                total: Money::zero(),
                amount_paid: None,
                change: None,
                payment_method: PaymentMethod::Cash,
                seller_id: "u1".into(),
                table_id: None,
                tenant_id: "t1".into(),
                shift_id: None,
            })
            .collect();
        let request = ForecastRequest::new(&[], &sales, &[], 2);
        let ids: Vec<_> = request.recent_sales.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["v3", "v4"]);
    }
}
