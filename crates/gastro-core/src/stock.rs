//! # Stock Propagator
//!
//! Translates consumption events (sale lines, waste entries) into ingredient
//! stock decrements, using each product's recipe as the conversion table.
//!
//! ## Propagation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ConsumptionEvent { product: "p_cana", quantity: 3, mixer: None }       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  catalogue lookup ──(not found)──► MissingReference(Product), no effect │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  recipe: [{ ing_cerveza, 0.20 }]                                        │
//! │       │                                                                 │
//! │       ├─► ing_cerveza.stock −= 0.20 × 3                                 │
//! │       │   (ingredient not found → MissingReference(Ingredient), skip)   │
//! │       │                                                                 │
//! │       └─► mixer (sale lines only, unless "none")                        │
//! │           mixer.stock −= 3                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock has no floor: an over-sold keg goes negative until someone counts
//! it. Decrements are plain subtraction, so the order events are applied in
//! never changes the result.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{Ingredient, Product, Sale, SaleLine, WasteEntry};
use crate::NO_MIXER;

// =============================================================================
// Policy
// =============================================================================

/// What to do when an event references an unknown product or ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingReferencePolicy {
    /// Skip the reference.
    #[default]
    Ignore,
    /// Skip the reference; the caller logs every miss.
    Warn,
    /// Fail the whole batch before touching any stock.
    Reject,
}

impl std::str::FromStr for MissingReferencePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "warn" => Ok(Self::Warn),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown missing-reference policy: {other}")),
        }
    }
}

// =============================================================================
// Events & Results
// =============================================================================

/// A unit of product leaving the bar.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionEvent {
    pub product_id: String,
    pub quantity: f64,
    /// Only sale lines carry a mixer.
    pub mixer_id: Option<String>,
}

impl ConsumptionEvent {
    pub fn new(product_id: impl Into<String>, quantity: f64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            mixer_id: None,
        }
    }

    /// Every line of a ticket.
    pub fn from_sale(sale: &Sale) -> Vec<Self> {
        sale.items.iter().map(Self::from).collect()
    }
}

impl From<&SaleLine> for ConsumptionEvent {
    fn from(line: &SaleLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            quantity: line.quantity as f64,
            mixer_id: line.mixer_id.clone(),
        }
    }
}

impl From<&WasteEntry> for ConsumptionEvent {
    fn from(entry: &WasteEntry) -> Self {
        Self::new(entry.product_id.clone(), entry.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Product,
    Ingredient,
    Mixer,
}

impl ReferenceKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Product => "product",
            ReferenceKind::Ingredient => "ingredient",
            ReferenceKind::Mixer => "mixer",
        }
    }
}

/// A lookup that failed while propagating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingReference {
    pub kind: ReferenceKind,
    pub id: String,
    /// Product whose event carried the reference.
    pub product_id: String,
}

impl From<MissingReference> for CoreError {
    fn from(missing: MissingReference) -> Self {
        CoreError::MissingReference {
            kind: missing.kind.as_str().to_string(),
            id: missing.id,
        }
    }
}

/// Outcome of a propagation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Consumption {
    /// The complete ingredient collection after decrements.
    pub ingredients: Vec<Ingredient>,
    /// Ids of the ingredients that changed, in first-touched order.
    pub touched: Vec<String>,
    /// References that could not be resolved and were skipped.
    pub missing: Vec<MissingReference>,
}

impl Consumption {
    /// Changed ingredients, ready to be persisted one by one.
    pub fn touched_ingredients(&self) -> impl Iterator<Item = &Ingredient> + '_ {
        self.touched
            .iter()
            .filter_map(|id| self.ingredients.iter().find(|i| &i.id == id))
    }
}

// =============================================================================
// Propagator
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct StockPropagator {
    policy: MissingReferencePolicy,
}

impl StockPropagator {
    pub fn new(policy: MissingReferencePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MissingReferencePolicy {
        self.policy
    }

    /// Applies `events` to a snapshot of `ingredients`.
    ///
    /// The input slices are never mutated; the updated collection is
    /// returned in [`Consumption::ingredients`].
    ///
    /// ## Errors
    /// Under [`MissingReferencePolicy::Reject`], the first unresolved
    /// reference as [`CoreError::MissingReference`]. Nothing is applied.
    ///
    /// ## Example
    /// ```rust
    /// use gastro_core::stock::{ConsumptionEvent, StockPropagator};
    /// use gastro_core::types::{Ingredient, Product, RecipeLine};
    /// use gastro_core::Money;
    ///
    /// let keg = Ingredient {
    ///     id: "ing_cerveza".into(), name: "Barril".into(), stock: 50.0,
    ///     unit: "L".into(), min_stock: 15.0,
    ///     cost_per_unit: Money::from_cents(210), supplier_id: None,
    /// };
    /// let cana = Product {
    ///     id: "p_cana".into(), name: "Caña".into(), category: "Cervezas".into(),
    ///     price: Money::from_cents(150), image_url: String::new(),
    ///     recipe: vec![RecipeLine::new("ing_cerveza", 0.20)],
    /// };
    ///
    /// let result = StockPropagator::default()
    ///     .apply(&[cana], &[keg], &[ConsumptionEvent::new("p_cana", 3.0)])
    ///     .unwrap();
    /// assert!((result.ingredients[0].stock - 49.4).abs() < 1e-9);
    /// ```
    pub fn apply(
        &self,
        products: &[Product],
        ingredients: &[Ingredient],
        events: &[ConsumptionEvent],
    ) -> CoreResult<Consumption> {
        let catalogue: HashMap<&str, &Product> =
            products.iter().map(|p| (p.id.as_str(), p)).collect();
        let positions: HashMap<&str, usize> = ingredients
            .iter()
            .enumerate()
            .map(|(pos, i)| (i.id.as_str(), pos))
            .collect();

        // Resolve everything first so Reject can bail out untouched.
        let mut deltas: Vec<(usize, f64)> = Vec::new();
        let mut missing = Vec::new();

        for event in events {
            let Some(product) = catalogue.get(event.product_id.as_str()) else {
                missing.push(MissingReference {
                    kind: ReferenceKind::Product,
                    id: event.product_id.clone(),
                    product_id: event.product_id.clone(),
                });
                continue;
            };

            for line in &product.recipe {
                match positions.get(line.ingredient_id.as_str()) {
                    Some(&pos) => deltas.push((pos, line.quantity * event.quantity)),
                    None => missing.push(MissingReference {
                        kind: ReferenceKind::Ingredient,
                        id: line.ingredient_id.clone(),
                        product_id: product.id.clone(),
                    }),
                }
            }

            if let Some(mixer) = event.mixer_id.as_deref().filter(|m| is_real_mixer(m)) {
                match positions.get(mixer) {
                    Some(&pos) => deltas.push((pos, event.quantity)),
                    None => missing.push(MissingReference {
                        kind: ReferenceKind::Mixer,
                        id: mixer.to_string(),
                        product_id: product.id.clone(),
                    }),
                }
            }
        }

        if self.policy == MissingReferencePolicy::Reject {
            if let Some(first) = missing.first() {
                return Err(first.clone().into());
            }
        }

        let mut updated = ingredients.to_vec();
        let mut touched: Vec<String> = Vec::new();
        for (pos, amount) in deltas {
            let ingredient = &mut updated[pos];
            ingredient.stock -= amount;
            if !touched.contains(&ingredient.id) {
                touched.push(ingredient.id.clone());
            }
        }

        Ok(Consumption {
            ingredients: updated,
            touched,
            missing,
        })
    }
}

fn is_real_mixer(mixer_id: &str) -> bool {
    !mixer_id.is_empty() && mixer_id != NO_MIXER
}

/// Ingredients at or below their minimum, critical ones first.
pub fn low_stock(ingredients: &[Ingredient]) -> Vec<&Ingredient> {
    let mut low: Vec<&Ingredient> = ingredients.iter().filter(|i| i.is_below_minimum()).collect();
    low.sort_by_key(|i| !i.is_critical());
    low
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{RecipeLine, WasteReason};
    use chrono::Utc;

    fn ingredient(id: &str, stock: f64, min: f64) -> Ingredient {
        Ingredient {
            id: id.into(),
            name: id.into(),
            stock,
            unit: "L".into(),
            min_stock: min,
            cost_per_unit: Money::from_cents(100),
            supplier_id: None,
        }
    }

    fn product(id: &str, recipe: Vec<RecipeLine>) -> Product {
        Product {
            id: id.into(),
            name: id.into(),
            category: "Cervezas".into(),
            price: Money::from_cents(150),
            image_url: String::new(),
            recipe,
        }
    }

    fn stock_of(consumption: &Consumption, id: &str) -> f64 {
        consumption
            .ingredients
            .iter()
            .find(|i| i.id == id)
            .map(|i| i.stock)
            .unwrap()
    }

    fn bar() -> (Vec<Product>, Vec<Ingredient>) {
        let products = vec![
            product("p_cana", vec![RecipeLine::new("ing_cerveza", 0.20)]),
            product(
                "p_cafe_leche",
                vec![
                    RecipeLine::new("ing_cafe", 0.008),
                    RecipeLine::new("ing_leche", 0.15),
                ],
            ),
            product("p_gintonic", vec![RecipeLine::new("ing_ginebra", 0.071)]),
            product("p_tapa", vec![RecipeLine::new("ing_retirado", 1.0)]),
            product("p_agua", vec![]),
        ];
        let ingredients = vec![
            ingredient("ing_cerveza", 50.0, 15.0),
            ingredient("ing_cafe", 10.0, 2.0),
            ingredient("ing_leche", 20.0, 5.0),
            ingredient("ing_ginebra", 5.0, 1.0),
            ingredient("ing_tonica", 48.0, 24.0),
        ];
        (products, ingredients)
    }

    #[test]
    fn test_sell_three_canas() {
        let (products, ingredients) = bar();
        let result = StockPropagator::default()
            .apply(&products, &ingredients, &[ConsumptionEvent::new("p_cana", 3.0)])
            .unwrap();

        assert!((stock_of(&result, "ing_cerveza") - 49.4).abs() < 1e-9);
        assert_eq!(result.touched, vec!["ing_cerveza".to_string()]);
        // input snapshot untouched
        assert_eq!(ingredients[0].stock, 50.0);
    }

    #[test]
    fn test_multi_ingredient_recipe() {
        let (products, ingredients) = bar();
        let result = StockPropagator::default()
            .apply(
                &products,
                &ingredients,
                &[ConsumptionEvent::new("p_cafe_leche", 2.0)],
            )
            .unwrap();

        assert!((stock_of(&result, "ing_cafe") - 9.984).abs() < 1e-9);
        assert!((stock_of(&result, "ing_leche") - 19.7).abs() < 1e-9);
        assert_eq!(result.touched.len(), 2);
    }

    #[test]
    fn test_mixer_is_decremented_per_unit() {
        let (products, ingredients) = bar();
        let line = SaleLine {
            product_id: "p_gintonic".into(),
            name: None,
            quantity: 2,
            unit_price: Money::from_cents(800),
            mixer_id: Some("ing_tonica".into()),
        };
        let result = StockPropagator::default()
            .apply(&products, &ingredients, &[ConsumptionEvent::from(&line)])
            .unwrap();

        assert!((stock_of(&result, "ing_ginebra") - 4.858).abs() < 1e-9);
        assert!((stock_of(&result, "ing_tonica") - 46.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_mixer_sentinel_is_ignored() {
        let (products, ingredients) = bar();
        let mut event = ConsumptionEvent::new("p_gintonic", 1.0);
        event.mixer_id = Some(NO_MIXER.to_string());

        let result = StockPropagator::new(MissingReferencePolicy::Reject)
            .apply(&products, &ingredients, &[event])
            .unwrap();

        assert_eq!(stock_of(&result, "ing_tonica"), 48.0);
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_waste_uses_same_recipe() {
        let (products, ingredients) = bar();
        let waste = WasteEntry {
            id: "w1".into(),
            timestamp: Utc::now(),
            product_id: "p_cana".into(),
            quantity: 2.0,
            reason: WasteReason::Breakage,
            user_id: "u1".into(),
            note: None,
        };
        let result = StockPropagator::default()
            .apply(&products, &ingredients, &[ConsumptionEvent::from(&waste)])
            .unwrap();

        assert!((stock_of(&result, "ing_cerveza") - 49.6).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_ingredient_is_skipped() {
        let (products, ingredients) = bar();
        let result = StockPropagator::default()
            .apply(&products, &ingredients, &[ConsumptionEvent::new("p_tapa", 2.0)])
            .unwrap();

        assert_eq!(result.ingredients, ingredients);
        assert!(result.touched.is_empty());
        assert_eq!(result.missing.len(), 1);
        assert_eq!(result.missing[0].kind, ReferenceKind::Ingredient);
    }

    #[test]
    fn test_unknown_product_has_no_effect() {
        let (products, ingredients) = bar();
        let result = StockPropagator::new(MissingReferencePolicy::Warn)
            .apply(&products, &ingredients, &[ConsumptionEvent::new("p_ghost", 1.0)])
            .unwrap();

        assert_eq!(result.ingredients, ingredients);
        assert_eq!(result.missing[0].kind, ReferenceKind::Product);
    }

    #[test]
    fn test_product_without_recipe() {
        let (products, ingredients) = bar();
        let result = StockPropagator::default()
            .apply(&products, &ingredients, &[ConsumptionEvent::new("p_agua", 4.0)])
            .unwrap();
        assert_eq!(result.ingredients, ingredients);
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_reject_policy_applies_nothing() {
        let (products, ingredients) = bar();
        let events = vec![
            ConsumptionEvent::new("p_cana", 1.0),
            ConsumptionEvent::new("p_tapa", 1.0),
        ];
        let err = StockPropagator::new(MissingReferencePolicy::Reject)
            .apply(&products, &ingredients, &events)
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingReference { .. }));
    }

    #[test]
    fn test_stock_goes_negative() {
        let (products, ingredients) = bar();
        let result = StockPropagator::default()
            .apply(&products, &ingredients, &[ConsumptionEvent::new("p_cana", 300.0)])
            .unwrap();
        assert!((stock_of(&result, "ing_cerveza") + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_order_does_not_matter() {
        let (products, ingredients) = bar();
        let events = vec![
            ConsumptionEvent::new("p_cana", 3.0),
            ConsumptionEvent::new("p_cafe_leche", 1.0),
            ConsumptionEvent::new("p_cana", 2.0),
        ];
        let mut reversed = events.clone();
        reversed.reverse();

        let propagator = StockPropagator::default();
        let forward = propagator.apply(&products, &ingredients, &events).unwrap();
        let backward = propagator.apply(&products, &ingredients, &reversed).unwrap();

        for ingredient in &forward.ingredients {
            let other = stock_of(&backward, &ingredient.id);
            assert!((ingredient.stock - other).abs() < 1e-9);
        }
        // 0.20 × (3 + 2) removed from the keg
        assert!((stock_of(&forward, "ing_cerveza") - 49.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_input_same_output() {
        let (products, ingredients) = bar();
        let events = vec![ConsumptionEvent::new("p_cana", 3.0)];
        let propagator = StockPropagator::default();
        assert_eq!(
            propagator.apply(&products, &ingredients, &events).unwrap(),
            propagator.apply(&products, &ingredients, &events).unwrap()
        );
    }

    #[test]
    fn test_low_stock_puts_critical_first() {
        let ingredients = vec![
            ingredient("a", 14.0, 15.0),
            ingredient("b", 50.0, 15.0),
            ingredient("c", 2.0, 15.0),
        ];
        let ids: Vec<_> = low_stock(&ingredients).iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("WARN".parse::<MissingReferencePolicy>(), Ok(MissingReferencePolicy::Warn));
        assert!("loud".parse::<MissingReferencePolicy>().is_err());
    }
}
