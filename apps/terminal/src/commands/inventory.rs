//! # Inventory Commands
//!
//! Catalogue maintenance and goods receipts.
//!
//! ```text
//! receive_purchase ──► stock += qty ──► Compra expense (10 % VAT)
//!                            │                  │
//!                            └──── one batch ───┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use gastro_core::stock;
use gastro_core::validation::{
    validate_ingredient, validate_new_product, validate_recipe, validate_stock_quantity,
};
use gastro_core::{CoreError, Ingredient, Money, Product, RecipeLine, TaxEntry, ValidationError};
use gastro_sync::{OutboundWrite, WriteBatch};

use crate::error::ApiResult;
use crate::state::Terminal;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProductRequest {
    /// An empty id is replaced by a generated one.
    pub product: Product,
    /// Products sold from stock must carry a recipe.
    #[serde(default = "default_track_stock")]
    pub track_stock: bool,
}

fn default_track_stock() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivePurchaseRequest {
    pub ingredient_id: String,
    pub quantity: f64,
    /// VAT included.
    pub total_cost: Money,
    /// Overrides the generated "Compra: ..." concept.
    #[serde(default)]
    pub concept: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueResponse<T> {
    pub item: T,
    pub batch_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub ingredient: Ingredient,
    pub entry: TaxEntry,
    pub batch_id: Option<u64>,
}

// =============================================================================
// Ingredients
// =============================================================================

/// Inserts or replaces an ingredient by id.
pub fn upsert_ingredient(
    terminal: &mut Terminal,
    mut ingredient: Ingredient,
) -> ApiResult<CatalogueResponse<Ingredient>> {
    validate_ingredient(&ingredient).map_err(CoreError::from)?;
    if ingredient.id.trim().is_empty() {
        ingredient.id = generated_id("ing");
    }

    match terminal.ingredients.iter_mut().find(|i| i.id == ingredient.id) {
        Some(existing) => *existing = ingredient.clone(),
        None => terminal.ingredients.push(ingredient.clone()),
    }
    debug!(ingredient_id = %ingredient.id, stock = ingredient.stock, "Ingredient saved");

    let batch_id = terminal.dispatch(
        WriteBatch::new("upsert_ingredient").then(OutboundWrite::UpsertIngredient(ingredient.clone())),
    );
    Ok(CatalogueResponse {
        item: ingredient,
        batch_id,
    })
}

/// Ingredients at or below their minimum, critical ones first.
pub fn low_stock(terminal: &Terminal) -> Vec<Ingredient> {
    stock::low_stock(&terminal.ingredients)
        .into_iter()
        .cloned()
        .collect()
}

/// Goods arrived: stock goes up and the invoice lands in the tax ledger.
pub fn receive_purchase(
    terminal: &mut Terminal,
    request: ReceivePurchaseRequest,
) -> ApiResult<PurchaseResponse> {
    validate_stock_quantity("quantity", request.quantity).map_err(CoreError::from)?;
    if request.total_cost.is_negative() {
        return Err(CoreError::from(ValidationError::MustNotBeNegative {
            field: "total_cost".to_string(),
        })
        .into());
    }

    let ingredient = terminal
        .ingredients
        .iter_mut()
        .find(|i| i.id == request.ingredient_id)
        .ok_or_else(|| CoreError::IngredientNotFound(request.ingredient_id.clone()))?;
    ingredient.restock(request.quantity);
    let ingredient = ingredient.clone();

    let mut entry = TaxEntry::purchase(
        &ingredient.name,
        request.quantity,
        &ingredient.unit,
        request.total_cost,
        Utc::now().date_naive(),
    );
    if let Some(concept) = request.concept.filter(|c| !c.trim().is_empty()) {
        entry.concept = concept;
    }

    let batch = WriteBatch::new("receive_purchase")
        .then(OutboundWrite::UpsertIngredient(ingredient.clone()))
        .then(OutboundWrite::InsertTaxEntry(entry.clone()));
    let batch_id = terminal.dispatch(batch);

    info!(
        ingredient_id = %ingredient.id,
        quantity = request.quantity,
        stock = ingredient.stock,
        cost = %entry.total,
        "Purchase received"
    );
    terminal.tax_entries.push(entry.clone());

    Ok(PurchaseResponse {
        ingredient,
        entry,
        batch_id,
    })
}

// =============================================================================
// Products
// =============================================================================

pub fn add_product(
    terminal: &mut Terminal,
    request: AddProductRequest,
) -> ApiResult<CatalogueResponse<Product>> {
    let mut product = request.product;
    if product.id.trim().is_empty() {
        product.id = generated_id("p");
    } else if terminal.products.iter().any(|p| p.id == product.id) {
        return Err(CoreError::from(ValidationError::Duplicate {
            field: "product id".to_string(),
            value: product.id,
        })
        .into());
    }

    validate_new_product(&product, request.track_stock).map_err(CoreError::from)?;
    ensure_ingredients_exist(terminal, &product.recipe)?;

    terminal.products.push(product.clone());
    info!(product_id = %product.id, name = %product.name, price = %product.price, "Product added");

    let batch_id = terminal
        .dispatch(WriteBatch::new("add_product").then(OutboundWrite::UpsertProduct(product.clone())));
    Ok(CatalogueResponse {
        item: product,
        batch_id,
    })
}

/// Replaces the recipe of an existing product. An empty recipe is refused.
pub fn update_recipe(
    terminal: &mut Terminal,
    product_id: &str,
    recipe: Vec<RecipeLine>,
) -> ApiResult<CatalogueResponse<Product>> {
    if recipe.is_empty() {
        return Err(CoreError::from(ValidationError::Required {
            field: "recipe".to_string(),
        })
        .into());
    }
    ensure_ingredients_exist(terminal, &recipe)?;

    let position = terminal
        .products
        .iter()
        .position(|p| p.id == product_id)
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

    let mut updated = terminal.products[position].clone();
    updated.recipe = recipe;
    validate_recipe(&updated).map_err(CoreError::from)?;
    terminal.products[position] = updated.clone();

    info!(product_id, lines = updated.recipe.len(), "Recipe updated");
    let batch_id = terminal
        .dispatch(WriteBatch::new("update_recipe").then(OutboundWrite::UpsertProduct(updated.clone())));
    Ok(CatalogueResponse {
        item: updated,
        batch_id,
    })
}

fn ensure_ingredients_exist(terminal: &Terminal, recipe: &[RecipeLine]) -> ApiResult<()> {
    match recipe
        .iter()
        .find(|line| terminal.ingredient(&line.ingredient_id).is_none())
    {
        Some(line) => Err(CoreError::IngredientNotFound(line.ingredient_id.clone()).into()),
        None => Ok(()),
    }
}

fn generated_id(prefix: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{prefix}{}", &random[..9])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing::{mirrored_terminal, report_for};
    use gastro_core::TaxRate;
    use gastro_sync::TerminalConfig;

    fn local() -> Terminal {
        Terminal::local(&TerminalConfig::default())
    }

    fn tostada(recipe: Vec<RecipeLine>) -> Product {
        Product {
            id: String::new(),
            name: "Tostada con Aceite".into(),
            category: "Desayunos".into(),
            price: Money::from_cents(220),
            image_url: String::new(),
            recipe,
        }
    }

    fn receipt(ingredient_id: &str, quantity: f64, cents: i64) -> ReceivePurchaseRequest {
        ReceivePurchaseRequest {
            ingredient_id: ingredient_id.into(),
            quantity,
            total_cost: Money::from_cents(cents),
            concept: None,
        }
    }

    #[test]
    fn test_add_product_generates_id() {
        let mut terminal = local();
        let before = terminal.products().len();

        let added = add_product(
            &mut terminal,
            AddProductRequest {
                product: tostada(vec![RecipeLine::new("ing_pan_barra", 0.5)]),
                track_stock: true,
            },
        )
        .unwrap()
        .item;

        assert!(added.id.starts_with('p'));
        assert_eq!(added.id.len(), 10);
        assert_eq!(terminal.products().len(), before + 1);
        assert!(terminal.product(&added.id).is_some());
    }

    #[test]
    fn test_add_product_rules() {
        let mut terminal = local();

        let err = add_product(
            &mut terminal,
            AddProductRequest {
                product: tostada(vec![]),
                track_stock: true,
            },
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = add_product(
            &mut terminal,
            AddProductRequest {
                product: tostada(vec![RecipeLine::new("ing_aceite", 0.01)]),
                track_stock: true,
            },
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let mut duplicate = tostada(vec![RecipeLine::new("ing_pan_barra", 0.5)]);
        duplicate.id = "p_cana".into();
        let err = add_product(
            &mut terminal,
            AddProductRequest {
                product: duplicate,
                track_stock: true,
            },
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let untracked = add_product(
            &mut terminal,
            AddProductRequest {
                product: tostada(vec![]),
                track_stock: false,
            },
        );
        assert!(untracked.is_ok());
    }

    #[test]
    fn test_update_recipe() {
        let mut terminal = local();

        let updated = update_recipe(
            &mut terminal,
            "p_cana",
            vec![RecipeLine::new("ing_cerveza", 0.25)],
        )
        .unwrap()
        .item;
        assert_eq!(updated.recipe, vec![RecipeLine::new("ing_cerveza", 0.25)]);
        assert_eq!(terminal.product("p_cana").unwrap().recipe[0].quantity, 0.25);

        let err = update_recipe(&mut terminal, "p_cana", vec![]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = update_recipe(
            &mut terminal,
            "p_nope",
            vec![RecipeLine::new("ing_cerveza", 0.25)],
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = update_recipe(
            &mut terminal,
            "p_cana",
            vec![RecipeLine::new("ing_cerveza", -0.1)],
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(terminal.product("p_cana").unwrap().recipe[0].quantity, 0.25);
    }

    #[test]
    fn test_upsert_ingredient_replaces_by_id() {
        let mut terminal = local();
        let count = terminal.ingredients().len();

        let mut leche = terminal.ingredient("ing_leche").unwrap().clone();
        leche.min_stock = 12.0;
        upsert_ingredient(&mut terminal, leche).unwrap();
        assert_eq!(terminal.ingredients().len(), count);
        assert_eq!(terminal.ingredient("ing_leche").unwrap().min_stock, 12.0);

        let mut invalid = terminal.ingredient("ing_leche").unwrap().clone();
        invalid.min_stock = -1.0;
        let err = upsert_ingredient(&mut terminal, invalid).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_non_finite_minimum_is_rejected() {
        let mut terminal = local();
        let mut leche = terminal.ingredient("ing_leche").unwrap().clone();
        let before = leche.min_stock;
        leche.min_stock = f64::NAN;

        let err = upsert_ingredient(&mut terminal, leche).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(terminal.ingredient("ing_leche").unwrap().min_stock, before);
    }

    #[test]
    fn test_receive_purchase() {
        let mut terminal = local();
        let before = terminal.ingredient("ing_leche").unwrap().stock;

        let response = receive_purchase(&mut terminal, receipt("ing_leche", 24.0, 2200)).unwrap();

        assert!((response.ingredient.stock - before - 24.0).abs() < 1e-9);
        assert_eq!(response.entry.concept, "Compra: Leche (1L) (24 L)");
        assert_eq!(response.entry.tax_rate, TaxRate::REDUCED);
        assert_eq!(response.entry.base.cents(), 2000);
        assert!(!response.entry.is_cash_out);
        assert_eq!(terminal.tax_entries().len(), 1);
    }

    #[test]
    fn test_receive_purchase_rejections() {
        let mut terminal = local();

        let err = receive_purchase(&mut terminal, receipt("ing_nope", 1.0, 100)).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = receive_purchase(&mut terminal, receipt("ing_leche", 0.0, 100)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = receive_purchase(&mut terminal, receipt("ing_leche", 1.0, -100)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(terminal.tax_entries().is_empty());
    }

    #[test]
    fn test_low_stock_lists_critical_first() {
        let mut terminal = local();
        for ingredient in terminal.ingredients.iter_mut() {
            match ingredient.id.as_str() {
                "ing_leche" => ingredient.stock = 5.0,
                "ing_cafe" => ingredient.stock = 0.5,
                _ => {}
            }
        }

        let ids: Vec<String> = low_stock(&terminal).into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["ing_cafe".to_string(), "ing_leche".to_string()]);
    }

    #[tokio::test]
    async fn test_purchase_is_mirrored_as_one_batch() {
        let (mut terminal, backend, mut reports) =
            mirrored_terminal(&TerminalConfig::default()).await;

        let mut request = receipt("ing_cerveza", 50.0, 11_000);
        request.concept = Some("Barril Mahou".into());
        let response = receive_purchase(&mut terminal, request).unwrap();
        let report = report_for(&mut reports, response.batch_id.unwrap()).await;

        assert!(report.is_complete());
        assert_eq!(response.entry.concept, "Barril Mahou");
        assert_eq!(
            backend.writes().await,
            vec![
                "upsert_ingredient:ing_cerveza".to_string(),
                format!("insert_tax_entry:{}", response.entry.id),
            ]
        );
    }
}
