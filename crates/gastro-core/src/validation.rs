//! # Validation Module
//!
//! Input checks run by terminal commands before they touch state.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Frontend       - empty fields, numeric keypad limits          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Command        - THIS MODULE: catalogue and checkout rules    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Record store   - PRIMARY KEY, insert-only collections         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The data model itself accepts a product with an empty recipe; the rule
//! that stock-tracked products need one is a creation-time check only.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Ingredient, PaymentMethod, Product, SaleLine, TenderBucket};
use crate::MAX_LINE_QUANTITY;

pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Catalogue
// =============================================================================

/// Names are required and at most 120 characters.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if name.chars().count() > 120 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 120,
        });
    }
    Ok(())
}

pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }
    Ok(())
}

/// Checks a product about to be created.
///
/// ## Rules
/// - name and category are required
/// - price is not negative
/// - every recipe quantity is positive, and no ingredient appears twice
/// - when `track_stock` is set, the recipe is not empty
///
/// ## Example
/// ```rust
/// use gastro_core::types::{Product, RecipeLine};
/// use gastro_core::validation::validate_new_product;
/// use gastro_core::Money;
///
/// let mut cana = Product {
///     id: "p_cana".into(), name: "Caña".into(), category: "Cervezas".into(),
///     price: Money::from_cents(150), image_url: String::new(), recipe: vec![],
/// };
/// assert!(validate_new_product(&cana, true).is_err());
///
/// cana.recipe.push(RecipeLine::new("ing_cerveza", 0.20));
/// assert!(validate_new_product(&cana, true).is_ok());
/// ```
pub fn validate_new_product(product: &Product, track_stock: bool) -> ValidationResult<()> {
    validate_name("name", &product.name)?;
    validate_name("category", &product.category)?;
    validate_price(product.price)?;

    if track_stock && product.recipe.is_empty() {
        return Err(ValidationError::Required {
            field: "recipe".to_string(),
        });
    }
    validate_recipe(product)
}

/// Recipe quantities must be positive and ingredients unique.
pub fn validate_recipe(product: &Product) -> ValidationResult<()> {
    for (idx, line) in product.recipe.iter().enumerate() {
        if !(line.quantity > 0.0) || !line.quantity.is_finite() {
            return Err(ValidationError::MustBePositive {
                field: format!("recipe[{idx}].quantity"),
            });
        }
        if product.recipe[..idx]
            .iter()
            .any(|l| l.ingredient_id == line.ingredient_id)
        {
            return Err(ValidationError::Duplicate {
                field: "recipe ingredient".to_string(),
                value: line.ingredient_id.clone(),
            });
        }
    }
    Ok(())
}

pub fn validate_ingredient(ingredient: &Ingredient) -> ValidationResult<()> {
    validate_name("name", &ingredient.name)?;
    validate_name("unit", &ingredient.unit)?;
    for (field, value) in [("stock", ingredient.stock), ("min_stock", ingredient.min_stock)] {
        if !value.is_finite() {
            return Err(ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "must be a finite number".to_string(),
            });
        }
    }
    if ingredient.min_stock < 0.0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "min_stock".to_string(),
        });
    }
    if ingredient.cost_per_unit.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "cost_per_unit".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Quantities
// =============================================================================

/// A ticket line holds between 1 and [`MAX_LINE_QUANTITY`] units.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

/// Waste and goods-receipt quantities are fractional but positive.
pub fn validate_stock_quantity(field: &str, qty: f64) -> ValidationResult<()> {
    if !(qty > 0.0) || !qty.is_finite() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Checkout
// =============================================================================

/// Checks a ticket before it is stamped.
pub fn validate_lines(lines: &[SaleLine]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }
    for line in lines {
        validate_quantity(line.quantity)?;
        validate_price(line.unit_price)?;
    }
    Ok(())
}

/// Cash-drawer tenders must cover the total when an amount is given.
pub fn validate_payment(
    total: Money,
    method: PaymentMethod,
    amount_paid: Option<Money>,
) -> CoreResult<()> {
    let Some(paid) = amount_paid else {
        return Ok(());
    };
    if paid.is_negative() {
        return Err(CoreError::InvalidPaymentAmount {
            reason: "amount paid is negative".to_string(),
        });
    }
    if method.bucket() == Some(TenderBucket::Cash) && paid < total {
        return Err(CoreError::InvalidPaymentAmount {
            reason: format!("{paid} does not cover {total}"),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
