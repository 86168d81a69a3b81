//! # Initial Dataset
//!
//! The demo café every fresh install starts from: staff, suppliers, the
//! ingredient store and a menu whose recipes reference it. The terminal
//! also runs on this dataset when no database is configured.
//!
//! Recipe quantities are per unit sold, in the ingredient's unit
//! (a spirit measure is 1/14 of a 0.7 L bottle).

use tracing::info;

use crate::error::DbResult;
use crate::pool::Database;
use gastro_core::{Ingredient, Money, Product, RecipeLine, Supplier, User, UserRole};

/// Supplier ids referenced by [`ingredients`].
pub const SUPPLIER_DRINKS: &str = "sup_bebidas";
pub const SUPPLIER_FOOD: &str = "sup_alimentacion";

pub fn users() -> Vec<User> {
    vec![
        user("u1", "Carlos (Dueño)", UserRole::Admin, "1234"),
        user("u2", "Laura", UserRole::Seller, "0000"),
        user("u3", "Marcos", UserRole::Seller, "1111"),
    ]
}

pub fn suppliers() -> Vec<Supplier> {
    vec![
        Supplier {
            id: SUPPLIER_DRINKS.to_string(),
            name: "Distribuciones Mahou".to_string(),
            contact_name: Some("Javier".to_string()),
            phone: Some("+34 600 111 222".to_string()),
            email: None,
        },
        Supplier {
            id: SUPPLIER_FOOD.to_string(),
            name: "Makro Cash & Carry".to_string(),
            contact_name: None,
            phone: None,
            email: Some("pedidos@makro.example".to_string()),
        },
    ]
}

pub fn ingredients() -> Vec<Ingredient> {
    let drinks = Some(SUPPLIER_DRINKS);
    let food = Some(SUPPLIER_FOOD);
    vec![
        // Drinks
        ingredient("ing_cerveza", "Cerveza (Barril 50L)", 50.0, "L", 15.0, 210, drinks),
        ingredient("ing_vino_tinto", "Vino Tinto (Rioja 0.75L)", 24.0, "unid", 6.0, 650, drinks),
        ingredient("ing_vino_blanco", "Vino Blanco (Rueda 0.75L)", 12.0, "unid", 4.0, 580, drinks),
        ingredient("ing_refresco_cola", "Coca-Cola (Botella 0.2L)", 120.0, "unid", 24.0, 85, drinks),
        ingredient("ing_refresco_cola_zero", "Coca-Cola Zero (Botella 0.2L)", 80.0, "unid", 24.0, 85, drinks),
        ingredient("ing_fanta_nar", "Fanta Naranja (Botella 0.2L)", 60.0, "unid", 12.0, 80, drinks),
        ingredient("ing_fanta_lim", "Fanta Limón (Botella 0.2L)", 60.0, "unid", 12.0, 80, drinks),
        ingredient("ing_sprite", "Sprite (Botella 0.2L)", 40.0, "unid", 10.0, 80, drinks),
        ingredient("ing_tonica", "Tónica Schweppes (Botella 0.2L)", 100.0, "unid", 20.0, 90, drinks),
        ingredient("ing_agua_05", "Agua Mineral (0.5L)", 200.0, "unid", 50.0, 25, drinks),
        // Spirits
        ingredient("ing_gin_beefeater", "Gin Beefeater (0.7L)", 5.0, "unid", 1.0, 1450, drinks),
        ingredient("ing_gin_tanqueray", "Gin Tanqueray (0.7L)", 4.0, "unid", 1.0, 1620, drinks),
        ingredient("ing_ron_barcelo", "Ron Barceló (0.7L)", 6.0, "unid", 1.0, 1580, drinks),
        ingredient("ing_ron_brugal", "Ron Brugal (0.7L)", 4.0, "unid", 1.0, 1580, drinks),
        ingredient("ing_whisky_jb", "Whisky J&B (0.7L)", 5.0, "unid", 1.0, 1390, drinks),
        ingredient("ing_whisky_ballantines", "Whisky Ballantine's (0.7L)", 5.0, "unid", 1.0, 1450, drinks),
        ingredient("ing_vodka_absolut", "Vodka Absolut (0.7L)", 3.0, "unid", 1.0, 1600, drinks),
        // Kitchen
        ingredient("ing_cafe", "Café Grano (1kg)", 10.0, "kg", 2.0, 1800, food),
        ingredient("ing_leche", "Leche (1L)", 40.0, "L", 6.0, 90, food),
        ingredient("ing_pan_hamb", "Pan Burger Brioche", 50.0, "unid", 10.0, 45, food),
        ingredient("ing_pan_barra", "Pan de Barra (Baguette)", 30.0, "unid", 5.0, 40, food),
        ingredient("ing_carne_hamb", "Carne Ternera (180g)", 40.0, "unid", 10.0, 180, food),
        ingredient("ing_queso_cheddar", "Queso Cheddar (Loncha)", 100.0, "unid", 20.0, 15, food),
        ingredient("ing_huevos", "Huevos (Cartón 30)", 4.0, "unid", 1.0, 480, food),
        ingredient("ing_patatas_congeladas", "Patatas Fritas (Bolsa 2.5kg)", 10.0, "unid", 2.0, 520, food),
        ingredient("ing_calamares", "Calamares Limpios (kg)", 5.0, "kg", 1.0, 1200, food),
        ingredient("ing_jamon_iberico", "Jamón Ibérico (kg)", 3.0, "kg", 0.5, 4500, food),
    ]
}

pub fn products() -> Vec<Product> {
    const SPIRIT_MEASURE: f64 = 0.071;
    vec![
        product("p_cafe_solo", "Café Solo", "Cafés", 140, &[("ing_cafe", 0.008)]),
        product("p_cafe_leche", "Café con Leche", "Cafés", 160, &[("ing_cafe", 0.008), ("ing_leche", 0.15)]),
        product("p_capuchino", "Capuchino", "Cafés", 220, &[("ing_cafe", 0.008), ("ing_leche", 0.25)]),
        product("p_cola", "Coca-Cola", "Refrescos", 250, &[("ing_refresco_cola", 1.0)]),
        product("p_cola_zero", "Coca-Cola Zero", "Refrescos", 250, &[("ing_refresco_cola_zero", 1.0)]),
        product("p_fanta_nar", "Fanta Naranja", "Refrescos", 240, &[("ing_fanta_nar", 1.0)]),
        product("p_tonica", "Tónica Schweppes", "Refrescos", 260, &[("ing_tonica", 1.0)]),
        product("p_agua_peq", "Agua Mineral 0.5L", "Refrescos", 150, &[("ing_agua_05", 1.0)]),
        product("p_cana", "Caña de Cerveza", "Cervezas", 180, &[("ing_cerveza", 0.20)]),
        product("p_doble", "Doble de Cerveza", "Cervezas", 280, &[("ing_cerveza", 0.35)]),
        product("p_jarra", "Jarra 0.5L", "Cervezas", 450, &[("ing_cerveza", 0.50)]),
        product("p_gin_beefeater", "Gin Beefeater + Refresco", Product::MIXED_DRINKS_CATEGORY, 850, &[("ing_gin_beefeater", SPIRIT_MEASURE)]),
        product("p_gin_tanqueray", "Gin Tanqueray + Refresco", Product::MIXED_DRINKS_CATEGORY, 950, &[("ing_gin_tanqueray", SPIRIT_MEASURE)]),
        product("p_ron_barcelo", "Ron Barceló + Refresco", Product::MIXED_DRINKS_CATEGORY, 850, &[("ing_ron_barcelo", SPIRIT_MEASURE)]),
        product("p_whisky_jb", "Whisky J&B + Refresco", Product::MIXED_DRINKS_CATEGORY, 800, &[("ing_whisky_jb", SPIRIT_MEASURE)]),
        product("p_whisky_ballantines", "Whisky Ballantine's + Refresco", Product::MIXED_DRINKS_CATEGORY, 850, &[("ing_whisky_ballantines", SPIRIT_MEASURE)]),
        product(
            "p_hamb_clasica",
            "Hamburguesa Clásica",
            "Comida",
            950,
            &[
                ("ing_pan_hamb", 1.0),
                ("ing_carne_hamb", 1.0),
                ("ing_queso_cheddar", 1.0),
                ("ing_patatas_congeladas", 0.1),
            ],
        ),
        product("p_boc_calamares", "Bocadillo de Calamares", "Comida", 650, &[("ing_pan_barra", 0.5), ("ing_calamares", 0.15)]),
        product("p_racion_patatas", "Ración de Patatas Bravas", "Comida", 550, &[("ing_patatas_congeladas", 0.15)]),
        product("p_racion_jamon", "Ración Jamón Ibérico", "Comida", 1800, &[("ing_jamon_iberico", 0.1)]),
    ]
}

/// Counts of what [`seed_database`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub suppliers: usize,
    pub ingredients: usize,
    pub products: usize,
}

/// Writes the initial dataset. Existing records with the same ids are
/// overwritten, so run it on an empty database.
pub async fn seed_database(db: &Database) -> DbResult<SeedSummary> {
    let users = users();
    let suppliers = suppliers();
    let ingredients = ingredients();
    let products = products();

    for user in &users {
        db.users().upsert(user).await?;
    }
    for supplier in &suppliers {
        db.suppliers().upsert(supplier).await?;
    }
    db.ingredients().upsert_all(&ingredients).await?;
    db.products().upsert_all(&products).await?;

    let summary = SeedSummary {
        users: users.len(),
        suppliers: suppliers.len(),
        ingredients: ingredients.len(),
        products: products.len(),
    };
    info!(
        users = summary.users,
        ingredients = summary.ingredients,
        products = summary.products,
        "Initial dataset written"
    );
    Ok(summary)
}

fn user(id: &str, name: &str, role: UserRole, pin: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        role,
        pin: pin.to_string(),
    }
}

fn ingredient(
    id: &str,
    name: &str,
    stock: f64,
    unit: &str,
    min_stock: f64,
    cost_cents: i64,
    supplier_id: Option<&str>,
) -> Ingredient {
    Ingredient {
        id: id.to_string(),
        name: name.to_string(),
        stock,
        unit: unit.to_string(),
        min_stock,
        cost_per_unit: Money::from_cents(cost_cents),
        supplier_id: supplier_id.map(str::to_string),
    }
}

fn product(id: &str, name: &str, category: &str, price_cents: i64, recipe: &[(&str, f64)]) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        price: Money::from_cents(price_cents),
        image_url: String::new(),
        recipe: recipe
            .iter()
            .map(|(ingredient_id, quantity)| RecipeLine::new(*ingredient_id, *quantity))
            .collect(),
    }
}
