//! # Seed Data Loader
//!
//! Writes the demo café (staff, suppliers, ingredients, menu) into a
//! database file.
//!
//! ## Usage
//! ```bash
//! cargo run -p gastro-db --bin seed
//!
//! # Specify database path
//! cargo run -p gastro-db --bin seed -- --db ./data/bar.db
//! ```

use std::env;

use gastro_core::validation::validate_new_product;
use gastro_db::{seed, seed_database, Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./gastro_dev.db");
    let mut force = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--force" | "-f" => force = true,
            "--help" | "-h" => {
                println!("GastroSmart Seed Data Loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./gastro_dev.db)");
                println!("  -f, --force        Overwrite the catalogue even if it is not empty");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 GastroSmart Seed Data Loader");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.ingredients().store().count().await?;
    if existing > 0 && !force {
        println!("⚠ Database already has {} ingredients", existing);
        println!("  Skipping seed so live stock levels are not reset.");
        println!("  Pass --force to overwrite.");
        return Ok(());
    }

    for product in seed::products() {
        if let Err(e) = validate_new_product(&product, true) {
            eprintln!("Invalid product {}: {}", product.id, e);
            return Err(e.into());
        }
    }

    let start = std::time::Instant::now();
    let summary = seed_database(&db).await?;

    println!();
    println!("✓ Users:       {}", summary.users);
    println!("✓ Suppliers:   {}", summary.suppliers);
    println!("✓ Ingredients: {}", summary.ingredients);
    println!("✓ Products:    {}", summary.products);
    println!("  Written in {:?}", start.elapsed());
    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
