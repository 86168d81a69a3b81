//! # GastroSmart Terminal Entry Point
//!
//! Boots the till the way the screens would and reports what it found.
//!
//! ## Usage
//! ```bash
//! cargo run -p gastro-terminal
//!
//! # Explicit config file, JSON report on stdout
//! cargo run -p gastro-terminal -- --config ./terminal.toml --json
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load `terminal.toml`, then `GASTRO_*` environment overrides
//! 3. Open the record store when one is configured
//! 4. Start the outbox against it
//! 5. Hydrate the till (or fall back to the demo café)
//! 6. Report, then drain the outbox

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use gastro_db::{Database, DbConfig};
use gastro_sync::{Outbox, TerminalConfig};
use gastro_terminal::{init_tracing, Mirror, Terminal};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;
    let mut json = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--json" => json = true,
            "--help" | "-h" => {
                println!("GastroSmart Terminal");
                println!();
                println!("Usage: gastro-terminal [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("      --json           Print the startup report as JSON");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!("Starting GastroSmart terminal");
    let config = TerminalConfig::load_or_default(config_path);

    let mut task = None;
    let mirror = match config.database_path() {
        Some(path) => match Database::new(DbConfig::new(path)).await {
            Ok(db) => {
                let db = Arc::new(db);
                let (outbox, handle) = Outbox::start(db.clone(), config.outbox.capacity);
                task = Some(handle);
                Some(Mirror {
                    backend: db,
                    outbox,
                })
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Record store unavailable, running local only");
                None
            }
        },
        None => None,
    };

    let terminal = Terminal::boot(&config, mirror).await;
    let report = terminal.diagnostics();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        info!(
            tenant_id = %report.tenant_id,
            storage = ?report.storage,
            ingredients = report.ingredients,
            products = report.products,
            "Terminal ready"
        );
    }

    match (terminal.outbox(), task) {
        (Some(outbox), Some(task)) => {
            outbox.shutdown().await?;
            task.await?;
        }
        // Hydration failed and the till dropped its mirror.
        (None, Some(task)) => task.abort(),
        _ => {}
    }

    Ok(())
}
