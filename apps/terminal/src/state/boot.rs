//! # Startup
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Terminal::boot                                    │
//! │                                                                         │
//! │  mirror? ── None ─────────────────────────────► local-only (seeded)     │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  load every collection at once                                          │
//! │     │                                                                   │
//! │     ├── any load fails ───────────────────────► local-only (seeded)     │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  empty ingredients / products / users ─► initial dataset for that one   │
//! │  open shift in the store ──────────────► restored into the drawer       │
//! │  outbox handle kept ───────────────────► mirrored                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Startup never fails. The store is not retried once it has failed.

use std::sync::Arc;

use tracing::{info, warn};

use gastro_core::{Ingredient, Product, Sale, Shift, TaxEntry, User, WasteEntry};
use gastro_sync::{OutboxHandle, PersistenceBackend, SyncResult, TerminalConfig};

use super::terminal::Terminal;

/// The store the till mirrors to, and the queue that writes to it.
#[derive(Clone)]
pub struct Mirror {
    pub backend: Arc<dyn PersistenceBackend>,
    pub outbox: OutboxHandle,
}

impl std::fmt::Debug for Mirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mirror")
            .field("outbox", &self.outbox)
            .finish_non_exhaustive()
    }
}

struct Snapshot {
    ingredients: Vec<Ingredient>,
    products: Vec<Product>,
    sales: Vec<Sale>,
    tax_entries: Vec<TaxEntry>,
    waste: Vec<WasteEntry>,
    users: Vec<User>,
    active_shift: Option<Shift>,
}

async fn load_snapshot(backend: &dyn PersistenceBackend) -> SyncResult<Snapshot> {
    let (ingredients, products, sales, tax_entries, waste, users, active_shift) = tokio::try_join!(
        backend.load_ingredients(),
        backend.load_products(),
        backend.load_sales(),
        backend.load_tax_entries(),
        backend.load_waste(),
        backend.load_users(),
        backend.load_active_shift(),
    )?;

    Ok(Snapshot {
        ingredients,
        products,
        sales,
        tax_entries,
        waste,
        users,
        active_shift,
    })
}

impl Terminal {
    /// Builds the till from the store when there is one.
    pub async fn boot(config: &TerminalConfig, mirror: Option<Mirror>) -> Self {
        let mut terminal = Terminal::local(config);

        let Some(mirror) = mirror else {
            info!(tenant_id = %terminal.tenant.id, "No store configured, running local-only");
            return terminal;
        };

        let snapshot = match load_snapshot(mirror.backend.as_ref()).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Store unavailable at startup, running local-only");
                return terminal;
            }
        };

        if snapshot.ingredients.is_empty() {
            info!("Store has no ingredients, using the initial dataset");
        } else {
            terminal.ingredients = snapshot.ingredients;
        }
        if snapshot.products.is_empty() {
            info!("Store has no products, using the initial dataset");
        } else {
            terminal.products = snapshot.products;
        }
        if !snapshot.users.is_empty() {
            terminal.users = snapshot.users;
        }
        terminal.active_user = terminal.users.first().cloned();
        terminal.sales = snapshot.sales;
        terminal.tax_entries = snapshot.tax_entries;
        terminal.waste = snapshot.waste;

        if let Some(shift) = snapshot.active_shift {
            let shift_id = shift.id.clone();
            match terminal.shifts.restore(shift) {
                Ok(()) => info!(shift_id = %shift_id, "Open shift restored"),
                Err(e) => warn!(shift_id = %shift_id, error = %e, "Ignoring stored shift"),
            }
        }

        terminal.outbox = Some(mirror.outbox);

        info!(
            tenant_id = %terminal.tenant.id,
            ingredients = terminal.ingredients.len(),
            products = terminal.products.len(),
            sales = terminal.sales.len(),
            "Terminal state loaded from store"
        );
        terminal
    }
}
