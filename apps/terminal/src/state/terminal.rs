//! # Terminal State

use serde::Serialize;
use tracing::{debug, warn};

use gastro_core::forecast::PurchaseOrder;
use gastro_core::stock::{self, MissingReference};
use gastro_core::{
    Ingredient, MissingReferencePolicy, Product, Sale, SecurityEvent, ShiftRepository,
    StockPropagator, Supplier, TableFloor, TaxEntry, Tenant, User, WasteEntry,
};
use gastro_db::seed;
use gastro_sync::{ForecastService, OutboundWrite, OutboxHandle, TerminalConfig, WriteBatch};

use crate::error::{ApiError, ApiResult};

/// Whether writes leave the till.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    /// No store configured, or it failed at startup.
    LocalOnly,
    /// Writes are queued on the outbox.
    Mirrored,
}

/// The till.
///
/// Built with [`Terminal::local`] or [`Terminal::boot`]; mutated only through
/// the functions in [`crate::commands`].
#[derive(Debug)]
pub struct Terminal {
    pub(crate) tenant: Tenant,
    pub(crate) ingredients: Vec<Ingredient>,
    pub(crate) products: Vec<Product>,
    pub(crate) suppliers: Vec<Supplier>,
    pub(crate) users: Vec<User>,
    pub(crate) active_user: Option<User>,
    pub(crate) sales: Vec<Sale>,
    pub(crate) tax_entries: Vec<TaxEntry>,
    pub(crate) waste: Vec<WasteEntry>,
    pub(crate) security_events: Vec<SecurityEvent>,
    /// Auto orders, newest first.
    pub(crate) purchase_orders: Vec<PurchaseOrder>,
    pub(crate) shifts: ShiftRepository,
    pub(crate) floor: TableFloor,
    pub(crate) propagator: StockPropagator,
    pub(crate) alert_days: i64,
    pub(crate) sales_window: usize,
    pub(crate) outbox: Option<OutboxHandle>,
    pub(crate) forecaster: ForecastService,
}

impl Terminal {
    /// A till running on the initial dataset with nothing mirrored.
    ///
    /// The first user is signed in, as on a fresh install.
    pub fn local(config: &TerminalConfig) -> Self {
        let users = seed::users();
        Terminal {
            tenant: config.tenant(),
            ingredients: seed::ingredients(),
            products: seed::products(),
            suppliers: seed::suppliers(),
            active_user: users.first().cloned(),
            users,
            sales: Vec::new(),
            tax_entries: Vec::new(),
            waste: Vec::new(),
            security_events: Vec::new(),
            purchase_orders: Vec::new(),
            shifts: ShiftRepository::new(),
            floor: TableFloor::default_layout(),
            propagator: StockPropagator::new(config.stock_policy()),
            alert_days: config.forecast.alert_days,
            sales_window: config.forecast.sales_window,
            outbox: None,
            forecaster: ForecastService::disabled(),
        }
    }

    pub fn with_forecaster(mut self, forecaster: ForecastService) -> Self {
        self.forecaster = forecaster;
        self
    }

    // =========================================================================
    // Read Access
    // =========================================================================

    pub fn tenant(&self) -> &Tenant {
        &self.tenant
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    pub fn ingredient(&self, id: &str) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.id == id)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn suppliers(&self) -> &[Supplier] {
        &self.suppliers
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn active_user(&self) -> Option<&User> {
        self.active_user.as_ref()
    }

    pub fn sales(&self) -> &[Sale] {
        &self.sales
    }

    /// Hand-typed and purchase entries; sale income is derived on demand.
    pub fn tax_entries(&self) -> &[TaxEntry] {
        &self.tax_entries
    }

    pub fn waste(&self) -> &[WasteEntry] {
        &self.waste
    }

    pub fn security_events(&self) -> &[SecurityEvent] {
        &self.security_events
    }

    /// Generated purchase orders, newest first.
    pub fn purchase_orders(&self) -> &[PurchaseOrder] {
        &self.purchase_orders
    }

    pub fn shifts(&self) -> &ShiftRepository {
        &self.shifts
    }

    pub fn floor(&self) -> &TableFloor {
        &self.floor
    }

    pub fn stock_policy(&self) -> MissingReferencePolicy {
        self.propagator.policy()
    }

    pub fn storage_mode(&self) -> StorageMode {
        if self.outbox.is_some() {
            StorageMode::Mirrored
        } else {
            StorageMode::LocalOnly
        }
    }

    /// Outbox handle, for subscribing to delivery reports.
    pub fn outbox(&self) -> Option<&OutboxHandle> {
        self.outbox.as_ref()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            tenant_id: self.tenant.id.clone(),
            storage: self.storage_mode(),
            stock_policy: self.stock_policy(),
            ingredients: self.ingredients.len(),
            products: self.products.len(),
            users: self.users.len(),
            sales: self.sales.len(),
            tax_entries: self.tax_entries.len(),
            waste_entries: self.waste.len(),
            open_shift: self.shifts.get_open().map(|s| s.id.clone()),
            occupied_tables: self.floor.occupied_count(),
            low_stock: stock::low_stock(&self.ingredients)
                .into_iter()
                .map(|i| i.id.clone())
                .collect(),
            forecaster_configured: self.forecaster.is_configured(),
        }
    }

    // =========================================================================
    // Command Helpers
    // =========================================================================

    /// Id of the signed-in user, who owns every action.
    pub(crate) fn acting_user_id(&self) -> ApiResult<String> {
        self.active_user
            .as_ref()
            .map(|u| u.id.clone())
            .ok_or_else(|| ApiError::unauthorized("No user is signed in"))
    }

    /// Queues a batch on the outbox. Local-only tills and queue failures
    /// return `None`; the command still succeeds.
    pub(crate) fn dispatch(&self, batch: WriteBatch) -> Option<u64> {
        let outbox = self.outbox.as_ref()?;
        if batch.is_empty() {
            return None;
        }
        let label = batch.label.clone();
        match outbox.enqueue(batch) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(label = %label, error = %e, "Write not queued, change stays local");
                None
            }
        }
    }

    /// Replaces the ingredient collection after a stock run and returns the
    /// upserts for what changed.
    pub(crate) fn commit_consumption(
        &mut self,
        consumption: gastro_core::Consumption,
        origin: &str,
    ) -> Vec<OutboundWrite> {
        self.log_missing(&consumption.missing, origin);
        let writes = consumption
            .touched_ingredients()
            .cloned()
            .map(OutboundWrite::UpsertIngredient)
            .collect();
        self.ingredients = consumption.ingredients;
        writes
    }

    fn log_missing(&self, missing: &[MissingReference], origin: &str) {
        for miss in missing {
            match self.propagator.policy() {
                MissingReferencePolicy::Warn => warn!(
                    origin,
                    kind = miss.kind.as_str(),
                    id = %miss.id,
                    product_id = %miss.product_id,
                    "Stock not updated for unknown reference"
                ),
                _ => debug!(
                    origin,
                    kind = miss.kind.as_str(),
                    id = %miss.id,
                    "Skipped unknown reference"
                ),
            }
        }
    }
}

/// Startup summary printed by the binary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub tenant_id: String,
    pub storage: StorageMode,
    pub stock_policy: MissingReferencePolicy,
    pub ingredients: usize,
    pub products: usize,
    pub users: usize,
    pub sales: usize,
    pub tax_entries: usize,
    pub waste_entries: usize,
    pub open_shift: Option<String>,
    pub occupied_tables: usize,
    /// Ingredients at or below minimum, critical first.
    pub low_stock: Vec<String>,
    pub forecaster_configured: bool,
}
