//! # Domain Types
//!
//! Core domain types used throughout GastroSmart POS.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────┐  recipe  ┌──────────────┐  items  ┌──────────────┐   │
//! │  │  Ingredient  │◄─────────│   Product    │◄────────│     Sale     │   │
//! │  │  stock (f64) │          │  price       │         │  total       │   │
//! │  │  min_stock   │          │  recipe[]    │         │  shift_id ───┼─┐ │
//! │  └──────────────┘          └──────────────┘         └──────────────┘ │ │
//! │         ▲                         ▲                                  │ │
//! │         │ mixer                   │ product_id                       │ │
//! │         │                  ┌──────────────┐         ┌──────────────┐ │ │
//! │         └──────────────────│  SaleLine    │         │    Shift     │◄┘ │
//! │                            └──────────────┘         │  base, cash  │   │
//! │                                                     │  card, exp.  │   │
//! │  ┌──────────────┐          ┌──────────────┐         └──────────────┘   │
//! │  │   TaxEntry   │          │  WasteEntry  │                            │
//! │  │  cash-out? ──┼──────────┼──────────────┼────► Shift.total_expenses  │
//! │  └──────────────┘          └──────────────┘                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Units
//! - Every amount of money is [`Money`] (integer cents).
//! - Stock and recipe quantities are `f64` in the ingredient's own unit
//!   (litres, kilograms, units). Stock may go negative; a negative level
//!   means the physical count is overdue.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%. Spanish hospitality uses 1000 (10%) for food and
/// drink served on premises and 2100 (21%) for most supplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// IVA reducido (hostelería).
    pub const REDUCED: TaxRate = TaxRate(1000);

    /// IVA general.
    pub const GENERAL: TaxRate = TaxRate(2100);

    /// IRPF instalment rate for Modelo 130.
    pub const IRPF_INSTALMENT: TaxRate = TaxRate(2000);

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::REDUCED
    }
}

// =============================================================================
// Tenant & Users
// =============================================================================

/// The business operating the till.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    pub name: String,
    /// Spanish tax id printed on tickets.
    pub nif: Option<String>,
    pub default_vat_rate: TaxRate,
    pub irpf_rate: TaxRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Seller,
}

/// Staff member who can sign in with a PIN.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: UserRole,
    pub pin: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

// =============================================================================
// Ingredient
// =============================================================================

/// A raw material tracked in stock (a keg, a bag of coffee, a bottle of gin).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    /// Current level in `unit`. Unbounded below.
    pub stock: f64,
    /// Free-form unit label: "L", "kg", "uds".
    pub unit: String,
    pub min_stock: f64,
    pub cost_per_unit: Money,
    pub supplier_id: Option<String>,
}

impl Ingredient {
    /// Fraction of the minimum below which stock is critical.
    pub const CRITICAL_RATIO: f64 = 0.5;

    /// `stock <= min_stock`; shown as a low-stock warning.
    pub fn is_below_minimum(&self) -> bool {
        self.stock <= self.min_stock
    }

    /// `stock <= min_stock × 0.5`; shown in red.
    pub fn is_critical(&self) -> bool {
        self.stock <= self.min_stock * Self::CRITICAL_RATIO
    }

    /// Adds received goods to the stock level.
    pub fn restock(&mut self, quantity: f64) {
        self.stock += quantity;
    }
}

// =============================================================================
// Product
// =============================================================================

/// One line of a recipe: how much of an ingredient one unit sold consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RecipeLine {
    pub ingredient_id: String,
    pub quantity: f64,
}

impl RecipeLine {
    pub fn new(ingredient_id: impl Into<String>, quantity: f64) -> Self {
        Self {
            ingredient_id: ingredient_id.into(),
            quantity,
        }
    }
}

/// A sellable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    /// VAT-inclusive shelf price.
    pub price: Money,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub recipe: Vec<RecipeLine>,
}

impl Product {
    /// Category whose lines carry a mixer choice.
    pub const MIXED_DRINKS_CATEGORY: &'static str = "Combinados";

    /// Products without a recipe never touch stock.
    pub fn tracks_stock(&self) -> bool {
        !self.recipe.is_empty()
    }

    pub fn takes_mixer(&self) -> bool {
        self.category == Self::MIXED_DRINKS_CATEGORY
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Notes and coins in the drawer.
    Cash,
    /// Card on the bank's own reader.
    Card,
    /// Automatic cash recycler; the money ends up in the drawer.
    CashGuard,
    /// Integrated card terminal (datáfono).
    CardTerminal,
    /// Vouchers, invitations charged to an account, etc.
    Other,
}

/// The drawer bucket a payment is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TenderBucket {
    Cash,
    Card,
}

impl PaymentMethod {
    /// Returns which shift bucket this method feeds, if any.
    ///
    /// ```rust
    /// use gastro_core::types::{PaymentMethod, TenderBucket};
    ///
    /// assert_eq!(PaymentMethod::CashGuard.bucket(), Some(TenderBucket::Cash));
    /// assert_eq!(PaymentMethod::CardTerminal.bucket(), Some(TenderBucket::Card));
    /// assert_eq!(PaymentMethod::Other.bucket(), None);
    /// ```
    pub const fn bucket(&self) -> Option<TenderBucket> {
        match self {
            PaymentMethod::Cash | PaymentMethod::CashGuard => Some(TenderBucket::Cash),
            PaymentMethod::Card | PaymentMethod::CardTerminal => Some(TenderBucket::Card),
            PaymentMethod::Other => None,
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A ticket line. Also used for a table's running order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name: Option<String>,
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub unit_price: Money,
    /// Mixer ingredient for combinados; [`NO_MIXER`](crate::NO_MIXER) for neat.
    pub mixer_id: Option<String>,
}

impl SaleLine {
    /// Builds a line from the current catalogue entry.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        Self {
            product_id: product.id.clone(),
            name: Some(product.name.clone()),
            quantity,
            unit_price: product.price,
            mixer_id: None,
        }
    }

    pub fn with_mixer(mut self, mixer_id: impl Into<String>) -> Self {
        self.mixer_id = Some(mixer_id.into());
        self
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// Running order on a table.
pub type OrderLine = SaleLine;

/// A completed ticket. Created once at checkout and never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub items: Vec<SaleLine>,
    pub total: Money,
    pub amount_paid: Option<Money>,
    pub change: Option<Money>,
    pub payment_method: PaymentMethod,
    pub seller_id: String,
    pub table_id: Option<String>,
    pub tenant_id: String,
    pub shift_id: Option<String>,
}

impl Sale {
    /// Sum of the line totals.
    pub fn items_total(items: &[SaleLine]) -> Money {
        items.iter().map(SaleLine::line_total).sum()
    }

    /// Change handed back for a cash payment; never negative.
    pub fn change_due(total: Money, amount_paid: Money) -> Money {
        (amount_paid - total).clamp_non_negative()
    }
}

// =============================================================================
// Shift
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Open,
    Closed,
}

impl ShiftStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ShiftStatus::Open => "open",
            ShiftStatus::Closed => "closed",
        }
    }
}

/// A cash-drawer session.
///
/// ## Lifecycle
/// ```text
/// open_shift(base) ──► Open ──(sales, cash-outs)──► close(counted) ──► Closed
///                       │                                               │
///                       └── totals mutate                immutable ─────┘
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: String,
    #[ts(as = "String")]
    pub start_time: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub end_time: Option<DateTime<Utc>>,
    /// Float counted into the drawer at open.
    pub initial_base: Money,
    pub total_sales: Money,
    pub total_card: Money,
    pub total_cash_sales: Money,
    /// Cash taken out of the drawer to pay expenses.
    pub total_expenses: Money,
    /// Cash counted at close.
    pub final_cash: Option<Money>,
    pub expected_cash: Option<Money>,
    pub status: ShiftStatus,
    pub user_id: String,
    #[serde(default)]
    pub discrepancy_events: Vec<SecurityEvent>,
}

impl Shift {
    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }

    /// `initial_base + total_cash_sales − total_expenses`.
    pub fn cash_in_drawer(&self) -> Money {
        self.initial_base + self.total_cash_sales - self.total_expenses
    }

    /// `final_cash − expected_cash`; `None` until the shift is closed.
    pub fn discrepancy(&self) -> Option<Money> {
        Some(self.final_cash? - self.expected_cash?)
    }
}

// =============================================================================
// Security Events
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventKind {
    /// Camera-counted amount disagrees with what the till charged.
    Mismatch,
    /// Camera saw cash handled without a matching ticket.
    Detection,
}

/// A cash-handling observation from the counter camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEvent {
    pub id: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub camera_value: Money,
    pub app_paid_value: Option<Money>,
    pub kind: SecurityEventKind,
    pub snapshot_url: Option<String>,
    pub video_ref: String,
}

// =============================================================================
// Tax Entries
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TaxEntryKind {
    Income,
    Expense,
}

/// A bookkeeping line for the quarterly tax forms.
///
/// Constructors live in [`crate::tax`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxEntry {
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub kind: TaxEntryKind,
    pub concept: String,
    pub base: Money,
    pub tax_rate: TaxRate,
    pub total: Money,
    /// Typed in by hand rather than derived from a sale or purchase.
    pub manual: bool,
    /// Paid out of the open shift's drawer.
    #[serde(default)]
    pub is_cash_out: bool,
    pub attachment_url: Option<String>,
}

impl TaxEntry {
    /// VAT amount (`total − base`).
    pub fn tax_amount(&self) -> Money {
        self.total - self.base
    }
}

// =============================================================================
// Waste
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum WasteReason {
    /// Rotura.
    Breakage,
    /// Invitación.
    Complimentary,
    /// Consumo personal.
    StaffConsumption,
}

/// Product that left stock without revenue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct WasteEntry {
    pub id: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub product_id: String,
    pub quantity: f64,
    pub reason: WasteReason,
    pub user_id: String,
    pub note: Option<String>,
}

// =============================================================================
// Tables
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TableZone {
    Indoor,
    Terrace,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Free,
    Occupied,
    /// Bill requested, waiting for payment.
    AwaitingPayment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: String,
    /// Label painted on the table: "4", "T2", "B1".
    pub number: String,
    /// Customer name or nickname for the running tab.
    pub temp_name: Option<String>,
    pub zone: TableZone,
    pub status: TableStatus,
    #[serde(default)]
    pub current_order: Vec<OrderLine>,
    #[ts(as = "Option<String>")]
    pub last_activity: Option<DateTime<Utc>>,
}

impl Table {
    pub fn new(id: impl Into<String>, number: impl Into<String>, zone: TableZone) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            temp_name: None,
            zone,
            status: TableStatus::Free,
            current_order: Vec::new(),
            last_activity: None,
        }
    }

    pub fn is_free(&self) -> bool {
        self.status == TableStatus::Free
    }

    pub fn order_total(&self) -> Money {
        Sale::items_total(&self.current_order)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TableAction {
    Move,
    Rename,
    Open,
    Save,
}

/// One entry of the floor's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TableLog {
    pub id: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub action: TableAction,
    pub details: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
