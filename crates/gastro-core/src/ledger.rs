//! # Shift Ledger
//!
//! Owns the cash drawer: at most one open shift, its running totals, and
//! the reconciliation performed when the drawer is counted at close.
//!
//! ## Shift Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ShiftRepository                                 │
//! │                                                                         │
//! │   open slot: Option<Shift>            history: Vec<Shift> (closed)      │
//! │                                                                         │
//! │   open_shift(base) ───► slot = Some(Open, totals 0)                     │
//! │                          │                                              │
//! │   record_sale(sale) ─────┤ total_sales += total                         │
//! │                          │ cash bucket  (Cash, CashGuard)               │
//! │                          │ card bucket  (Card, CardTerminal)            │
//! │                          │ Other → total_sales only                     │
//! │                          │                                              │
//! │   record_cash_out(exp) ──┤ total_expenses += total  (is_cash_out only)  │
//! │                          │                                              │
//! │   close(id, counted) ────┴► expected = base + cash − expenses           │
//! │                             discrepancy = counted − expected            │
//! │                             slot = None, history.push(closed)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The repository never reads the clock; callers pass `now`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{
    Sale, SecurityEvent, SecurityEventKind, Shift, ShiftStatus, TaxEntry, TenderBucket,
};
use crate::DISCREPANCY_TOLERANCE;

/// Camera readings this close to the discrepancy are attached to the close.
pub const CAMERA_MATCH_WINDOW: Money = Money::from_cents(500);

// =============================================================================
// Shift Closure
// =============================================================================

/// Result of counting the drawer.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftClosure {
    /// The closed shift, as appended to history.
    pub shift: Shift,
    pub expected_cash: Money,
    /// `counted − expected`. Positive means surplus.
    pub discrepancy: Money,
}

impl ShiftClosure {
    /// Differences above one cent need an explicit confirmation at the till.
    pub fn needs_confirmation(&self) -> bool {
        self.discrepancy.abs() > DISCREPANCY_TOLERANCE
    }

    pub fn is_balanced(&self) -> bool {
        self.discrepancy.is_zero()
    }
}

// =============================================================================
// Shift Repository
// =============================================================================

/// Single owner of the open shift slot.
#[derive(Debug, Clone, Default)]
pub struct ShiftRepository {
    open: Option<Shift>,
    history: Vec<Shift>,
}

impl ShiftRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a drawer with `initial_base` in it.
    ///
    /// ## Errors
    /// - [`CoreError::ShiftAlreadyOpen`] when a shift is already open
    /// - [`ValidationError::MustNotBeNegative`] for a negative float
    ///
    /// ## Example
    /// ```rust
    /// use chrono::Utc;
    /// use gastro_core::{Money, ShiftRepository};
    ///
    /// let mut shifts = ShiftRepository::new();
    /// let shift = shifts.open_shift(Money::from_cents(15_000), "u1", Utc::now()).unwrap();
    /// assert!(shift.is_open());
    /// assert!(shifts.open_shift(Money::zero(), "u2", Utc::now()).is_err());
    /// ```
    pub fn open_shift(
        &mut self,
        initial_base: Money,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Shift> {
        if let Some(open) = &self.open {
            return Err(CoreError::ShiftAlreadyOpen {
                shift_id: open.id.clone(),
            });
        }
        if initial_base.is_negative() {
            return Err(ValidationError::MustNotBeNegative {
                field: "initial_base".to_string(),
            }
            .into());
        }

        let shift = Shift {
            id: shift_id(now),
            start_time: now,
            end_time: None,
            initial_base,
            total_sales: Money::zero(),
            total_card: Money::zero(),
            total_cash_sales: Money::zero(),
            total_expenses: Money::zero(),
            final_cash: None,
            expected_cash: None,
            status: ShiftStatus::Open,
            user_id: user_id.to_string(),
            discrepancy_events: Vec::new(),
        };
        self.open = Some(shift.clone());
        Ok(shift)
    }

    pub fn get_open(&self) -> Option<&Shift> {
        self.open.as_ref()
    }

    /// Closed shifts, oldest first.
    pub fn history(&self) -> &[Shift] {
        &self.history
    }

    /// Cash that should be in the drawer right now.
    pub fn live_expected_cash(&self) -> Option<Money> {
        self.open.as_ref().map(Shift::cash_in_drawer)
    }

    /// Adds a sale to the open shift's totals.
    ///
    /// Returns the updated shift for persistence, or `None` when no shift is
    /// open (the sale then belongs to no drawer).
    pub fn record_sale(&mut self, sale: &Sale) -> Option<Shift> {
        let shift = self.open.as_mut()?;
        shift.total_sales += sale.total;
        match sale.payment_method.bucket() {
            Some(TenderBucket::Cash) => shift.total_cash_sales += sale.total,
            Some(TenderBucket::Card) => shift.total_card += sale.total,
            None => {}
        }
        Some(shift.clone())
    }

    /// Adds a cash-out expense to the open shift.
    ///
    /// Expenses not paid from the drawer, or arriving with no open shift,
    /// leave the ledger untouched and return `None`.
    pub fn record_cash_out(&mut self, expense: &TaxEntry) -> Option<Shift> {
        if !expense.is_cash_out {
            return None;
        }
        let shift = self.open.as_mut()?;
        shift.total_expenses += expense.total;
        Some(shift.clone())
    }

    /// Counts the drawer and closes the open shift.
    ///
    /// `security_events` is the camera feed for the day; the relevant ones
    /// (see [`relevant_security_events`]) are kept on the closed shift.
    ///
    /// ## Errors
    /// - [`CoreError::NoOpenShift`] when nothing is open
    /// - [`CoreError::ShiftNotOpen`] when `shift_id` is not the open shift
    pub fn close(
        &mut self,
        shift_id: &str,
        counted_cash: Money,
        security_events: &[SecurityEvent],
        now: DateTime<Utc>,
    ) -> CoreResult<ShiftClosure> {
        let open = self.open.as_ref().ok_or(CoreError::NoOpenShift)?;
        if open.id != shift_id {
            return Err(CoreError::ShiftNotOpen {
                requested: shift_id.to_string(),
                open: open.id.clone(),
            });
        }
        if counted_cash.is_negative() {
            return Err(ValidationError::MustNotBeNegative {
                field: "counted_cash".to_string(),
            }
            .into());
        }

        let mut shift = self.open.take().ok_or(CoreError::NoOpenShift)?;
        let expected_cash = shift.cash_in_drawer();
        let discrepancy = counted_cash - expected_cash;

        shift.discrepancy_events = relevant_security_events(&shift, discrepancy, security_events);
        shift.status = ShiftStatus::Closed;
        shift.end_time = Some(now);
        shift.final_cash = Some(counted_cash);
        shift.expected_cash = Some(expected_cash);

        self.history.push(shift.clone());

        Ok(ShiftClosure {
            shift,
            expected_cash,
            discrepancy,
        })
    }

    /// Puts a shift loaded from storage back into the open slot.
    ///
    /// ## Errors
    /// [`CoreError::InvalidShiftRecord`] for a closed record, or when another
    /// shift already holds the slot.
    pub fn restore(&mut self, shift: Shift) -> CoreResult<()> {
        if shift.status != ShiftStatus::Open {
            return Err(CoreError::InvalidShiftRecord {
                shift_id: shift.id,
                reason: "record is closed".to_string(),
            });
        }
        if let Some(open) = &self.open {
            if open.id != shift.id {
                return Err(CoreError::InvalidShiftRecord {
                    shift_id: shift.id,
                    reason: format!("shift {} is already open", open.id),
                });
            }
        }
        self.open = Some(shift);
        Ok(())
    }
}

// =============================================================================
// Security Event Matching
// =============================================================================

/// Camera events worth showing next to a discrepancy.
///
/// An event is relevant when it happened during the shift and either flags
/// a mismatch or saw an amount within [`CAMERA_MATCH_WINDOW`] of the missing
/// (or surplus) cash. A balanced drawer has no relevant events.
pub fn relevant_security_events(
    shift: &Shift,
    discrepancy: Money,
    events: &[SecurityEvent],
) -> Vec<SecurityEvent> {
    if discrepancy.abs() < DISCREPANCY_TOLERANCE {
        return Vec::new();
    }
    let target = discrepancy.abs();
    events
        .iter()
        .filter(|event| event.timestamp >= shift.start_time)
        .filter(|event| {
            event.kind == SecurityEventKind::Mismatch
                || (event.camera_value - target).abs() <= CAMERA_MATCH_WINDOW
        })
        .cloned()
        .collect()
}

/// `s-<millis>-<random>`, so a close and a reopen in the same millisecond
/// still get distinct records.
fn shift_id(now: DateTime<Utc>) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("s-{}-{}", now.timestamp_millis(), &random[..6])
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentMethod, TaxEntryKind, TaxRate};
    use chrono::{Duration, NaiveDate, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 14, hour, 0, 0).unwrap()
    }

    fn sale(cents: i64, method: PaymentMethod) -> Sale {
        Sale {
            id: format!("sale-{cents}"),
            timestamp: at(10),
            items: Vec::new(),
            total: Money::from_cents(cents),
            amount_paid: None,
            change: None,
            payment_method: method,
            seller_id: "u1".into(),
            table_id: None,
            tenant_id: "t1".into(),
            shift_id: None,
        }
    }

    fn expense(cents: i64, cash_out: bool) -> TaxEntry {
        TaxEntry {
            id: "exp-1".into(),
            date: NaiveDate::from_ymd_opt(2024, 6, 14).unwrap(),
            kind: TaxEntryKind::Expense,
            concept: "Hielo".into(),
            base: Money::from_cents(cents).net_of_tax(TaxRate::GENERAL),
            tax_rate: TaxRate::GENERAL,
            total: Money::from_cents(cents),
            manual: true,
            is_cash_out: cash_out,
            attachment_url: None,
        }
    }

    fn camera(id: &str, when: DateTime<Utc>, cents: i64, kind: SecurityEventKind) -> SecurityEvent {
        SecurityEvent {
            id: id.into(),
            timestamp: when,
            camera_value: Money::from_cents(cents),
            app_paid_value: None,
            kind,
            snapshot_url: None,
            video_ref: format!("cam1/{id}"),
        }
    }

    #[test]
    fn test_open_shift_starts_at_zero() {
        let mut repo = ShiftRepository::new();
        let shift = repo.open_shift(Money::from_cents(15_000), "u1", at(8)).unwrap();

        assert_eq!(shift.status, ShiftStatus::Open);
        assert_eq!(shift.total_sales, Money::zero());
        assert_eq!(shift.total_cash_sales, Money::zero());
        assert_eq!(shift.total_card, Money::zero());
        assert_eq!(shift.total_expenses, Money::zero());
        assert_eq!(shift.start_time, at(8));
        assert!(shift.id.starts_with("s-"));
    }

    #[test]
    fn test_reopen_at_the_same_instant_gets_a_new_id() {
        let mut repo = ShiftRepository::new();
        let first = repo.open_shift(Money::zero(), "u1", at(8)).unwrap();
        repo.close(&first.id, Money::zero(), &[], at(8)).unwrap();
        let second = repo.open_shift(Money::zero(), "u1", at(8)).unwrap();

        assert_ne!(first.id, second.id);
        assert!(second.id.starts_with(&format!("s-{}-", at(8).timestamp_millis())));
    }

    #[test]
    fn test_second_open_is_rejected() {
        let mut repo = ShiftRepository::new();
        repo.open_shift(Money::from_cents(15_000), "u1", at(8)).unwrap();
        let err = repo.open_shift(Money::from_cents(5_000), "u2", at(9)).unwrap_err();
        assert!(matches!(err, CoreError::ShiftAlreadyOpen { .. }));
        assert_eq!(repo.get_open().unwrap().user_id, "u1");
    }

    #[test]
    fn test_negative_base_is_rejected() {
        let mut repo = ShiftRepository::new();
        assert!(repo.open_shift(Money::from_cents(-1), "u1", at(8)).is_err());
        assert!(repo.get_open().is_none());
    }

    #[test]
    fn test_sale_buckets() {
        let mut repo = ShiftRepository::new();
        repo.open_shift(Money::zero(), "u1", at(8)).unwrap();

        repo.record_sale(&sale(300, PaymentMethod::Cash));
        repo.record_sale(&sale(200, PaymentMethod::CashGuard));
        repo.record_sale(&sale(450, PaymentMethod::Card));
        repo.record_sale(&sale(550, PaymentMethod::CardTerminal));
        let shift = repo.record_sale(&sale(100, PaymentMethod::Other)).unwrap();

        assert_eq!(shift.total_cash_sales.cents(), 500);
        assert_eq!(shift.total_card.cents(), 1000);
        assert_eq!(shift.total_sales.cents(), 1600);
    }

    #[test]
    fn test_tracked_methods_cover_the_whole_total() {
        let mut repo = ShiftRepository::new();
        repo.open_shift(Money::zero(), "u1", at(8)).unwrap();
        let methods = [
            PaymentMethod::Cash,
            PaymentMethod::Card,
            PaymentMethod::CashGuard,
            PaymentMethod::CardTerminal,
            PaymentMethod::Cash,
        ];
        for (i, method) in methods.into_iter().enumerate() {
            let shift = repo.record_sale(&sale(250 + i as i64, method)).unwrap();
            assert_eq!(shift.total_cash_sales + shift.total_card, shift.total_sales);
        }
        let shift = repo.get_open().unwrap();
        assert_eq!(shift.total_sales.cents(), 1260);
    }

    #[test]
    fn test_cash_plus_card_never_exceeds_total() {
        let mut repo = ShiftRepository::new();
        repo.open_shift(Money::zero(), "u1", at(8)).unwrap();
        let methods = [
            PaymentMethod::Cash,
            PaymentMethod::Other,
            PaymentMethod::CardTerminal,
            PaymentMethod::Other,
            PaymentMethod::CashGuard,
        ];
        for (i, method) in methods.into_iter().enumerate() {
            let shift = repo.record_sale(&sale(100 + i as i64, method)).unwrap();
            assert!(shift.total_cash_sales + shift.total_card <= shift.total_sales);
        }
    }

    #[test]
    fn test_sale_without_shift_is_noop() {
        let mut repo = ShiftRepository::new();
        assert!(repo.record_sale(&sale(300, PaymentMethod::Cash)).is_none());
        assert!(repo.get_open().is_none());
        assert!(repo.history().is_empty());
    }

    #[test]
    fn test_only_cash_out_expenses_hit_the_drawer() {
        let mut repo = ShiftRepository::new();
        repo.open_shift(Money::from_cents(10_000), "u1", at(8)).unwrap();

        assert!(repo.record_cash_out(&expense(1_500, false)).is_none());
        let shift = repo.record_cash_out(&expense(400, true)).unwrap();
        assert_eq!(shift.total_expenses.cents(), 400);
        assert_eq!(repo.live_expected_cash(), Some(Money::from_cents(9_600)));
    }

    #[test]
    fn test_cash_out_without_shift_is_noop() {
        let mut repo = ShiftRepository::new();
        assert!(repo.record_cash_out(&expense(400, true)).is_none());
    }

    #[test]
    fn test_close_computes_discrepancy() {
        // base 100,00, cash sales 50,00, cash-out 20,00, counted 128,50
        let mut repo = ShiftRepository::new();
        let shift = repo.open_shift(Money::from_cents(10_000), "u1", at(8)).unwrap();
        repo.record_sale(&sale(5_000, PaymentMethod::Cash));
        repo.record_cash_out(&expense(2_000, true));

        let closure = repo
            .close(&shift.id, Money::from_cents(12_850), &[], at(16))
            .unwrap();

        assert_eq!(closure.expected_cash.cents(), 13_000);
        assert_eq!(closure.discrepancy.cents(), -150);
        assert!(closure.needs_confirmation());
        assert_eq!(closure.shift.status, ShiftStatus::Closed);
        assert_eq!(closure.shift.end_time, Some(at(16)));
        assert_eq!(closure.shift.final_cash, Some(Money::from_cents(12_850)));
        assert_eq!(closure.shift.discrepancy(), Some(Money::from_cents(-150)));
        assert!(repo.get_open().is_none());
        assert_eq!(repo.history().len(), 1);
    }

    #[test]
    fn test_close_without_open_shift() {
        let mut repo = ShiftRepository::new();
        let err = repo.close("s-1", Money::zero(), &[], at(16)).unwrap_err();
        assert!(matches!(err, CoreError::NoOpenShift));
    }

    #[test]
    fn test_close_wrong_shift_keeps_slot() {
        let mut repo = ShiftRepository::new();
        repo.open_shift(Money::zero(), "u1", at(8)).unwrap();
        let err = repo.close("s-other", Money::zero(), &[], at(16)).unwrap_err();
        assert!(matches!(err, CoreError::ShiftNotOpen { .. }));
        assert!(repo.get_open().is_some());
    }

    #[test]
    fn test_balanced_close() {
        let mut repo = ShiftRepository::new();
        let shift = repo.open_shift(Money::from_cents(15_000), "u1", at(8)).unwrap();
        repo.record_sale(&sale(360, PaymentMethod::Cash));
        let closure = repo
            .close(&shift.id, Money::from_cents(15_360), &[], at(16))
            .unwrap();
        assert!(closure.is_balanced());
        assert!(!closure.needs_confirmation());
    }

    #[test]
    fn test_close_attaches_relevant_events() {
        let mut repo = ShiftRepository::new();
        let shift = repo.open_shift(Money::from_cents(10_000), "u1", at(8)).unwrap();
        let events = vec![
            // before the shift started
            camera("e0", at(7), 1_000, SecurityEventKind::Mismatch),
            // always relevant during the shift
            camera("e1", at(9), 9_900, SecurityEventKind::Mismatch),
            // 12,00 € seen, 10,00 € missing: inside the 5 € window
            camera("e2", at(10), 1_200, SecurityEventKind::Detection),
            // 20,00 € seen: outside the window
            camera("e3", at(11), 2_000, SecurityEventKind::Detection),
        ];

        let closure = repo
            .close(&shift.id, Money::from_cents(9_000), &events, at(16))
            .unwrap();

        let ids: Vec<_> = closure
            .shift
            .discrepancy_events
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["e1", "e2"]);
    }

    #[test]
    fn test_balanced_drawer_ignores_camera() {
        let shift = ShiftRepository::new()
            .open_shift(Money::zero(), "u1", at(8))
            .unwrap();
        let events = vec![camera("e1", at(9), 100, SecurityEventKind::Mismatch)];
        assert!(relevant_security_events(&shift, Money::zero(), &events).is_empty());
    }

    #[test]
    fn test_restore_open_shift() {
        let mut source = ShiftRepository::new();
        let shift = source.open_shift(Money::from_cents(5_000), "u1", at(8)).unwrap();

        let mut repo = ShiftRepository::new();
        repo.restore(shift.clone()).unwrap();
        assert_eq!(repo.get_open().map(|s| s.id.as_str()), Some(shift.id.as_str()));
    }

    #[test]
    fn test_restore_rejects_closed_record() {
        let mut repo = ShiftRepository::new();
        let shift = repo.open_shift(Money::zero(), "u1", at(8)).unwrap();
        let closed = repo.close(&shift.id, Money::zero(), &[], at(9)).unwrap().shift;

        let mut fresh = ShiftRepository::new();
        assert!(fresh.restore(closed).is_err());
    }

    #[test]
    fn test_restore_rejects_second_open() {
        let mut repo = ShiftRepository::new();
        repo.open_shift(Money::zero(), "u1", at(8)).unwrap();

        let mut other = ShiftRepository::new();
        let foreign = other
            .open_shift(Money::zero(), "u2", at(8) + Duration::minutes(5))
            .unwrap();
        assert!(repo.restore(foreign).is_err());
    }
}
