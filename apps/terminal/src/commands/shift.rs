//! # Shift Commands
//!
//! ```text
//! open_shift(base) ──► drawer open ──► sales / cash-outs accumulate
//!                                            │
//!                      count the drawer ◄────┘
//!                            │
//!          |counted − expected| > 0.01 € and not confirmed?
//!                 │ yes                      │ no
//!                 ▼                          ▼
//!        ask for confirmation          close_shift ──► history
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use gastro_core::{CoreError, Money, SecurityEvent, Shift, DISCREPANCY_TOLERANCE};
use gastro_sync::{OutboundWrite, WriteBatch};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::Terminal;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenShiftRequest {
    pub initial_base: Money,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseShiftRequest {
    pub shift_id: String,
    pub counted_cash: Money,
    /// Must be set to close a drawer that does not balance.
    #[serde(default)]
    pub confirm_discrepancy: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftResponse {
    pub shift: Shift,
    pub batch_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseShiftResponse {
    pub shift: Shift,
    pub expected_cash: Money,
    pub discrepancy: Money,
    pub batch_id: Option<u64>,
}

/// What the dashboard shows about the drawer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftStatus {
    pub open: Option<Shift>,
    pub expected_cash: Option<Money>,
    pub closed_shifts: usize,
}

pub fn open_shift(terminal: &mut Terminal, request: OpenShiftRequest) -> ApiResult<ShiftResponse> {
    let user_id = terminal.acting_user_id()?;
    let shift = terminal
        .shifts
        .open_shift(request.initial_base, &user_id, Utc::now())?;

    info!(
        shift_id = %shift.id,
        user_id = %user_id,
        initial_base = %shift.initial_base,
        "Shift opened"
    );

    let batch_id = terminal
        .dispatch(WriteBatch::new("open_shift").then(OutboundWrite::UpsertShift(shift.clone())));
    Ok(ShiftResponse { shift, batch_id })
}

pub fn close_shift(
    terminal: &mut Terminal,
    request: CloseShiftRequest,
) -> ApiResult<CloseShiftResponse> {
    if !request.confirm_discrepancy {
        if let Some(open) = terminal.shifts.get_open().filter(|s| s.id == request.shift_id) {
            let difference = request.counted_cash - open.cash_in_drawer();
            if difference.abs() > DISCREPANCY_TOLERANCE {
                return Err(ApiError::new(
                    ErrorCode::ShiftError,
                    format!("Drawer is off by {difference}; confirm to close the shift"),
                ));
            }
        }
    }

    let closure = terminal.shifts.close(
        &request.shift_id,
        request.counted_cash,
        &terminal.security_events,
        Utc::now(),
    )?;

    if closure.needs_confirmation() {
        warn!(
            shift_id = %closure.shift.id,
            expected = %closure.expected_cash,
            discrepancy = %closure.discrepancy,
            events = closure.shift.discrepancy_events.len(),
            "Shift closed with a cash discrepancy"
        );
    } else {
        info!(shift_id = %closure.shift.id, expected = %closure.expected_cash, "Shift closed");
    }

    let batch_id = terminal.dispatch(
        WriteBatch::new("close_shift").then(OutboundWrite::UpsertShift(closure.shift.clone())),
    );
    Ok(CloseShiftResponse {
        shift: closure.shift,
        expected_cash: closure.expected_cash,
        discrepancy: closure.discrepancy,
        batch_id,
    })
}

pub fn shift_status(terminal: &Terminal) -> ShiftStatus {
    ShiftStatus {
        open: terminal.shifts.get_open().cloned(),
        expected_cash: terminal.shifts.live_expected_cash(),
        closed_shifts: terminal.shifts.history().len(),
    }
}

/// Camera feed entry, matched against the drawer when the shift closes.
pub fn report_security_event(terminal: &mut Terminal, event: SecurityEvent) -> ApiResult<()> {
    if terminal.security_events.iter().any(|e| e.id == event.id) {
        return Err(CoreError::from(gastro_core::ValidationError::Duplicate {
            field: "security event".to_string(),
            value: event.id,
        })
        .into());
    }
    info!(event_id = %event.id, camera_value = %event.camera_value, "Security event received");
    terminal.security_events.push(event);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::sale::{complete_sale, CompleteSaleRequest};
    use crate::commands::tax::{register_expense, RegisterExpenseRequest};
    use crate::testing::{mirrored_terminal, report_for};
    use gastro_core::{PaymentMethod, SaleLine, SecurityEventKind};
    use gastro_sync::TerminalConfig;

    fn local() -> Terminal {
        Terminal::local(&TerminalConfig::default())
    }

    fn open(terminal: &mut Terminal, cents: i64) -> Shift {
        open_shift(
            terminal,
            OpenShiftRequest {
                initial_base: Money::from_cents(cents),
            },
        )
        .unwrap()
        .shift
    }

    fn sell(terminal: &mut Terminal, cents: i64, method: PaymentMethod) {
        let line = SaleLine {
            product_id: "p_cana".into(),
            name: None,
            quantity: 1,
            unit_price: Money::from_cents(cents),
            mixer_id: None,
        };
        complete_sale(
            terminal,
            CompleteSaleRequest {
                items: vec![line],
                payment_method: method,
                amount_paid: None,
                table_id: None,
            },
        )
        .unwrap();
    }

    #[test]
    fn test_second_open_is_rejected() {
        let mut terminal = local();
        let first = open(&mut terminal, 15_000);

        let err = open_shift(
            &mut terminal,
            OpenShiftRequest {
                initial_base: Money::zero(),
            },
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ShiftError);
        assert_eq!(shift_status(&terminal).open.map(|s| s.id), Some(first.id));
    }

    #[test]
    fn test_close_without_open_shift_is_rejected() {
        let mut terminal = local();
        let err = close_shift(
            &mut terminal,
            CloseShiftRequest {
                shift_id: "s-1".into(),
                counted_cash: Money::zero(),
                confirm_discrepancy: true,
            },
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ShiftError);
    }

    #[test]
    fn test_drawer_scenario() {
        let mut terminal = local();
        let shift = open(&mut terminal, 15_000);

        sell(&mut terminal, 1250, PaymentMethod::Cash);
        sell(&mut terminal, 2000, PaymentMethod::Card);
        register_expense(
            &mut terminal,
            RegisterExpenseRequest {
                concept: "Hielo".into(),
                total: Money::from_cents(500),
                tax_rate_bps: None,
                date: None,
                is_cash_out: true,
                attachment_url: None,
            },
        )
        .unwrap();

        let open = shift_status(&terminal).open.unwrap();
        assert_eq!(open.total_cash_sales.cents(), 1250);
        assert_eq!(open.total_card.cents(), 2000);
        assert_eq!(open.total_expenses.cents(), 500);

        let request = CloseShiftRequest {
            shift_id: shift.id.clone(),
            counted_cash: Money::from_cents(15_600),
            confirm_discrepancy: false,
        };
        let err = close_shift(&mut terminal, request.clone()).unwrap_err();
        assert!(err.message.contains("confirm"));
        assert!(shift_status(&terminal).open.is_some());

        let closed = close_shift(
            &mut terminal,
            CloseShiftRequest {
                confirm_discrepancy: true,
                ..request
            },
        )
        .unwrap();
        assert_eq!(closed.expected_cash.cents(), 15_750);
        assert_eq!(closed.discrepancy.cents(), -150);
        assert_eq!(shift_status(&terminal).closed_shifts, 1);
        assert!(shift_status(&terminal).open.is_none());
    }

    #[test]
    fn test_mismatch_event_is_attached() {
        let mut terminal = local();
        let shift = open(&mut terminal, 10_000);
        report_security_event(
            &mut terminal,
            SecurityEvent {
                id: "cam-1".into(),
                timestamp: Utc::now(),
                camera_value: Money::from_cents(2000),
                app_paid_value: Some(Money::from_cents(1000)),
                kind: SecurityEventKind::Mismatch,
                snapshot_url: None,
                video_ref: "rec-0001".into(),
            },
        )
        .unwrap();

        let closed = close_shift(
            &mut terminal,
            CloseShiftRequest {
                shift_id: shift.id,
                counted_cash: Money::from_cents(9000),
                confirm_discrepancy: true,
            },
        )
        .unwrap();
        assert_eq!(closed.shift.discrepancy_events.len(), 1);
    }

    #[tokio::test]
    async fn test_close_is_mirrored() {
        let (mut terminal, backend, mut reports) =
            mirrored_terminal(&TerminalConfig::default()).await;
        let shift = open(&mut terminal, 5000);

        let closed = close_shift(
            &mut terminal,
            CloseShiftRequest {
                shift_id: shift.id.clone(),
                counted_cash: Money::from_cents(5000),
                confirm_discrepancy: false,
            },
        )
        .unwrap();
        assert!(closed.discrepancy.is_zero());

        let report = report_for(&mut reports, closed.batch_id.unwrap()).await;
        assert!(report.is_complete());
        assert_eq!(
            backend.writes().await,
            vec![format!("upsert_shift:{}", shift.id), format!("upsert_shift:{}", shift.id)]
        );
    }
}
