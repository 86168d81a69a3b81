//! # Session Commands

use tracing::info;

use gastro_core::User;

use crate::error::{ApiError, ApiResult};
use crate::state::Terminal;

/// Signs in whoever owns `pin`.
pub fn switch_user(terminal: &mut Terminal, pin: &str) -> ApiResult<User> {
    let user = terminal
        .users
        .iter()
        .find(|u| u.pin == pin)
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Unknown PIN"))?;

    info!(user_id = %user.id, "User signed in");
    terminal.active_user = Some(user.clone());
    Ok(user)
}

pub fn sign_out(terminal: &mut Terminal) {
    if let Some(user) = terminal.active_user.take() {
        info!(user_id = %user.id, "User signed out");
    }
}
