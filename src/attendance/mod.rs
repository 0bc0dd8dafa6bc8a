//! Daily check-in.
//!
//! Per (user, day) the state moves once from not-checked-in to checked-in.
//! A check-in is refused when the user already has an entry for today or the
//! request does not come from the allowed network.

pub mod network;

use chrono::{DateTime, Local, NaiveDate};
use std::net::IpAddr;

use crate::error::{AppError, LogOnError};
use crate::store::{Store, User};
use network::NetworkPolicy;

pub const ALREADY_CHECKED_IN: &str = "You are already checked in";
pub const WRONG_NETWORK: &str = "Unable to check-in. You are not on the appropriate WIFI.";

/// Display format for check-in times ("Monday, 2 Jan 2006, 3:04:05 PM")
pub const CHECK_IN_TIME_FORMAT: &str = "%A, %-d %b %Y, %-I:%M:%S %p";

/// Day key for a moment: its local calendar date
pub fn day_of(at: DateTime<Local>) -> NaiveDate {
    at.date_naive()
}

pub fn format_check_in_time(at: DateTime<Local>) -> String {
    at.format(CHECK_IN_TIME_FORMAT).to_string()
}

/// Today's check-in time of `user_id`, if any
pub fn checked_in_at(
    store: &Store,
    user_id: &str,
    now: DateTime<Local>,
) -> Result<Option<DateTime<Local>>, AppError> {
    Ok(store.attendance.get(day_of(now), user_id)?)
}

/// Record a check-in for `user` at `now`.
///
/// Persisting the attendance snapshot is best-effort: a failed write is
/// logged and the check-in still stands.
pub fn check_in(
    store: &Store,
    policy: &NetworkPolicy,
    user: &User,
    client: Option<IpAddr>,
    now: DateTime<Local>,
) -> Result<DateTime<Local>, AppError> {
    if user.is_anonymous() {
        return Err(AppError::Unauthorized("Not signed in".into()));
    }

    let today = day_of(now);
    if store.attendance.is_checked_in(today, &user.id)? {
        tracing::debug!("Rejected repeat check-in for {}", user.id);
        return Err(AppError::Forbidden(ALREADY_CHECKED_IN.into()));
    }

    if !policy.permits(client) {
        tracing::info!(
            "Rejected check-in for {} from {:?} (allowed prefix {:?})",
            user.id,
            client,
            policy.prefix().map(ToString::to_string)
        );
        return Err(AppError::Forbidden(WRONG_NETWORK.into()));
    }

    // A concurrent request may have won since the check above
    if !store.attendance.record(today, &user.id, now)? {
        return Err(AppError::Forbidden(ALREADY_CHECKED_IN.into()));
    }
    tracing::info!("{} checked in at {}", user.id, now.to_rfc3339());

    store
        .flush_attendance()
        .log_warn("Failed to write attendance snapshot");

    Ok(now)
}
