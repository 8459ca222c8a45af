//! CMA expiration policy.
//!
//! # Invariants
//! - `days_remaining(today, today) == 0`; overdue dates are negative.
//! - `Warning` iff `0 <= days <= 50`, `Expired` iff `days < 0`, else `Ok`.

use chrono::{DateTime, NaiveDate, TimeZone};

/// Days before expiration during which reminders are eligible.
pub const WARNING_WINDOW_DAYS: i64 = 50;

/// Risk class shown on roster cards and used by reminder rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpirationRisk {
    Ok,
    Warning,
    Expired,
}

impl ExpirationRisk {
    /// Stable lowercase label used in logs and FFI payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Expired => "expired",
        }
    }

    /// Card badge text, `None` when nothing should be highlighted.
    pub fn badge(self) -> Option<&'static str> {
        match self {
            Self::Ok => None,
            Self::Warning => Some("ALERTA!"),
            Self::Expired => Some("VENCEU A PARADA!"),
        }
    }
}

/// Whole calendar days from the reference instant's local date to
/// `expiration_date`.
pub fn days_remaining<Tz: TimeZone>(expiration_date: NaiveDate, reference: &DateTime<Tz>) -> i64 {
    let today = reference.date_naive();
    expiration_date.signed_duration_since(today).num_days()
}

/// Classifies a days-remaining value.
pub fn classify(days_remaining: i64) -> ExpirationRisk {
    if days_remaining < 0 {
        ExpirationRisk::Expired
    } else if days_remaining <= WARNING_WINDOW_DAYS {
        ExpirationRisk::Warning
    } else {
        ExpirationRisk::Ok
    }
}

/// Reminder eligibility: inside the warning window or already overdue.
pub fn is_within_alert_window(days_remaining: i64) -> bool {
    days_remaining <= WARNING_WINDOW_DAYS
}
