//! Roster entry domain model.
//!
//! # Responsibility
//! - Define one tracked controller and the state of its CMA notification.
//! - Provide input validation for create/edit flows.
//!
//! # Invariants
//! - `id` is generated once and never reused for another entry.
//! - `name` and `license_id` are matching attributes only, never lookup keys.
//! - `schedule` is `NoSchedule` whenever `notifications_enabled` was turned off.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Calendar date format used by the persisted file and host inputs.
pub const EXPIRATION_DATE_FORMAT: &str = "%Y-%m-%d";

static LICENSE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("valid license id regex"));

/// Stable surrogate identifier for one roster entry.
pub type EntryId = Uuid;

/// Opaque handle of one notification registered with the OS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(String);

impl NotificationId {
    /// Allocates a fresh random notification handle.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps a handle produced elsewhere (persisted file, host runtime).
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NotificationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Notification state attached to a roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NotificationSchedule {
    /// Nothing is registered with the OS for this entry.
    #[default]
    NoSchedule,
    /// A repeating reminder is registered under this handle.
    Scheduled(NotificationId),
}

impl NotificationSchedule {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, Self::Scheduled(_))
    }

    /// Returns the live handle, if any.
    pub fn notification_id(&self) -> Option<&NotificationId> {
        match self {
            Self::NoSchedule => None,
            Self::Scheduled(id) => Some(id),
        }
    }
}

/// One controller tracked by the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    /// Surrogate identity used by edit/delete/toggle.
    pub id: EntryId,
    /// Display name (`nome` in the persisted file).
    pub name: String,
    /// LPNA license number, numeric string.
    pub license_id: String,
    /// Day the CMA stops being valid.
    pub expiration_date: NaiveDate,
    /// User switch for expiration reminders.
    pub notifications_enabled: bool,
    /// Reminder currently registered with the OS.
    pub schedule: NotificationSchedule,
    /// UI-only flag carried through persistence.
    pub card_visible: bool,
}

impl RosterEntry {
    /// Creates an entry with a generated id, reminders enabled and nothing
    /// scheduled yet.
    pub fn new(
        name: impl Into<String>,
        license_id: impl Into<String>,
        expiration_date: NaiveDate,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), name, license_id, expiration_date)
    }

    /// Creates an entry with a caller-provided id.
    ///
    /// Used by the record store when decoding persisted records.
    pub fn with_id(
        id: EntryId,
        name: impl Into<String>,
        license_id: impl Into<String>,
        expiration_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            license_id: license_id.into(),
            expiration_date,
            notifications_enabled: true,
            schedule: NotificationSchedule::NoSchedule,
            card_visible: true,
        }
    }

    /// Validates user-editable attributes.
    ///
    /// # Errors
    /// - `EmptyName` when `name` is blank.
    /// - `EmptyLicenseId` when `license_id` is blank.
    /// - `NonNumericLicenseId` when `license_id` contains anything but digits.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        validate_name(&self.name)?;
        validate_license_id(&self.license_id)
    }
}

/// Validation failures for create/edit input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    EmptyName,
    EmptyLicenseId,
    NonNumericLicenseId(String),
    InvalidExpirationDate(String),
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::EmptyLicenseId => write!(f, "license id must not be empty"),
            Self::NonNumericLicenseId(value) => {
                write!(f, "license id must contain only digits, got `{value}`")
            }
            Self::InvalidExpirationDate(value) => {
                write!(f, "expiration date must be YYYY-MM-DD, got `{value}`")
            }
        }
    }
}

impl Error for EntryValidationError {}

/// Parses an ISO calendar date (`YYYY-MM-DD`).
pub fn parse_expiration_date(value: &str) -> Result<NaiveDate, EntryValidationError> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, EXPIRATION_DATE_FORMAT)
        .map_err(|_| EntryValidationError::InvalidExpirationDate(trimmed.to_string()))
}

/// Formats a calendar date the way the persisted file stores it.
pub fn format_expiration_date(date: NaiveDate) -> String {
    date.format(EXPIRATION_DATE_FORMAT).to_string()
}

fn validate_name(name: &str) -> Result<(), EntryValidationError> {
    if name.trim().is_empty() {
        return Err(EntryValidationError::EmptyName);
    }
    Ok(())
}

fn validate_license_id(license_id: &str) -> Result<(), EntryValidationError> {
    let trimmed = license_id.trim();
    if trimmed.is_empty() {
        return Err(EntryValidationError::EmptyLicenseId);
    }
    if !LICENSE_ID_RE.is_match(trimmed) {
        return Err(EntryValidationError::NonNumericLicenseId(
            trimmed.to_string(),
        ));
    }
    Ok(())
}
