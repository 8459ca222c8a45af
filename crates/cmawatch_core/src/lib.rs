//! Core domain logic for CMA Watch.
//! This crate is the single source of truth for roster and reminder rules.

pub mod background;
pub mod config;
pub mod host;
pub mod links;
pub mod logging;
pub mod model;
pub mod notify;
pub mod policy;
pub mod repo;
pub mod service;

pub use background::refresh::{BackgroundRefreshTask, RefreshReport};
pub use background::registration::BackgroundRegistration;
pub use background::task_scheduler::{
    BackgroundFetchResult, BackgroundTaskScheduler, TaskOptions, TaskSchedulerError,
    BACKGROUND_FETCH_TASK_ID, MINIMUM_INTERVAL_SECS,
};
pub use config::CoreConfig;
pub use host::outbox::{HostCommand, HostOutbox};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::entry::{
    EntryId, EntryValidationError, NotificationId, NotificationSchedule, RosterEntry,
};
pub use notify::scheduler::{
    DeliveryOutcome, NotificationScheduler, ScheduleOutcome, SkipReason, NOTIFICATION_TITLE,
};
pub use notify::service::{
    DeliveredNotification, DeliveryObserver, LoggingDeliveryObserver, NotificationChannel,
    NotificationContent, NotificationError, NotificationRequest, NotificationService,
    NotificationTrigger, PermissionStatus,
};
pub use policy::clock::{Clock, FixedClock, SystemClock};
pub use policy::expiration::{classify, days_remaining, ExpirationRisk, WARNING_WINDOW_DAYS};
pub use repo::roster_repo::{
    JsonFileRosterRepository, RejectedRecord, RosterRepository, ScanReport, StorageError,
};
pub use repo::seed::SeedDataset;
pub use service::roster_service::{
    EntryInput, EntryStatus, RosterService, RosterServiceError, RosterServiceResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
