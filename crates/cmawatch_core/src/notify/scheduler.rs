//! Roster entry to OS notification reconciliation.
//!
//! # Responsibility
//! - Schedule the repeating expiration reminder for an entry.
//! - Cancel reminders on toggle-off, edit and delete.
//! - Deliver immediate alerts for the background re-check.
//!
//! # Invariants
//! - `schedule` always allocates a fresh id, but only a `Scheduled` outcome
//!   may be stored on an entry.
//! - Turning reminders on does not reschedule; that happens on the next edit.
//! - `fire_immediate` never touches the stored schedule.

use crate::model::entry::{NotificationId, NotificationSchedule, RosterEntry};
use crate::notify::service::{
    NotificationChannel, NotificationContent, NotificationError, NotificationRequest,
    NotificationService, NotificationTrigger, PermissionStatus,
};
use crate::policy::clock::Clock;
use crate::policy::expiration::{days_remaining, is_within_alert_window};
use chrono::{NaiveDate, NaiveTime};
use log::{debug, error, info, warn};

/// Title of every CMA reminder.
pub const NOTIFICATION_TITLE: &str = "Alerta de Vencimento de CMA";

const BODY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Why no notification was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The entry's reminder switch is off.
    Disabled,
    /// Expiration is further away than the warning window.
    OutsideWarningWindow { days_remaining: i64 },
    /// The OS permission is not granted (or could not be read).
    PermissionDenied,
    /// The notification service rejected the call.
    ServiceFailure,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::OutsideWarningWindow { .. } => "outside_window",
            Self::PermissionDenied => "permission_denied",
            Self::ServiceFailure => "service_failure",
        }
    }
}

/// Result of `NotificationScheduler::schedule`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// A repeating reminder is live under this id.
    Scheduled(NotificationId),
    /// Nothing was registered; `inert_id` refers to nothing in the OS.
    Skipped {
        inert_id: NotificationId,
        reason: SkipReason,
    },
}

impl ScheduleOutcome {
    /// Id allocated for this attempt, live or inert.
    pub fn allocated_id(&self) -> &NotificationId {
        match self {
            Self::Scheduled(id) => id,
            Self::Skipped { inert_id, .. } => inert_id,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        matches!(self, Self::Scheduled(_))
    }

    /// Schedule state to store on the entry.
    pub fn into_schedule(self) -> NotificationSchedule {
        match self {
            Self::Scheduled(id) => NotificationSchedule::Scheduled(id),
            Self::Skipped { .. } => NotificationSchedule::NoSchedule,
        }
    }
}

/// Result of `NotificationScheduler::fire_immediate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered(NotificationId),
    Skipped(SkipReason),
}

/// Builds the reminder text for one entry.
pub fn cma_alert_content(name: &str, expiration_date: NaiveDate) -> NotificationContent {
    NotificationContent {
        title: NOTIFICATION_TITLE.to_string(),
        body: format!(
            "O CMA de {} vence em {}",
            name,
            expiration_date.format(BODY_DATE_FORMAT)
        ),
    }
}

/// Owns the notification collaborator and the clock used for window checks.
pub struct NotificationScheduler<N: NotificationService, C: Clock> {
    service: N,
    clock: C,
}

impl<N: NotificationService, C: Clock> NotificationScheduler<N, C> {
    pub fn new(service: N, clock: C) -> Self {
        Self { service, clock }
    }

    pub fn service(&self) -> &N {
        &self.service
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Initial registration flow run once when the roster opens.
    ///
    /// Requests permission when it is not granted yet and configures the
    /// default channel.
    ///
    /// # Errors
    /// - `PermissionDenied` when the user refuses; the caller alerts once.
    /// - `Service` when the host runtime fails.
    pub fn register_for_notifications(&self) -> Result<PermissionStatus, NotificationError> {
        let existing = self.service.permission_status()?;
        let status = if existing.is_granted() {
            existing
        } else {
            self.service.request_permission()?
        };

        if !status.is_granted() {
            warn!(
                "event=notification_register module=notify status=denied permission={}",
                status.as_str()
            );
            return Err(NotificationError::PermissionDenied(status));
        }

        if let Err(err) = self
            .service
            .ensure_channel(&NotificationChannel::default_alerts())
        {
            warn!(
                "event=notification_channel module=notify status=error error={}",
                err
            );
        }
        info!("event=notification_register module=notify status=ok");
        Ok(status)
    }

    /// Schedules the repeating expiration reminder for `entry`.
    ///
    /// Never fails: every problem is logged and reported as `Skipped`.
    pub fn schedule(&self, entry: &RosterEntry) -> ScheduleOutcome {
        let notification_id = NotificationId::generate();
        debug!(
            "event=notification_schedule module=notify status=start entry_id={} name={}",
            entry.id, entry.name
        );

        if !entry.notifications_enabled {
            return self.skip(entry, notification_id, SkipReason::Disabled);
        }

        let days = days_remaining(entry.expiration_date, &self.clock.now());
        if !is_within_alert_window(days) {
            return self.skip(
                entry,
                notification_id,
                SkipReason::OutsideWarningWindow {
                    days_remaining: days,
                },
            );
        }

        if !self.permission_granted(entry) {
            return self.skip(entry, notification_id, SkipReason::PermissionDenied);
        }

        let request = NotificationRequest {
            identifier: notification_id.clone(),
            content: cma_alert_content(&entry.name, entry.expiration_date),
            trigger: NotificationTrigger::At {
                fire_at: entry.expiration_date.and_time(NaiveTime::MIN),
                repeats: true,
            },
        };
        match self.service.schedule(&request) {
            Ok(live_id) => {
                info!(
                    "event=notification_schedule module=notify status=ok entry_id={} notification_id={} days_remaining={}",
                    entry.id, live_id, days
                );
                ScheduleOutcome::Scheduled(live_id)
            }
            Err(err) => {
                error!(
                    "event=notification_schedule module=notify status=error entry_id={} error={}",
                    entry.id, err
                );
                ScheduleOutcome::Skipped {
                    inert_id: notification_id,
                    reason: SkipReason::ServiceFailure,
                }
            }
        }
    }

    /// Cancels a notification; failures are logged and swallowed.
    pub fn cancel(&self, notification_id: &NotificationId) {
        match self.service.cancel(notification_id) {
            Ok(()) => info!(
                "event=notification_cancel module=notify status=ok notification_id={}",
                notification_id
            ),
            Err(err) => warn!(
                "event=notification_cancel module=notify status=error notification_id={} error={}",
                notification_id, err
            ),
        }
    }

    /// Cancels whatever `schedule` refers to, if anything.
    pub fn cancel_schedule(&self, schedule: &NotificationSchedule) {
        if let Some(notification_id) = schedule.notification_id() {
            self.cancel(notification_id);
        }
    }

    /// Flips the reminder switch of `entry`.
    ///
    /// Turning off cancels a live reminder first. Turning on only flips the
    /// flag; the reminder comes back on the next edit.
    pub fn toggle(&self, entry: &RosterEntry) -> RosterEntry {
        let mut updated = entry.clone();
        if entry.notifications_enabled {
            self.cancel_schedule(&entry.schedule);
            updated.schedule = NotificationSchedule::NoSchedule;
        }
        updated.notifications_enabled = !entry.notifications_enabled;
        info!(
            "event=notification_toggle module=notify status=ok entry_id={} enabled={}",
            entry.id, updated.notifications_enabled
        );
        updated
    }

    /// Delivers a one-shot alert now when `entry` is due.
    pub fn fire_immediate(&self, entry: &RosterEntry) -> DeliveryOutcome {
        if !entry.notifications_enabled {
            debug!(
                "event=notification_fire module=notify status=skip entry_id={} reason=disabled",
                entry.id
            );
            return DeliveryOutcome::Skipped(SkipReason::Disabled);
        }

        let days = days_remaining(entry.expiration_date, &self.clock.now());
        if !is_within_alert_window(days) {
            return DeliveryOutcome::Skipped(SkipReason::OutsideWarningWindow {
                days_remaining: days,
            });
        }

        if !self.permission_granted(entry) {
            return DeliveryOutcome::Skipped(SkipReason::PermissionDenied);
        }

        let request = NotificationRequest {
            identifier: NotificationId::generate(),
            content: cma_alert_content(&entry.name, entry.expiration_date),
            trigger: NotificationTrigger::Immediate,
        };
        match self.service.schedule(&request) {
            Ok(delivered_id) => {
                info!(
                    "event=notification_fire module=notify status=ok entry_id={} days_remaining={}",
                    entry.id, days
                );
                DeliveryOutcome::Delivered(delivered_id)
            }
            Err(err) => {
                error!(
                    "event=notification_fire module=notify status=error entry_id={} error={}",
                    entry.id, err
                );
                DeliveryOutcome::Skipped(SkipReason::ServiceFailure)
            }
        }
    }

    fn permission_granted(&self, entry: &RosterEntry) -> bool {
        match self.service.permission_status() {
            Ok(status) if status.is_granted() => true,
            Ok(status) => {
                info!(
                    "event=notification_permission module=notify status=skip entry_id={} permission={}",
                    entry.id,
                    status.as_str()
                );
                false
            }
            Err(err) => {
                warn!(
                    "event=notification_permission module=notify status=error entry_id={} error={}",
                    entry.id, err
                );
                false
            }
        }
    }

    fn skip(
        &self,
        entry: &RosterEntry,
        inert_id: NotificationId,
        reason: SkipReason,
    ) -> ScheduleOutcome {
        info!(
            "event=notification_schedule module=notify status=skip entry_id={} reason={}",
            entry.id,
            reason.as_str()
        );
        ScheduleOutcome::Skipped { inert_id, reason }
    }
}
