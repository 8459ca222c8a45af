//! Notification collaborator contract and request types.

use crate::model::entry::NotificationId;
use chrono::NaiveDateTime;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// OS notification permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Undetermined => "undetermined",
        }
    }

    /// Parses the host runtime's status string. Unknown values map to
    /// `Undetermined` so they never count as granted.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "granted" => Self::Granted,
            "denied" => Self::Denied,
            _ => Self::Undetermined,
        }
    }

    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

/// User-visible text of one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
}

/// When the OS should present a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationTrigger {
    /// Present now, once.
    Immediate,
    /// Present at `fire_at` (device local time).
    At { fire_at: NaiveDateTime, repeats: bool },
}

/// Full scheduling request handed to the notification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    /// Handle the OS should register the notification under.
    pub identifier: NotificationId,
    pub content: NotificationContent,
    pub trigger: NotificationTrigger,
}

/// Android channel importance levels used by this app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelImportance {
    Default,
    High,
    Max,
}

/// Android notification channel configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: ChannelImportance,
    pub vibration_pattern_ms: Vec<u64>,
    pub light_color: String,
}

impl NotificationChannel {
    /// Channel every CMA reminder is posted to.
    pub fn default_alerts() -> Self {
        Self {
            id: "default".to_string(),
            name: "default".to_string(),
            importance: ChannelImportance::Max,
            vibration_pattern_ms: vec![0, 250, 250, 250],
            light_color: "#FF231F7C".to_string(),
        }
    }
}

/// How notifications are presented while the app is foregrounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationOptions {
    pub show_alert: bool,
    pub play_sound: bool,
    pub set_badge: bool,
}

pub const FOREGROUND_PRESENTATION: PresentationOptions = PresentationOptions {
    show_alert: true,
    play_sound: true,
    set_badge: false,
};

/// Notification collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    PermissionDenied(PermissionStatus),
    Service(String),
}

impl Display for NotificationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied(status) => {
                write!(f, "notification permission not granted: {}", status.as_str())
            }
            Self::Service(message) => write!(f, "notification service failed: {message}"),
        }
    }
}

impl Error for NotificationError {}

/// Device notification capability, implemented by the host runtime.
///
/// Permission may be revoked at any time; callers must treat every method
/// as fallible.
pub trait NotificationService {
    fn permission_status(&self) -> Result<PermissionStatus, NotificationError>;
    fn request_permission(&self) -> Result<PermissionStatus, NotificationError>;
    /// Registers `request` and returns the handle it is known under.
    fn schedule(&self, request: &NotificationRequest) -> Result<NotificationId, NotificationError>;
    fn cancel(&self, id: &NotificationId) -> Result<(), NotificationError>;
    /// Platforms without channels accept this as a no-op.
    fn ensure_channel(&self, _channel: &NotificationChannel) -> Result<(), NotificationError> {
        Ok(())
    }
}

impl<T: NotificationService + ?Sized> NotificationService for &T {
    fn permission_status(&self) -> Result<PermissionStatus, NotificationError> {
        (**self).permission_status()
    }

    fn request_permission(&self) -> Result<PermissionStatus, NotificationError> {
        (**self).request_permission()
    }

    fn schedule(&self, request: &NotificationRequest) -> Result<NotificationId, NotificationError> {
        (**self).schedule(request)
    }

    fn cancel(&self, id: &NotificationId) -> Result<(), NotificationError> {
        (**self).cancel(id)
    }

    fn ensure_channel(&self, channel: &NotificationChannel) -> Result<(), NotificationError> {
        (**self).ensure_channel(channel)
    }
}

impl<T: NotificationService + ?Sized> NotificationService for Arc<T> {
    fn permission_status(&self) -> Result<PermissionStatus, NotificationError> {
        (**self).permission_status()
    }

    fn request_permission(&self) -> Result<PermissionStatus, NotificationError> {
        (**self).request_permission()
    }

    fn schedule(&self, request: &NotificationRequest) -> Result<NotificationId, NotificationError> {
        (**self).schedule(request)
    }

    fn cancel(&self, id: &NotificationId) -> Result<(), NotificationError> {
        (**self).cancel(id)
    }

    fn ensure_channel(&self, channel: &NotificationChannel) -> Result<(), NotificationError> {
        (**self).ensure_channel(channel)
    }
}

/// Notification reported back by the host after the OS presented it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredNotification {
    pub identifier: Option<NotificationId>,
    pub title: String,
    pub body: String,
}

/// Receives delivery callbacks from the host.
pub trait DeliveryObserver {
    fn on_delivered(&self, notification: &DeliveredNotification);
}

/// Observer that only records deliveries in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDeliveryObserver;

impl DeliveryObserver for LoggingDeliveryObserver {
    fn on_delivered(&self, notification: &DeliveredNotification) {
        info!(
            "event=notification_received module=notify status=ok notification_id={}",
            notification
                .identifier
                .as_ref()
                .map_or("none", |id| id.as_str())
        );
    }
}
