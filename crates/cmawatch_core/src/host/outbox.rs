//! Command queue shared between the core and the mobile shell.
//!
//! # Invariants
//! - Commands are drained in the order they were issued, exactly once.
//! - Permission state is whatever the shell last reported; it starts as
//!   `Undetermined` and is never assumed granted.

use crate::background::task_scheduler::{
    BackgroundTaskScheduler, TaskOptions, TaskSchedulerError,
};
use crate::model::entry::NotificationId;
use crate::notify::service::{
    NotificationChannel, NotificationError, NotificationRequest, NotificationService,
    PermissionStatus,
};
use log::debug;
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

/// One OS-facing action the shell must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    RequestPermission,
    EnsureChannel(NotificationChannel),
    ScheduleNotification(NotificationRequest),
    CancelNotification(NotificationId),
    RegisterTask { task_id: String, options: TaskOptions },
    UnregisterTask { task_id: String },
}

impl HostCommand {
    /// Stable kind label for logs and FFI payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestPermission => "request_permission",
            Self::EnsureChannel(_) => "ensure_channel",
            Self::ScheduleNotification(_) => "schedule_notification",
            Self::CancelNotification(_) => "cancel_notification",
            Self::RegisterTask { .. } => "register_task",
            Self::UnregisterTask { .. } => "unregister_task",
        }
    }
}

struct OutboxState {
    permission: PermissionStatus,
    registered_tasks: BTreeSet<String>,
    commands: Vec<HostCommand>,
}

/// In-process notification service and task scheduler backed by a queue.
pub struct HostOutbox {
    state: Mutex<OutboxState>,
}

impl Default for HostOutbox {
    fn default() -> Self {
        Self::new()
    }
}

impl HostOutbox {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(OutboxState {
                permission: PermissionStatus::Undetermined,
                registered_tasks: BTreeSet::new(),
                commands: Vec::new(),
            }),
        }
    }

    /// Records the permission state reported by the shell.
    pub fn set_permission_status(&self, status: PermissionStatus) {
        self.lock().permission = status;
    }

    /// Records the OS's answer for a task registration.
    ///
    /// The shell reports it at startup, since registrations outlive the
    /// process that made them.
    pub fn mark_task_registered(&self, task_id: &str, registered: bool) {
        let mut state = self.lock();
        if registered {
            state.registered_tasks.insert(task_id.to_string());
        } else {
            state.registered_tasks.remove(task_id);
        }
    }

    /// Takes every pending command, oldest first.
    pub fn drain(&self) -> Vec<HostCommand> {
        let commands = std::mem::take(&mut self.lock().commands);
        debug!(
            "event=host_drain module=host status=ok commands={}",
            commands.len()
        );
        commands
    }

    pub fn pending_len(&self) -> usize {
        self.lock().commands.len()
    }

    fn push(&self, command: HostCommand) {
        self.lock().commands.push(command);
    }

    fn lock(&self) -> MutexGuard<'_, OutboxState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl NotificationService for HostOutbox {
    fn permission_status(&self) -> Result<PermissionStatus, NotificationError> {
        Ok(self.lock().permission)
    }

    fn request_permission(&self) -> Result<PermissionStatus, NotificationError> {
        self.push(HostCommand::RequestPermission);
        Ok(self.lock().permission)
    }

    fn schedule(&self, request: &NotificationRequest) -> Result<NotificationId, NotificationError> {
        self.push(HostCommand::ScheduleNotification(request.clone()));
        Ok(request.identifier.clone())
    }

    fn cancel(&self, id: &NotificationId) -> Result<(), NotificationError> {
        self.push(HostCommand::CancelNotification(id.clone()));
        Ok(())
    }

    fn ensure_channel(&self, channel: &NotificationChannel) -> Result<(), NotificationError> {
        self.push(HostCommand::EnsureChannel(channel.clone()));
        Ok(())
    }
}

impl BackgroundTaskScheduler for HostOutbox {
    fn register(&self, task_id: &str, options: &TaskOptions) -> Result<(), TaskSchedulerError> {
        let mut state = self.lock();
        state.registered_tasks.insert(task_id.to_string());
        state.commands.push(HostCommand::RegisterTask {
            task_id: task_id.to_string(),
            options: *options,
        });
        Ok(())
    }

    fn unregister(&self, task_id: &str) -> Result<(), TaskSchedulerError> {
        let mut state = self.lock();
        state.registered_tasks.remove(task_id);
        state.commands.push(HostCommand::UnregisterTask {
            task_id: task_id.to_string(),
        });
        Ok(())
    }

    fn is_registered(&self, task_id: &str) -> Result<bool, TaskSchedulerError> {
        Ok(self.lock().registered_tasks.contains(task_id))
    }
}
