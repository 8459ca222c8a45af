#![allow(dead_code)]

use chrono::{Duration, Local, NaiveDate};
use cmawatch_core::{
    FixedClock, NotificationChannel, NotificationError, NotificationId, NotificationRequest,
    NotificationService, PermissionStatus,
};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    PermissionStatus,
    RequestPermission,
    EnsureChannel,
    Schedule(NotificationRequest),
    Cancel(NotificationId),
}

struct NotifierState {
    permission: PermissionStatus,
    permission_after_request: PermissionStatus,
    fail_schedule: bool,
    fail_cancel: bool,
    calls: Vec<Call>,
}

/// Notification service double that records every call.
#[derive(Clone)]
pub struct RecordingNotifier {
    state: Arc<Mutex<NotifierState>>,
}

impl RecordingNotifier {
    pub fn with_permission(permission: PermissionStatus) -> Self {
        Self {
            state: Arc::new(Mutex::new(NotifierState {
                permission,
                permission_after_request: permission,
                fail_schedule: false,
                fail_cancel: false,
                calls: Vec::new(),
            })),
        }
    }

    pub fn granted() -> Self {
        Self::with_permission(PermissionStatus::Granted)
    }

    pub fn set_permission_after_request(&self, status: PermissionStatus) {
        self.state.lock().unwrap().permission_after_request = status;
    }

    pub fn set_fail_schedule(&self, fail: bool) {
        self.state.lock().unwrap().fail_schedule = fail;
    }

    pub fn set_fail_cancel(&self, fail: bool) {
        self.state.lock().unwrap().fail_cancel = fail;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn scheduled(&self) -> Vec<NotificationRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Schedule(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn cancelled(&self) -> Vec<NotificationId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Cancel(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.state.lock().unwrap().calls.clear();
    }
}

impl NotificationService for RecordingNotifier {
    fn permission_status(&self) -> Result<PermissionStatus, NotificationError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::PermissionStatus);
        Ok(state.permission)
    }

    fn request_permission(&self) -> Result<PermissionStatus, NotificationError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::RequestPermission);
        state.permission = state.permission_after_request;
        Ok(state.permission)
    }

    fn schedule(&self, request: &NotificationRequest) -> Result<NotificationId, NotificationError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_schedule {
            return Err(NotificationError::Service("schedule rejected".to_string()));
        }
        state.calls.push(Call::Schedule(request.clone()));
        Ok(request.identifier.clone())
    }

    fn cancel(&self, id: &NotificationId) -> Result<(), NotificationError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Cancel(id.clone()));
        if state.fail_cancel {
            return Err(NotificationError::Service("unknown identifier".to_string()));
        }
        Ok(())
    }

    fn ensure_channel(&self, _channel: &NotificationChannel) -> Result<(), NotificationError> {
        self.state.lock().unwrap().calls.push(Call::EnsureChannel);
        Ok(())
    }
}

pub fn fixed_clock() -> FixedClock {
    FixedClock(Local::now())
}

pub fn days_from_today(clock: &FixedClock, days: i64) -> NaiveDate {
    clock.0.date_naive() + Duration::days(days)
}

pub fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
