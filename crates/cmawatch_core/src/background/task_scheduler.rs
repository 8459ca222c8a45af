//! Background task scheduler collaborator contract.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Task id the re-check is registered under.
pub const BACKGROUND_FETCH_TASK_ID: &str = "background-fetch";
/// Minimum interval between runs (24 hours).
pub const MINIMUM_INTERVAL_SECS: u64 = 86_400;

/// Registration options passed to the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskOptions {
    pub minimum_interval_secs: u64,
    /// Keep the task registered after the app is terminated.
    pub keep_alive_on_app_termination: bool,
    pub run_on_boot: bool,
}

impl TaskOptions {
    /// Options used by the daily CMA re-check.
    pub fn daily_refresh() -> Self {
        Self {
            minimum_interval_secs: MINIMUM_INTERVAL_SECS,
            keep_alive_on_app_termination: true,
            run_on_boot: true,
        }
    }
}

/// Completion signal a handler returns to the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundFetchResult {
    NewData,
    NoData,
    Failed,
}

impl BackgroundFetchResult {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewData => "new_data",
            Self::NoData => "no_data",
            Self::Failed => "failed",
        }
    }
}

/// Host background scheduler failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskSchedulerError {
    Host(String),
}

impl Display for TaskSchedulerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host(message) => write!(f, "background task scheduler failed: {message}"),
        }
    }
}

impl Error for TaskSchedulerError {}

/// OS background task capability, implemented by the host runtime.
pub trait BackgroundTaskScheduler {
    fn register(&self, task_id: &str, options: &TaskOptions) -> Result<(), TaskSchedulerError>;
    fn unregister(&self, task_id: &str) -> Result<(), TaskSchedulerError>;
    fn is_registered(&self, task_id: &str) -> Result<bool, TaskSchedulerError>;
}

impl<T: BackgroundTaskScheduler + ?Sized> BackgroundTaskScheduler for &T {
    fn register(&self, task_id: &str, options: &TaskOptions) -> Result<(), TaskSchedulerError> {
        (**self).register(task_id, options)
    }

    fn unregister(&self, task_id: &str) -> Result<(), TaskSchedulerError> {
        (**self).unregister(task_id)
    }

    fn is_registered(&self, task_id: &str) -> Result<bool, TaskSchedulerError> {
        (**self).is_registered(task_id)
    }
}

impl<T: BackgroundTaskScheduler + ?Sized> BackgroundTaskScheduler for Arc<T> {
    fn register(&self, task_id: &str, options: &TaskOptions) -> Result<(), TaskSchedulerError> {
        (**self).register(task_id, options)
    }

    fn unregister(&self, task_id: &str) -> Result<(), TaskSchedulerError> {
        (**self).unregister(task_id)
    }

    fn is_registered(&self, task_id: &str) -> Result<bool, TaskSchedulerError> {
        (**self).is_registered(task_id)
    }
}
