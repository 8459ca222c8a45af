//! Background re-check registration lifecycle.

use crate::background::task_scheduler::{
    BackgroundTaskScheduler, TaskOptions, TaskSchedulerError, BACKGROUND_FETCH_TASK_ID,
};
use log::{error, info};

/// Explicit register/teardown service for the daily re-check.
pub struct BackgroundRegistration<S: BackgroundTaskScheduler> {
    scheduler: S,
    task_id: String,
    options: TaskOptions,
}

impl<S: BackgroundTaskScheduler> BackgroundRegistration<S> {
    /// Registration for the default daily CMA re-check.
    pub fn new(scheduler: S) -> Self {
        Self::with_task(scheduler, BACKGROUND_FETCH_TASK_ID, TaskOptions::daily_refresh())
    }

    pub fn with_task(scheduler: S, task_id: impl Into<String>, options: TaskOptions) -> Self {
        Self {
            scheduler,
            task_id: task_id.into(),
            options,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn options(&self) -> &TaskOptions {
        &self.options
    }

    /// Registers the task, replacing any previous registration.
    ///
    /// # Errors
    /// Returns the host failure after logging it; nothing panics.
    pub fn ensure_registered(&self) -> Result<(), TaskSchedulerError> {
        let result = self.replace_registration();
        match &result {
            Ok(()) => info!(
                "event=background_register module=background status=ok task_id={} interval_secs={}",
                self.task_id, self.options.minimum_interval_secs
            ),
            Err(err) => error!(
                "event=background_register module=background status=error task_id={} error={}",
                self.task_id, err
            ),
        }
        result
    }

    /// Removes the registration if present.
    pub fn teardown(&self) -> Result<(), TaskSchedulerError> {
        if self.scheduler.is_registered(&self.task_id)? {
            self.scheduler.unregister(&self.task_id)?;
            info!(
                "event=background_teardown module=background status=ok task_id={}",
                self.task_id
            );
        }
        Ok(())
    }

    pub fn is_registered(&self) -> Result<bool, TaskSchedulerError> {
        self.scheduler.is_registered(&self.task_id)
    }

    fn replace_registration(&self) -> Result<(), TaskSchedulerError> {
        if self.scheduler.is_registered(&self.task_id)? {
            self.scheduler.unregister(&self.task_id)?;
        }
        self.scheduler.register(&self.task_id, &self.options)
    }
}
