//! Daily background re-check handler.
//!
//! # Responsibility
//! - Scan the persisted roster without seeding or writing it.
//! - Fire an immediate alert for every enabled entry inside the window.
//!
//! # Invariants
//! - One entry's failure never stops processing of the rest.
//! - `run` always returns `NewData`, even after storage failures or panics,
//!   so the OS does not back the task off.

use crate::background::task_scheduler::BackgroundFetchResult;
use crate::notify::scheduler::{DeliveryOutcome, NotificationScheduler, SkipReason};
use crate::notify::service::NotificationService;
use crate::policy::clock::Clock;
use crate::repo::roster_repo::RosterRepository;
use log::{error, info};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

/// Per-run counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Entries that decoded successfully.
    pub scanned: usize,
    pub delivered: usize,
    pub disabled: usize,
    pub outside_window: usize,
    pub permission_denied: usize,
    pub service_failures: usize,
    /// Persisted records skipped because they could not be decoded.
    pub rejected_records: usize,
    /// The roster file itself could not be read.
    pub load_failed: bool,
}

impl RefreshReport {
    fn record(&mut self, outcome: &DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Delivered(_) => self.delivered += 1,
            DeliveryOutcome::Skipped(SkipReason::Disabled) => self.disabled += 1,
            DeliveryOutcome::Skipped(SkipReason::OutsideWarningWindow { .. }) => {
                self.outside_window += 1
            }
            DeliveryOutcome::Skipped(SkipReason::PermissionDenied) => {
                self.permission_denied += 1
            }
            DeliveryOutcome::Skipped(SkipReason::ServiceFailure) => self.service_failures += 1,
        }
    }
}

/// Background handler bound to one roster store and scheduler.
pub struct BackgroundRefreshTask<R: RosterRepository, N: NotificationService, C: Clock> {
    repo: R,
    scheduler: NotificationScheduler<N, C>,
}

impl<R: RosterRepository, N: NotificationService, C: Clock> BackgroundRefreshTask<R, N, C> {
    pub fn new(repo: R, scheduler: NotificationScheduler<N, C>) -> Self {
        Self { repo, scheduler }
    }

    /// Entry point invoked by the OS.
    pub fn run(&self) -> BackgroundFetchResult {
        self.run_with_report().0
    }

    /// Runs the re-check and returns the status plus counters.
    pub fn run_with_report(&self) -> (BackgroundFetchResult, RefreshReport) {
        let started_at = Instant::now();
        info!("event=background_refresh module=background status=start");

        let report = match catch_unwind(AssertUnwindSafe(|| self.refresh())) {
            Ok(report) => report,
            Err(_) => {
                error!("event=background_refresh module=background status=error error=panic");
                RefreshReport {
                    load_failed: true,
                    ..RefreshReport::default()
                }
            }
        };

        info!(
            "event=background_refresh module=background status=ok scanned={} delivered={} rejected={} load_failed={} duration_ms={}",
            report.scanned,
            report.delivered,
            report.rejected_records,
            report.load_failed,
            started_at.elapsed().as_millis()
        );
        (BackgroundFetchResult::NewData, report)
    }

    fn refresh(&self) -> RefreshReport {
        let mut report = RefreshReport::default();
        let scan = match self.repo.scan() {
            Ok(scan) => scan,
            Err(err) => {
                error!(
                    "event=background_refresh module=background status=error error={}",
                    err
                );
                report.load_failed = true;
                return report;
            }
        };

        report.scanned = scan.entries.len();
        report.rejected_records = scan.rejected.len();
        for entry in &scan.entries {
            let outcome = self.scheduler.fire_immediate(entry);
            report.record(&outcome);
        }
        report
    }
}
