//! Roster use-case service.
//!
//! # Responsibility
//! - Provide add/edit/delete/toggle entry points for the UI shell.
//! - Reconcile reminders with every mutation and persist full snapshots.
//! - Keep the in-memory view sorted by expiration date.
//!
//! # Invariants
//! - Mutation order is cancel old -> compute -> schedule new -> save -> reload.
//! - A failed save leaves the in-memory view untouched.
//! - Entries are addressed by `EntryId` only.

use crate::model::entry::{
    parse_expiration_date, EntryId, EntryValidationError, RosterEntry,
};
use crate::notify::scheduler::NotificationScheduler;
use crate::notify::service::NotificationService;
use crate::policy::clock::Clock;
use crate::policy::expiration::{classify, days_remaining, ExpirationRisk};
use crate::repo::roster_repo::{RosterRepository, StorageError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for roster use-cases.
#[derive(Debug)]
pub enum RosterServiceError {
    /// Input failed validation; nothing was changed.
    Validation(EntryValidationError),
    /// No entry with this id exists in the current view.
    EntryNotFound(EntryId),
    /// Persistence failed; the in-memory view is unchanged.
    Storage(StorageError),
}

impl Display for RosterServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::EntryNotFound(id) => write!(f, "roster entry not found: {id}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RosterServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::EntryNotFound(_) => None,
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<EntryValidationError> for RosterServiceError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for RosterServiceError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

pub type RosterServiceResult<T> = Result<T, RosterServiceError>;

/// Form input for add and edit flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInput {
    pub name: String,
    pub license_id: String,
    /// `YYYY-MM-DD`.
    pub expiration_date: String,
}

/// Entry plus its risk as of the service clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStatus {
    pub entry: RosterEntry,
    pub days_remaining: i64,
    pub risk: ExpirationRisk,
}

/// Roster facade over a record store and a notification scheduler.
pub struct RosterService<R: RosterRepository, N: NotificationService, C: Clock> {
    repo: R,
    scheduler: NotificationScheduler<N, C>,
    entries: Vec<RosterEntry>,
}

impl<R: RosterRepository, N: NotificationService, C: Clock> RosterService<R, N, C> {
    /// Creates the service and loads the initial view (seeding on first use).
    pub fn open(repo: R, scheduler: NotificationScheduler<N, C>) -> RosterServiceResult<Self> {
        let mut service = Self {
            repo,
            scheduler,
            entries: Vec::new(),
        };
        service.reload()?;
        Ok(service)
    }

    pub fn scheduler(&self) -> &NotificationScheduler<N, C> {
        &self.scheduler
    }

    /// Current view, sorted by ascending expiration date.
    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, id: EntryId) -> Option<&RosterEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Current view annotated with days remaining and risk class.
    pub fn statuses(&self) -> Vec<EntryStatus> {
        let now = self.scheduler.clock().now();
        self.entries
            .iter()
            .map(|entry| {
                let days = days_remaining(entry.expiration_date, &now);
                EntryStatus {
                    entry: entry.clone(),
                    days_remaining: days,
                    risk: classify(days),
                }
            })
            .collect()
    }

    /// Reloads the view from the record store.
    ///
    /// # Errors
    /// Returns `Storage` and keeps the previous view when loading fails.
    pub fn refresh(&mut self) -> RosterServiceResult<&[RosterEntry]> {
        self.reload()?;
        Ok(&self.entries)
    }

    /// Adds one entry with reminders enabled and schedules its reminder.
    pub fn add_entry(&mut self, input: &EntryInput) -> RosterServiceResult<RosterEntry> {
        let mut entry = entry_from_input(input)?;
        entry.schedule = self.scheduler.schedule(&entry).into_schedule();

        let mut next = self.entries.clone();
        next.push(entry.clone());
        if let Err(err) = self.persist(next) {
            self.scheduler.cancel_schedule(&entry.schedule);
            return Err(err);
        }

        info!(
            "event=roster_add module=service status=ok entry_id={} scheduled={}",
            entry.id,
            entry.schedule.is_scheduled()
        );
        Ok(entry)
    }

    /// Replaces name, license id and expiration date of one entry and
    /// reschedules its reminder.
    pub fn edit_entry(
        &mut self,
        id: EntryId,
        input: &EntryInput,
    ) -> RosterServiceResult<RosterEntry> {
        let index = self.index_of(id)?;
        let edited = entry_from_input(input)?;
        let current = &self.entries[index];

        self.scheduler.cancel_schedule(&current.schedule);

        let mut updated = current.clone();
        updated.name = edited.name;
        updated.license_id = edited.license_id;
        updated.expiration_date = edited.expiration_date;
        updated.schedule = self.scheduler.schedule(&updated).into_schedule();

        let mut next = self.entries.clone();
        next[index] = updated.clone();
        if let Err(err) = self.persist(next) {
            self.scheduler.cancel_schedule(&updated.schedule);
            return Err(err);
        }

        info!(
            "event=roster_edit module=service status=ok entry_id={} scheduled={}",
            updated.id,
            updated.schedule.is_scheduled()
        );
        Ok(updated)
    }

    /// Removes one entry and cancels its reminder.
    pub fn delete_entry(&mut self, id: EntryId) -> RosterServiceResult<()> {
        let index = self.index_of(id)?;
        self.scheduler.cancel_schedule(&self.entries[index].schedule);

        let mut next = self.entries.clone();
        next.remove(index);
        self.persist(next)?;

        info!(
            "event=roster_delete module=service status=ok entry_id={}",
            id
        );
        Ok(())
    }

    /// Flips the reminder switch of one entry.
    ///
    /// Turning reminders back on does not schedule anything by itself.
    pub fn toggle_notifications(&mut self, id: EntryId) -> RosterServiceResult<RosterEntry> {
        let index = self.index_of(id)?;
        let updated = self.scheduler.toggle(&self.entries[index]);

        let mut next = self.entries.clone();
        next[index] = updated.clone();
        self.persist(next)?;
        Ok(updated)
    }

    fn reload(&mut self) -> RosterServiceResult<()> {
        let mut loaded = self.repo.load()?;
        sort_for_display(&mut loaded);
        self.entries = loaded;
        Ok(())
    }

    fn index_of(&self, id: EntryId) -> RosterServiceResult<usize> {
        self.entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(RosterServiceError::EntryNotFound(id))
    }

    fn persist(&mut self, mut next: Vec<RosterEntry>) -> RosterServiceResult<()> {
        if let Err(err) = self.repo.save(&next) {
            error!(
                "event=roster_persist module=service status=error error={}",
                err
            );
            return Err(err.into());
        }

        if let Err(err) = self.reload() {
            // The snapshot on disk is exactly `next`; fall back to it.
            warn!(
                "event=roster_refresh module=service status=error error={}",
                err
            );
            sort_for_display(&mut next);
            self.entries = next;
        }
        Ok(())
    }
}

fn entry_from_input(input: &EntryInput) -> Result<RosterEntry, EntryValidationError> {
    let expiration_date = parse_expiration_date(&input.expiration_date)?;
    let entry = RosterEntry::new(
        input.name.trim(),
        input.license_id.trim(),
        expiration_date,
    );
    entry.validate()?;
    Ok(entry)
}

fn sort_for_display(entries: &mut [RosterEntry]) {
    entries.sort_by_key(|entry| entry.expiration_date);
}
