//! Roster domain model.
//!
//! # Responsibility
//! - Define the canonical roster entry shared by store, scheduler and FFI.
//! - Keep schedule state explicit so an inert id is never mistaken for a
//!   live notification.
//!
//! # Invariants
//! - Every entry is identified by a stable `EntryId`.
//! - `NotificationSchedule::Scheduled` only holds ids the OS accepted.

pub mod entry;
