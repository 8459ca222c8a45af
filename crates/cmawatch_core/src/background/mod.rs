//! Periodic background re-check of the roster.
//!
//! # Responsibility
//! - Define the OS background-task collaborator contract.
//! - Run the daily re-check that alerts on due entries while the app is closed.
//! - Own registration lifecycle (idempotent register, explicit teardown).
//!
//! # Invariants
//! - A refresh run always reports a terminal status to the OS.
//! - Re-registration always unregisters the previous registration first.

pub mod refresh;
pub mod registration;
pub mod task_scheduler;
