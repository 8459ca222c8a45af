//! Expiration reminders.
//!
//! # Responsibility
//! - Define the notification collaborator contract implemented by the host.
//! - Decide when a roster entry gets a repeating reminder, an immediate
//!   alert, or nothing.
//!
//! # Invariants
//! - Scheduling, cancel and permission failures never propagate past the
//!   scheduler; they are logged and reported as outcomes.
//! - At most one live notification exists per roster entry.

pub mod scheduler;
pub mod service;
