//! Roster persistence.
//!
//! # Responsibility
//! - Define the record store contract used by services and the background task.
//! - Keep the flat JSON file format inside the persistence boundary.
//!
//! # Invariants
//! - Every save writes a complete snapshot; partial writes never replace the
//!   previous file.
//! - Loading with no persisted file seeds from the bundled dataset exactly once.

pub mod roster_repo;
pub mod seed;
