//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate record store and scheduler calls into UI-level operations.
//! - Keep FFI callers decoupled from persistence and notification details.

pub mod roster_service;
