//! Expiration rules and time source.
//!
//! # Responsibility
//! - Compute days remaining and risk class for a CMA expiration date.
//! - Provide an injectable clock so "now" is deterministic under test.
//!
//! # Invariants
//! - Policy functions are pure and perform no I/O.
//! - The 50-day warning window is a compile-time business rule.

pub mod clock;
pub mod expiration;
