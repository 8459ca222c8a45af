//! Flutter bridge for the CMA Watch core.

pub mod api;
