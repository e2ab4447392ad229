//! In-memory store implementations for tests
//!
//! These stand in for PostgreSQL so the pipeline and the settings logic can be exercised
//! without a database. Both support failure injection.

pub mod memory_stores;

pub use memory_stores::*;
