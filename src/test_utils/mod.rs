//! Test utilities for use case testing.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures
//! - In-memory repository implementations for mocking persistence

mod factories;
mod ledger_mocks;

pub use factories::*;
pub use ledger_mocks::*;
