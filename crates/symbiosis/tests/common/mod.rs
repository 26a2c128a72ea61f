//! Shared test utilities for symbiosis integration tests.
//!
//! This module provides:
//! - `TestHarness` wiring a real SQLite store and blob storage to scripted
//!   collaborators
//! - `ScriptedOracle` and `QueueParser` test doubles
//! - Builders for profiles, conversion estimates and configs

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{QueueParser, ScriptedOracle, TestHarness};
