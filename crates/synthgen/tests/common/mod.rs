//! Shared test utilities for synthgen integration tests.
//!
//! This module provides:
//! - `TestHarness` wiring an in-memory ledger, a temp artifact store and a
//!   scripted generator into the orchestrator, query service and API
//! - `ScriptedGenerator` for deterministic success and failure sequences

pub mod harness;

pub use harness::{ScriptedGenerator, TestHarness};
