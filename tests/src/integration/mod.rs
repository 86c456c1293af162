//! # Integration Tests
//!
//! Flows that cross the registry, node and telemetry crates.

pub mod concurrency;
pub mod flows;
pub mod node;
