//! # Title-Chain Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks of the sale workflow
//! └── src/integration/  # Cross-crate flows
//!     ├── flows.rs        # Sale cycles on the file-backed ledger
//!     ├── concurrency.rs  # Optimistic concurrency under interleaving
//!     └── node.rs         # CLI dispatch against a real ledger file
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p tc-tests
//!
//! # By category
//! cargo test -p tc-tests integration::concurrency::
//!
//! # Benchmarks
//! cargo bench -p tc-tests
//! ```

pub mod integration;
