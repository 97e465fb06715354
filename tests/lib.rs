//! OData Service Integration Test Suite
//!
//! ## Test Organization
//!
//! - `integration/composition` - Path composition across entity sets,
//!   properties and bound operations
//! - `integration/operations` - Action and function contracts: methods,
//!   bodies, preferences and return values
//! - `integration/access` - Read-only mode and gate policies
//! - `integration/negotiation` - `$format`, `Accept` and metadata levels
//!
//! ## Test Utilities
//!
//! - `common/` - The fixture service and request helpers
//!
//! ## Usage
//!
//! ```bash
//! cargo test --test lib
//! RUST_LOG=debug cargo test --test lib -- --nocapture
//! ```

pub mod common;
pub mod integration;
