//! Integration tests for Orderflow.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p orderflow-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `order_lifecycle` - State machine behavior across the order lifecycle
//! - `checkout_validation` - Checkout preconditions and error mapping
//!
//! The tests exercise the service crates as libraries; nothing here needs a
//! running database or SMTP relay. End-to-end tests against a live stack run
//! separately against a seeded database (`orderflow-cli seed`).
