//! Orderflow order service library.
//!
//! The service fronts a procurement catalogue: authenticated buyers fill a
//! basket, check it out against live inventory and follow the resulting
//! order through its lifecycle; shop partners toggle availability and list
//! the orders they must assemble.
//!
//! The crate is a library so the HTTP surface and the checkout transactions
//! can be exercised from the integration-tests crate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
