//! Shared type definitions.

pub mod id;
pub mod order_state;

pub use id::*;
pub use order_state::{Actor, OrderState, TransitionError};
