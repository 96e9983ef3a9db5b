//! Domain types for the order service.
//!
//! Database row structs live next to the repositories that read them; the
//! types here are the validated domain objects handlers and serializers use.

pub mod contact;
pub mod inventory;
pub mod order;
pub mod user;

pub use contact::DeliveryContact;
pub use inventory::{LockedLine, RecordForBasket};
pub use order::{Order, OrderDetail, OrderLineView, OrderSummary};
pub use user::CurrentUser;
