//! Service layer: checkout/cancellation transactions and the notification
//! pipeline.

pub mod checkout;
pub mod email;
pub mod notifications;

pub use email::EmailService;
pub use notifications::{Notification, Notifier};
