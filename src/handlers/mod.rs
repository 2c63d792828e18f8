//! HTTP handlers for entity CRUD, the gated app shell, and the SMS relay.

pub mod entity;
pub mod index;
pub mod sms;
pub use entity::EntityState;
pub use index::index;
pub use sms::send_sms;
