//! HTTP handlers for endlist-api.

pub mod events;
pub mod health;
