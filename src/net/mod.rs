//! Network layer.
//!
//! Binds the inbound TCP listener. Connection handling itself belongs to
//! `axum::serve`, which spawns one task per connection.

pub mod listener;

pub use listener::{bind, ListenerError};
