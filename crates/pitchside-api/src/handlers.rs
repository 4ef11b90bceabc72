//! Request handlers.

pub mod health;
pub mod live;

pub use health::{health, ready};
