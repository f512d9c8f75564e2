//! API handlers for the nimbus identity service.

pub mod auth;
pub mod health;
pub mod root;
