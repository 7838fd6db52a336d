//! HTTP API layer

pub mod error;
pub mod health;
pub mod openapi;
pub mod scan;
pub mod schedule;

pub use error::ApiError;
