//! Core business logic for yamdb-rs.

pub mod services;
pub mod validation;

pub use services::*;
