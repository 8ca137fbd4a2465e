//! Common utilities and shared types for yamdb-rs.
//!
//! This crate provides foundational components used across all yamdb-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`],
//!   with field-level messages collected in [`FieldErrors`]
//!
//! # Example
//!
//! ```no_run
//! use yamdb_common::{AppResult, Config};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     println!("Listening on {}:{}", config.server.host, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;

pub use config::Config;
pub use error::{AppError, AppResult, FieldErrors};
