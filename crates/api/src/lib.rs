//! HTTP API layer for yamdb-rs.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: signup and token exchange, categories, genres, titles,
//!   reviews, comments and users
//! - **Extractors**: authentication, raw request payloads, query parameters
//! - **Middleware**: bearer token authentication
//!
//! Built on Axum 0.8. Every route is served under `/v1`.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
