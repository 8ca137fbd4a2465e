//! API endpoints.

mod auth;
mod categories;
mod comments;
mod genres;
mod reviews;
mod titles;
mod users;

use axum::Router;
use yamdb_common::AppError;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    let v1 = Router::new()
        .merge(auth::router())
        .merge(categories::router())
        .merge(genres::router())
        .merge(titles::router())
        .merge(reviews::router())
        .merge(comments::router())
        .merge(users::router())
        .method_not_allowed_fallback(method_not_allowed);

    Router::new().nest("/v1", v1)
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
