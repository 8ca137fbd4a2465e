//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use yamdb_core::{
    AccountService, CategoryService, CommentService, GenreService, ReviewService, TitleService,
    UserService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub user_service: UserService,
    pub category_service: CategoryService,
    pub genre_service: GenreService,
    pub title_service: TitleService,
    pub review_service: ReviewService,
    pub comment_service: CommentService,
}

/// Authentication middleware.
///
/// A request without a bearer token passes through anonymously. A token that
/// fails verification, or whose user is gone, ends the request with 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    if let Some(token) = token {
        match state.account_service.authenticate(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => return e.into_response(),
        }
    }

    next.run(req).await
}
