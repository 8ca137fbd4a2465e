//! Signup and token endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::Serialize;
use yamdb_common::AppResult;
use yamdb_core::{SignupInput, TokenInput};

use crate::{extractors::Payload, middleware::AppState};

/// Create auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup/", post(signup))
        .route("/auth/token/", post(token))
}

/// Signup response.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub username: String,
    pub email: String,
}

/// Register, or ask for a new code, and get the code by mail.
async fn signup(
    State(state): State<AppState>,
    payload: Payload,
) -> AppResult<Json<SignupResponse>> {
    let input: SignupInput = payload.decode()?;
    let user = state.account_service.signup(input).await?;

    Ok(Json(SignupResponse {
        username: user.username,
        email: user.email,
    }))
}

/// Token response.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Exchange a confirmation code for an access token.
async fn token(
    State(state): State<AppState>,
    payload: Payload,
) -> AppResult<Json<TokenResponse>> {
    let input: TokenInput = payload.decode()?;
    let token = state.account_service.obtain_token(input).await?;

    Ok(Json(TokenResponse { token }))
}
