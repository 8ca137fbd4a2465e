//! User management and profile endpoints.

use axum::{
    Json, Router,
    extract::{OriginalUri, State},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use yamdb_common::AppResult;
use yamdb_core::{Action, CreateUserInput, Policy, UpdateUserInput, allow};
use yamdb_db::entities::user::{self, UserRole};

use crate::{
    extractors::{AuthUser, MaybeAuthUser, PageParams, PathParams, Payload, QueryParams},
    middleware::AppState,
    response::{Paginated, created, no_content},
};

/// Create user router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/", get(list_users).post(create_user))
        .route("/users/me/", get(get_me).patch(update_me))
        .route(
            "/users/{username}/",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

/// User response.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub role: UserRole,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            role: user.role,
        }
    }
}

/// List users (admin only).
async fn list_users(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    QueryParams(page): QueryParams<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> AppResult<Paginated<UserResponse>> {
    allow(actor.user(), Policy::AdminOnly, Action::Read, None)?;

    let result = state
        .user_service
        .list(page.limit(), page.offset())
        .await?;

    Ok(Paginated::new(
        result.items.into_iter().map(UserResponse::from).collect(),
        result.count,
        &page,
        &uri,
    ))
}

/// Create a user (admin only).
async fn create_user(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    payload: Payload,
) -> AppResult<Response> {
    allow(actor.user(), Policy::AdminOnly, Action::Create, None)?;

    let input: CreateUserInput = payload.decode()?;
    let user = state.user_service.create(input).await?;

    Ok(created(UserResponse::from(user)))
}

/// Get a user by username (admin only).
async fn get_user(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    PathParams(username): PathParams<String>,
) -> AppResult<Json<UserResponse>> {
    allow(actor.user(), Policy::AdminOnly, Action::Read, None)?;

    let user = state.user_service.get_by_username(&username).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Update a user, role included (admin only).
async fn update_user(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    PathParams(username): PathParams<String>,
    payload: Payload,
) -> AppResult<Json<UserResponse>> {
    allow(actor.user(), Policy::AdminOnly, Action::Update, None)?;

    let user = state.user_service.get_by_username(&username).await?;
    let input: UpdateUserInput = payload.decode()?;
    let user = state.user_service.update(user, input).await?;

    Ok(Json(UserResponse::from(user)))
}

/// Delete a user (admin only).
async fn delete_user(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    PathParams(username): PathParams<String>,
) -> AppResult<impl IntoResponse> {
    allow(actor.user(), Policy::AdminOnly, Action::Delete, None)?;

    let user = state.user_service.get_by_username(&username).await?;
    state.user_service.delete(&user).await?;

    Ok(no_content())
}

/// The caller's own profile.
async fn get_me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

/// Update the caller's own profile. `role` is read-only here.
async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Payload,
) -> AppResult<Json<UserResponse>> {
    let input: UpdateUserInput = payload.decode()?;
    let user = state.user_service.update_me(user, input).await?;

    Ok(Json(UserResponse::from(user)))
}
