//! Title endpoints.

use axum::{
    Json, Router,
    extract::{OriginalUri, State},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use yamdb_common::AppResult;
use yamdb_core::{Action, CreateTitleInput, Policy, TitleDetails, UpdateTitleInput, allow};
use yamdb_db::repositories::TitleFilter;

use crate::{
    endpoints::{categories::CategoryResponse, genres::GenreResponse},
    extractors::{MaybeAuthUser, PageParams, PathParams, Payload, QueryParams},
    middleware::AppState,
    response::{Paginated, created, no_content},
};

/// Create title router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/titles/", get(list_titles).post(create_title))
        .route(
            "/titles/{title_id}/",
            get(get_title)
                .patch(patch_title)
                .put(put_title)
                .delete(delete_title),
        )
}

/// Title as read by clients.
#[derive(Debug, Serialize)]
pub struct TitleResponse {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub rating: Option<i32>,
    pub description: Option<String>,
    pub genre: Vec<GenreResponse>,
    pub category: Option<CategoryResponse>,
}

impl From<TitleDetails> for TitleResponse {
    fn from(details: TitleDetails) -> Self {
        Self {
            id: details.title.id,
            name: details.title.name,
            year: details.title.year,
            rating: details.rating,
            description: details.title.description,
            genre: details.genres.into_iter().map(GenreResponse::from).collect(),
            category: details.category.map(CategoryResponse::from),
        }
    }
}

/// Title as echoed after a write, with genre and category as slugs.
#[derive(Debug, Serialize)]
pub struct TitleWriteResponse {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub genre: Vec<String>,
    pub category: Option<String>,
}

impl From<TitleDetails> for TitleWriteResponse {
    fn from(details: TitleDetails) -> Self {
        Self {
            id: details.title.id,
            name: details.title.name,
            year: details.title.year,
            description: details.title.description,
            genre: details.genres.into_iter().map(|g| g.slug).collect(),
            category: details.category.map(|c| c.slug),
        }
    }
}

/// Title list filters.
#[derive(Debug, Default, Deserialize)]
pub struct TitleQuery {
    /// Category slug.
    pub category: Option<String>,
    /// Genre slug.
    pub genre: Option<String>,
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
    pub year: Option<i32>,
}

impl From<TitleQuery> for TitleFilter {
    fn from(query: TitleQuery) -> Self {
        Self {
            category: query.category,
            genre: query.genre,
            name: query.name,
            year: query.year,
        }
    }
}

/// List titles.
async fn list_titles(
    State(state): State<AppState>,
    QueryParams(page): QueryParams<PageParams>,
    QueryParams(query): QueryParams<TitleQuery>,
    OriginalUri(uri): OriginalUri,
) -> AppResult<Paginated<TitleResponse>> {
    let filter = TitleFilter::from(query);
    let result = state
        .title_service
        .list(&filter, page.limit(), page.offset())
        .await?;

    Ok(Paginated::new(
        result.items.into_iter().map(TitleResponse::from).collect(),
        result.count,
        &page,
        &uri,
    ))
}

/// Get a title with its rating.
async fn get_title(
    State(state): State<AppState>,
    PathParams(title_id): PathParams<i64>,
) -> AppResult<Json<TitleResponse>> {
    let details = state.title_service.get(title_id).await?;
    Ok(Json(TitleResponse::from(details)))
}

/// Create a title (admin only).
async fn create_title(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    payload: Payload,
) -> AppResult<Response> {
    allow(actor.user(), Policy::AdminOrReadOnly, Action::Create, None)?;

    let input: CreateTitleInput = payload.decode()?;
    let details = state.title_service.create(input).await?;

    Ok(created(TitleWriteResponse::from(details)))
}

/// Partially update a title (admin only).
async fn patch_title(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    PathParams(title_id): PathParams<i64>,
    payload: Payload,
) -> AppResult<Json<TitleWriteResponse>> {
    allow(actor.user(), Policy::AdminOrReadOnly, Action::Update, None)?;
    let title = state.title_service.get_model(title_id).await?;

    let input: UpdateTitleInput = payload.decode()?;
    let details = state.title_service.update(title, input).await?;

    Ok(Json(TitleWriteResponse::from(details)))
}

/// Replace a title (admin only).
async fn put_title(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    PathParams(title_id): PathParams<i64>,
    payload: Payload,
) -> AppResult<Json<TitleWriteResponse>> {
    allow(actor.user(), Policy::AdminOrReadOnly, Action::Update, None)?;
    let title = state.title_service.get_model(title_id).await?;

    let input: CreateTitleInput = payload.decode()?;
    let details = state.title_service.update(title, input.into()).await?;

    Ok(Json(TitleWriteResponse::from(details)))
}

/// Delete a title with its reviews (admin only).
async fn delete_title(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    PathParams(title_id): PathParams<i64>,
) -> AppResult<impl IntoResponse> {
    allow(actor.user(), Policy::AdminOrReadOnly, Action::Delete, None)?;
    let title = state.title_service.get_model(title_id).await?;

    state.title_service.delete(&title).await?;

    Ok(no_content())
}
