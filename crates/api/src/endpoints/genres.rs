//! Genre endpoints.

use axum::{
    Router,
    extract::{OriginalUri, State},
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use serde::Serialize;
use yamdb_common::AppResult;
use yamdb_core::{Action, CreateGenreInput, Policy, allow};
use yamdb_db::entities::genre;

use crate::{
    endpoints::categories::SearchQuery,
    extractors::{MaybeAuthUser, PageParams, PathParams, Payload, QueryParams},
    middleware::AppState,
    response::{Paginated, created, no_content},
};

/// Create genre router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/genres/", get(list_genres).post(create_genre))
        .route("/genres/{slug}/", delete(delete_genre))
}

/// Genre response.
#[derive(Debug, Clone, Serialize)]
pub struct GenreResponse {
    pub name: String,
    pub slug: String,
}

impl From<genre::Model> for GenreResponse {
    fn from(genre: genre::Model) -> Self {
        Self {
            name: genre.name,
            slug: genre.slug,
        }
    }
}

/// List genres.
async fn list_genres(
    State(state): State<AppState>,
    QueryParams(page): QueryParams<PageParams>,
    QueryParams(query): QueryParams<SearchQuery>,
    OriginalUri(uri): OriginalUri,
) -> AppResult<Paginated<GenreResponse>> {
    let result = state
        .genre_service
        .list(query.search.as_deref(), page.limit(), page.offset())
        .await?;

    Ok(Paginated::new(
        result.items.into_iter().map(GenreResponse::from).collect(),
        result.count,
        &page,
        &uri,
    ))
}

/// Create a genre (admin only).
async fn create_genre(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    payload: Payload,
) -> AppResult<Response> {
    allow(actor.user(), Policy::AdminOrReadOnly, Action::Create, None)?;

    let input: CreateGenreInput = payload.decode()?;
    let genre = state.genre_service.create(input).await?;

    Ok(created(GenreResponse::from(genre)))
}

/// Delete a genre (admin only).
async fn delete_genre(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    PathParams(slug): PathParams<String>,
) -> AppResult<impl IntoResponse> {
    allow(actor.user(), Policy::AdminOrReadOnly, Action::Delete, None)?;

    let genre = state.genre_service.get_by_slug(&slug).await?;
    state.genre_service.delete(&genre).await?;

    Ok(no_content())
}
