//! Category endpoints.

use axum::{
    Router,
    extract::{OriginalUri, State},
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use serde::{Deserialize, Serialize};
use yamdb_common::AppResult;
use yamdb_core::{Action, CreateCategoryInput, Policy, allow};
use yamdb_db::entities::category;

use crate::{
    extractors::{MaybeAuthUser, PageParams, PathParams, Payload, QueryParams},
    middleware::AppState,
    response::{Paginated, created, no_content},
};

/// Create category router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories/", get(list_categories).post(create_category))
        .route("/categories/{slug}/", delete(delete_category))
}

/// Category response.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryResponse {
    pub name: String,
    pub slug: String,
}

impl From<category::Model> for CategoryResponse {
    fn from(category: category::Model) -> Self {
        Self {
            name: category.name,
            slug: category.slug,
        }
    }
}

/// `?search=` on the name.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// List categories.
async fn list_categories(
    State(state): State<AppState>,
    QueryParams(page): QueryParams<PageParams>,
    QueryParams(query): QueryParams<SearchQuery>,
    OriginalUri(uri): OriginalUri,
) -> AppResult<Paginated<CategoryResponse>> {
    let result = state
        .category_service
        .list(query.search.as_deref(), page.limit(), page.offset())
        .await?;

    Ok(Paginated::new(
        result.items.into_iter().map(CategoryResponse::from).collect(),
        result.count,
        &page,
        &uri,
    ))
}

/// Create a category (admin only).
async fn create_category(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    payload: Payload,
) -> AppResult<Response> {
    allow(actor.user(), Policy::AdminOrReadOnly, Action::Create, None)?;

    let input: CreateCategoryInput = payload.decode()?;
    let category = state.category_service.create(input).await?;

    Ok(created(CategoryResponse::from(category)))
}

/// Delete a category (admin only).
async fn delete_category(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    PathParams(slug): PathParams<String>,
) -> AppResult<impl IntoResponse> {
    allow(actor.user(), Policy::AdminOrReadOnly, Action::Delete, None)?;

    let category = state.category_service.get_by_slug(&slug).await?;
    state.category_service.delete(&category).await?;

    Ok(no_content())
}
