//! Review endpoints, nested under a title.

use axum::{
    Json, Router,
    extract::{OriginalUri, State},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use yamdb_common::{AppError, AppResult};
use yamdb_core::{Action, CreateReviewInput, Policy, ReviewWithAuthor, UpdateReviewInput, allow};

use crate::{
    extractors::{MaybeAuthUser, PageParams, PathParams, Payload, QueryParams},
    middleware::AppState,
    response::{Paginated, created, no_content},
};

/// Create review router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/titles/{title_id}/reviews/",
            get(list_reviews).post(create_review),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/",
            get(get_review)
                .patch(patch_review)
                .put(put_review)
                .delete(delete_review),
        )
}

/// Review response.
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: i64,
    pub text: String,
    /// Author's username.
    pub author: String,
    pub score: i32,
    pub pub_date: DateTime<FixedOffset>,
}

impl From<ReviewWithAuthor> for ReviewResponse {
    fn from(item: ReviewWithAuthor) -> Self {
        Self {
            id: item.review.id,
            text: item.review.text,
            author: item.author,
            score: item.review.score,
            pub_date: item.review.pub_date,
        }
    }
}

/// List a title's reviews.
async fn list_reviews(
    State(state): State<AppState>,
    PathParams(title_id): PathParams<i64>,
    QueryParams(page): QueryParams<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> AppResult<Paginated<ReviewResponse>> {
    let title = state.title_service.get_model(title_id).await?;
    let result = state
        .review_service
        .list(&title, page.limit(), page.offset())
        .await?;

    Ok(Paginated::new(
        result.items.into_iter().map(ReviewResponse::from).collect(),
        result.count,
        &page,
        &uri,
    ))
}

/// Get one review.
async fn get_review(
    State(state): State<AppState>,
    PathParams((title_id, review_id)): PathParams<(i64, i64)>,
) -> AppResult<Json<ReviewResponse>> {
    let title = state.title_service.get_model(title_id).await?;
    let review = state.review_service.get(&title, review_id).await?;
    let review = state.review_service.with_author(review).await?;

    Ok(Json(ReviewResponse::from(review)))
}

/// Review a title as the signed-in user.
async fn create_review(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    PathParams(title_id): PathParams<i64>,
    payload: Payload,
) -> AppResult<Response> {
    let title = state.title_service.get_model(title_id).await?;
    allow(actor.user(), Policy::AuthorOrStaff, Action::Create, None)?;
    let author = actor.user().ok_or(AppError::Unauthorized)?;

    let input: CreateReviewInput = payload.decode()?;
    let review = state.review_service.create(&title, author, input).await?;

    Ok(created(ReviewResponse::from(review)))
}

/// Partially update a review (author or staff).
async fn patch_review(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    PathParams((title_id, review_id)): PathParams<(i64, i64)>,
    payload: Payload,
) -> AppResult<Json<ReviewResponse>> {
    let title = state.title_service.get_model(title_id).await?;
    let review = state.review_service.get(&title, review_id).await?;
    allow(
        actor.user(),
        Policy::AuthorOrStaff,
        Action::Update,
        Some(review.author_id),
    )?;

    let input: UpdateReviewInput = payload.decode()?;
    let review = state.review_service.update(review, input).await?;

    Ok(Json(ReviewResponse::from(review)))
}

/// Replace a review's text and score (author or staff).
async fn put_review(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    PathParams((title_id, review_id)): PathParams<(i64, i64)>,
    payload: Payload,
) -> AppResult<Json<ReviewResponse>> {
    let title = state.title_service.get_model(title_id).await?;
    let review = state.review_service.get(&title, review_id).await?;
    allow(
        actor.user(),
        Policy::AuthorOrStaff,
        Action::Update,
        Some(review.author_id),
    )?;

    let input: CreateReviewInput = payload.decode()?;
    let review = state.review_service.update(review, input.into()).await?;

    Ok(Json(ReviewResponse::from(review)))
}

/// Delete a review with its comments (author or staff).
async fn delete_review(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    PathParams((title_id, review_id)): PathParams<(i64, i64)>,
) -> AppResult<impl IntoResponse> {
    let title = state.title_service.get_model(title_id).await?;
    let review = state.review_service.get(&title, review_id).await?;
    allow(
        actor.user(),
        Policy::AuthorOrStaff,
        Action::Delete,
        Some(review.author_id),
    )?;

    state.review_service.delete(&review).await?;

    Ok(no_content())
}
