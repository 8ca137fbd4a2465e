//! Comment endpoints, nested under a review.

use axum::{
    Json, Router,
    extract::{OriginalUri, State},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use yamdb_common::{AppError, AppResult};
use yamdb_core::{
    Action, CommentWithAuthor, CreateCommentInput, Policy, UpdateCommentInput, allow,
};
use yamdb_db::entities::review;

use crate::{
    extractors::{MaybeAuthUser, PageParams, PathParams, Payload, QueryParams},
    middleware::AppState,
    response::{Paginated, created, no_content},
};

/// Create comment router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/",
            get(list_comments).post(create_comment),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}/",
            get(get_comment)
                .patch(patch_comment)
                .put(put_comment)
                .delete(delete_comment),
        )
}

/// Comment response.
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub text: String,
    /// Author's username.
    pub author: String,
    pub pub_date: DateTime<FixedOffset>,
}

impl From<CommentWithAuthor> for CommentResponse {
    fn from(item: CommentWithAuthor) -> Self {
        Self {
            id: item.comment.id,
            text: item.comment.text,
            author: item.author,
            pub_date: item.comment.pub_date,
        }
    }
}

/// Resolve the title, then the review inside it.
async fn parent_review(
    state: &AppState,
    title_id: i64,
    review_id: i64,
) -> AppResult<review::Model> {
    let title = state.title_service.get_model(title_id).await?;
    state.review_service.get(&title, review_id).await
}

/// List a review's comments.
async fn list_comments(
    State(state): State<AppState>,
    PathParams((title_id, review_id)): PathParams<(i64, i64)>,
    QueryParams(page): QueryParams<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> AppResult<Paginated<CommentResponse>> {
    let review = parent_review(&state, title_id, review_id).await?;
    let result = state
        .comment_service
        .list(&review, page.limit(), page.offset())
        .await?;

    Ok(Paginated::new(
        result.items.into_iter().map(CommentResponse::from).collect(),
        result.count,
        &page,
        &uri,
    ))
}

/// Get one comment.
async fn get_comment(
    State(state): State<AppState>,
    PathParams((title_id, review_id, comment_id)): PathParams<(i64, i64, i64)>,
) -> AppResult<Json<CommentResponse>> {
    let review = parent_review(&state, title_id, review_id).await?;
    let comment = state.comment_service.get(&review, comment_id).await?;
    let comment = state.comment_service.with_author(comment).await?;

    Ok(Json(CommentResponse::from(comment)))
}

/// Comment on a review as the signed-in user.
async fn create_comment(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    PathParams((title_id, review_id)): PathParams<(i64, i64)>,
    payload: Payload,
) -> AppResult<Response> {
    let review = parent_review(&state, title_id, review_id).await?;
    allow(actor.user(), Policy::AuthorOrStaff, Action::Create, None)?;
    let author = actor.user().ok_or(AppError::Unauthorized)?;

    let input: CreateCommentInput = payload.decode()?;
    let comment = state.comment_service.create(&review, author, input).await?;

    Ok(created(CommentResponse::from(comment)))
}

/// Partially update a comment (author or staff).
async fn patch_comment(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    PathParams((title_id, review_id, comment_id)): PathParams<(i64, i64, i64)>,
    payload: Payload,
) -> AppResult<Json<CommentResponse>> {
    let review = parent_review(&state, title_id, review_id).await?;
    let comment = state.comment_service.get(&review, comment_id).await?;
    allow(
        actor.user(),
        Policy::AuthorOrStaff,
        Action::Update,
        Some(comment.author_id),
    )?;

    let input: UpdateCommentInput = payload.decode()?;
    let comment = state.comment_service.update(comment, input).await?;

    Ok(Json(CommentResponse::from(comment)))
}

/// Replace a comment's text (author or staff).
async fn put_comment(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    PathParams((title_id, review_id, comment_id)): PathParams<(i64, i64, i64)>,
    payload: Payload,
) -> AppResult<Json<CommentResponse>> {
    let review = parent_review(&state, title_id, review_id).await?;
    let comment = state.comment_service.get(&review, comment_id).await?;
    allow(
        actor.user(),
        Policy::AuthorOrStaff,
        Action::Update,
        Some(comment.author_id),
    )?;

    let input: CreateCommentInput = payload.decode()?;
    let comment = state.comment_service.update(comment, input.into()).await?;

    Ok(Json(CommentResponse::from(comment)))
}

/// Delete a comment (author or staff).
async fn delete_comment(
    State(state): State<AppState>,
    actor: MaybeAuthUser,
    PathParams((title_id, review_id, comment_id)): PathParams<(i64, i64, i64)>,
) -> AppResult<impl IntoResponse> {
    let review = parent_review(&state, title_id, review_id).await?;
    let comment = state.comment_service.get(&review, comment_id).await?;
    allow(
        actor.user(),
        Policy::AuthorOrStaff,
        Action::Delete,
        Some(comment.author_id),
    )?;

    state.comment_service.delete(&comment).await?;

    Ok(no_content())
}
