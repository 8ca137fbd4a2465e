//! Comment service.

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;
use yamdb_common::AppResult;
use yamdb_db::{
    entities::{comment, review, user},
    repositories::{CommentRepository, UserRepository},
};

use super::Page;

/// Input for creating a comment, and for replacing one with PUT.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentInput {
    #[validate(length(min = 1))]
    pub text: String,
}

/// Partial update of a comment.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCommentInput {
    #[validate(length(min = 1))]
    pub text: Option<String>,
}

impl From<CreateCommentInput> for UpdateCommentInput {
    fn from(input: CreateCommentInput) -> Self {
        Self {
            text: Some(input.text),
        }
    }
}

/// A comment together with its author's username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentWithAuthor {
    pub comment: comment::Model,
    pub author: String,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    user_repo: UserRepository,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(comment_repo: CommentRepository, user_repo: UserRepository) -> Self {
        Self {
            comment_repo,
            user_repo,
        }
    }

    /// List comments on a review, newest first.
    pub async fn list(
        &self,
        review: &review::Model,
        limit: u64,
        offset: u64,
    ) -> AppResult<Page<CommentWithAuthor>> {
        let count = self.comment_repo.count_by_review(review.id).await?;
        let comments = self
            .comment_repo
            .list_by_review(review.id, limit, offset)
            .await?;

        let author_ids: Vec<i64> = comments.iter().map(|c| c.author_id).collect();
        let names = self.user_repo.usernames_by_ids(&author_ids).await?;

        let items = comments
            .into_iter()
            .map(|comment| CommentWithAuthor {
                author: names.get(&comment.author_id).cloned().unwrap_or_default(),
                comment,
            })
            .collect();

        Ok(Page { items, count })
    }

    /// Get a comment that belongs to the review.
    pub async fn get(&self, review: &review::Model, id: i64) -> AppResult<comment::Model> {
        self.comment_repo.get_in_review(review.id, id).await
    }

    /// Attach the author's username.
    pub async fn with_author(&self, comment: comment::Model) -> AppResult<CommentWithAuthor> {
        let author = self
            .user_repo
            .find_by_id(comment.author_id)
            .await?
            .map(|u| u.username)
            .unwrap_or_default();

        Ok(CommentWithAuthor { comment, author })
    }

    /// Comment on a review as `author`.
    pub async fn create(
        &self,
        review: &review::Model,
        author: &user::Model,
        input: CreateCommentInput,
    ) -> AppResult<CommentWithAuthor> {
        input.validate()?;

        let model = comment::ActiveModel {
            review_id: Set(review.id),
            author_id: Set(author.id),
            text: Set(input.text),
            pub_date: Set(Utc::now().into()),
            ..Default::default()
        };

        let comment = self.comment_repo.create(model).await?;
        tracing::info!(
            comment_id = comment.id,
            review_id = review.id,
            author = %author.username,
            "Comment created"
        );

        Ok(CommentWithAuthor {
            comment,
            author: author.username.clone(),
        })
    }

    /// Update a comment's text.
    pub async fn update(
        &self,
        comment: comment::Model,
        input: UpdateCommentInput,
    ) -> AppResult<CommentWithAuthor> {
        input.validate()?;

        let mut active: comment::ActiveModel = comment.into();
        if let Some(text) = input.text {
            active.text = Set(text);
        }

        let comment = self.comment_repo.update(active).await?;
        self.with_author(comment).await
    }

    /// Delete a comment.
    pub async fn delete(&self, comment: &comment::Model) -> AppResult<()> {
        self.comment_repo.delete(comment.id).await?;
        tracing::info!(comment_id = comment.id, "Comment deleted");
        Ok(())
    }
}
