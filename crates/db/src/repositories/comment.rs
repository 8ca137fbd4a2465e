//! Comment repository.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use yamdb_common::{AppError, AppResult};

use crate::entities::{Comment, comment};
use crate::map_db_err;

/// Repository for comment operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get a comment by ID within a review, failing with `NotFound`.
    pub async fn get_in_review(&self, review_id: i64, id: i64) -> AppResult<comment::Model> {
        Comment::find_by_id(id)
            .filter(comment::Column::ReviewId.eq(review_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Comment not found: {id}")))
    }

    /// List comments on a review, newest first.
    pub async fn list_by_review(
        &self,
        review_id: i64,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::ReviewId.eq(review_id))
            .order_by_desc(comment::Column::PubDate)
            .order_by_desc(comment::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count comments on a review.
    pub async fn count_by_review(&self, review_id: i64) -> AppResult<u64> {
        Comment::find()
            .filter(comment::Column::ReviewId.eq(review_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a comment.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Update a comment.
    pub async fn update(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model.update(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Delete a comment.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        Comment::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_comment(id: i64, review_id: i64, author_id: i64) -> comment::Model {
        comment::Model {
            id,
            review_id,
            author_id,
            text: "Agreed".to_string(),
            pub_date: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_in_review() {
        let comment = create_test_comment(4, 3, 7);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[comment.clone()]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        assert_eq!(repo.get_in_review(3, 4).await.unwrap(), comment);
    }

    #[tokio::test]
    async fn test_get_in_review_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<comment::Model>::new()])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let result = repo.get_in_review(3, 99).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_count_by_review() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(5))
                }]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        assert_eq!(repo.count_by_review(3).await.unwrap(), 5);
    }
}
