//! Review repository.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use yamdb_common::{AppError, AppResult};

use crate::entities::{Review, review};
use crate::map_db_err;

/// Repository for review operations.
#[derive(Clone)]
pub struct ReviewRepository {
    db: Arc<DatabaseConnection>,
}

impl ReviewRepository {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a review by ID, scoped to its title.
    pub async fn find_in_title(
        &self,
        title_id: i64,
        id: i64,
    ) -> AppResult<Option<review::Model>> {
        Review::find_by_id(id)
            .filter(review::Column::TitleId.eq(title_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a review by ID within a title, failing with `NotFound`.
    pub async fn get_in_title(&self, title_id: i64, id: i64) -> AppResult<review::Model> {
        self.find_in_title(title_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review not found: {id}")))
    }

    /// Whether the author already reviewed the title.
    pub async fn exists_for_author(&self, author_id: i64, title_id: i64) -> AppResult<bool> {
        let count = Review::find()
            .filter(review::Column::AuthorId.eq(author_id))
            .filter(review::Column::TitleId.eq(title_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// List reviews of a title, newest first.
    pub async fn list_by_title(
        &self,
        title_id: i64,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<review::Model>> {
        Review::find()
            .filter(review::Column::TitleId.eq(title_id))
            .order_by_desc(review::Column::PubDate)
            .order_by_desc(review::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count reviews of a title.
    pub async fn count_by_title(&self, title_id: i64) -> AppResult<u64> {
        Review::find()
            .filter(review::Column::TitleId.eq(title_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a review. A second review by the same author for the same
    /// title violates the unique index and comes back as a validation error.
    pub async fn create(&self, model: review::ActiveModel) -> AppResult<review::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Update a review.
    pub async fn update(&self, model: review::ActiveModel) -> AppResult<review::Model> {
        model.update(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Delete a review and its comments.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        Review::delete_by_id(id)
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_review(id: i64, title_id: i64, author_id: i64, score: i32) -> review::Model {
        review::Model {
            id,
            title_id,
            author_id,
            text: "Worth it".to_string(),
            score,
            pub_date: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_in_title() {
        let review = create_test_review(3, 1, 7, 8);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[review.clone()]])
                .into_connection(),
        );

        let repo = ReviewRepository::new(db);
        let result = repo.get_in_title(1, 3).await.unwrap();

        assert_eq!(result, review);
    }

    #[tokio::test]
    async fn test_get_in_other_title_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<review::Model>::new()])
                .into_connection(),
        );

        let repo = ReviewRepository::new(db);
        let result = repo.get_in_title(2, 3).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_exists_for_author() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(1)) }],
                    [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(0)) }],
                ])
                .into_connection(),
        );

        let repo = ReviewRepository::new(db);
        assert!(repo.exists_for_author(7, 1).await.unwrap());
        assert!(!repo.exists_for_author(7, 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_by_title() {
        let reviews = vec![create_test_review(2, 1, 8, 10), create_test_review(1, 1, 7, 8)];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([reviews.clone()])
                .into_connection(),
        );

        let repo = ReviewRepository::new(db);
        let result = repo.list_by_title(1, 10, 0).await.unwrap();

        assert_eq!(result, reviews);
    }

    #[tokio::test]
    async fn test_create() {
        let review = create_test_review(1, 1, 7, 10);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[review.clone()]])
                .into_connection(),
        );

        let repo = ReviewRepository::new(db);
        let model = review::ActiveModel {
            title_id: Set(1),
            author_id: Set(7),
            text: Set("Worth it".to_string()),
            score: Set(10),
            pub_date: Set(review.pub_date),
            ..Default::default()
        };

        assert_eq!(repo.create(model).await.unwrap(), review);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = ReviewRepository::new(db);
        assert!(repo.delete(1).await.is_ok());
    }
}
