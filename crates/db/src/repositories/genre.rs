//! Genre repository.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use yamdb_common::{AppError, AppResult};

use super::icontains;
use crate::entities::{Genre, genre};
use crate::map_db_err;

/// Repository for genre operations.
#[derive(Clone)]
pub struct GenreRepository {
    db: Arc<DatabaseConnection>,
}

impl GenreRepository {
    /// Create a new genre repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn search_query(search: Option<&str>) -> Select<Genre> {
        let mut query = Genre::find();
        if let Some(needle) = search {
            query = query.filter(icontains(genre::Column::Name, needle));
        }
        query
    }

    /// Find genre by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<genre::Model>> {
        Genre::find()
            .filter(genre::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find genres by slugs. Unknown slugs are simply absent from the result.
    pub async fn find_by_slugs(&self, slugs: &[String]) -> AppResult<Vec<genre::Model>> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }

        Genre::find()
            .filter(genre::Column::Slug.is_in(slugs.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List genres ordered by name, optionally filtered by a name substring.
    pub async fn list(
        &self,
        search: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<genre::Model>> {
        Self::search_query(search)
            .order_by_asc(genre::Column::Name)
            .order_by_asc(genre::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count genres matching the search.
    pub async fn count(&self, search: Option<&str>) -> AppResult<u64> {
        Self::search_query(search)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new genre.
    pub async fn create(&self, name: String, slug: String) -> AppResult<genre::Model> {
        let active_model = genre::ActiveModel {
            name: Set(name),
            slug: Set(slug),
            ..Default::default()
        };

        active_model
            .insert(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Delete a genre and its title links.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        Genre::delete_by_id(id)
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_genre(id: i64, name: &str, slug: &str) -> genre::Model {
        genre::Model {
            id,
            name: name.to_string(),
            slug: slug.to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_by_slug() {
        let genre = create_test_genre(1, "Drama", "drama");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[genre.clone()]])
                .into_connection(),
        );

        let repo = GenreRepository::new(db);
        let result = repo.find_by_slug("drama").await.unwrap();

        assert_eq!(result, Some(genre));
    }

    #[tokio::test]
    async fn test_list_with_search() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_genre(2, "Drama", "drama")]])
                .into_connection(),
        );

        let repo = GenreRepository::new(db);
        let result = repo.list(Some("dra"), 10, 0).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].slug, "drama");
    }

    #[tokio::test]
    async fn test_find_by_slugs_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = GenreRepository::new(db);
        assert!(repo.find_by_slugs(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .into_connection(),
        );

        let repo = GenreRepository::new(db);
        assert_eq!(repo.count(None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_create() {
        let genre = create_test_genre(1, "Comedy", "comedy");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[genre.clone()]])
                .into_connection(),
        );

        let repo = GenreRepository::new(db);
        let result = repo
            .create("Comedy".to_string(), "comedy".to_string())
            .await
            .unwrap();

        assert_eq!(result, genre);
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

        let repo = GenreRepository::new(db);
        assert!(repo.delete(1).await.is_ok());
    }
}
