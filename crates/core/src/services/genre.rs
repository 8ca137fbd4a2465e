//! Genre service.

use serde::Deserialize;
use validator::Validate;
use yamdb_common::{AppError, AppResult};
use yamdb_db::{entities::genre, repositories::GenreRepository};

use super::Page;
use crate::validation::SLUG_RE;

/// Input for creating a genre.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGenreInput {
    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[validate(
        length(min = 1, max = 50),
        regex(path = *SLUG_RE, message = "slug may contain only latin letters, digits, '-' and '_'")
    )]
    pub slug: String,
}

/// Genre service for business logic.
#[derive(Clone)]
pub struct GenreService {
    genre_repo: GenreRepository,
}

impl GenreService {
    /// Create a new genre service.
    #[must_use]
    pub const fn new(genre_repo: GenreRepository) -> Self {
        Self { genre_repo }
    }

    /// List genres, optionally searching by name.
    pub async fn list(
        &self,
        search: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Page<genre::Model>> {
        let count = self.genre_repo.count(search).await?;
        let items = self.genre_repo.list(search, limit, offset).await?;
        Ok(Page { items, count })
    }

    /// Get a genre by slug.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<genre::Model> {
        self.genre_repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Genre not found: {slug}")))
    }

    /// Create a genre.
    pub async fn create(&self, input: CreateGenreInput) -> AppResult<genre::Model> {
        input.validate()?;

        if self.genre_repo.find_by_slug(&input.slug).await?.is_some() {
            return Err(AppError::field(
                "slug",
                "a genre with this slug already exists",
            ));
        }

        let genre = self.genre_repo.create(input.name, input.slug).await?;
        tracing::info!(slug = %genre.slug, "Genre created");
        Ok(genre)
    }

    /// Delete a genre. Titles drop it from their genre list.
    pub async fn delete(&self, genre: &genre::Model) -> AppResult<()> {
        self.genre_repo.delete(genre.id).await?;
        tracing::info!(slug = %genre.slug, "Genre deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_genre(id: i64, name: &str, slug: &str) -> genre::Model {
        genre::Model {
            id,
            name: name.to_string(),
            slug: slug.to_string(),
        }
    }

    fn service(db: MockDatabase) -> GenreService {
        GenreService::new(GenreRepository::new(Arc::new(db.into_connection())))
    }

    #[tokio::test]
    async fn test_list_counts_then_pages() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(12))
            }]])
            .append_query_results([[create_test_genre(1, "Horror", "horror")]]);

        let page = service(db).list(None, 1, 0).await.unwrap();

        assert_eq!(page.count, 12);
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_get_by_slug_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<genre::Model>::new()]);

        let result = service(db).get_by_slug("nope").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_slug_before_touching_db() {
        let db = MockDatabase::new(DatabaseBackend::Postgres);

        let result = service(db)
            .create(CreateGenreInput {
                name: "Drama".to_string(),
                slug: "drama & tv".to_string(),
            })
            .await;

        match result {
            Err(AppError::Validation(fields)) => assert!(fields.get("slug").is_some()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_long_slug() {
        let db = MockDatabase::new(DatabaseBackend::Postgres);

        let result = service(db)
            .create(CreateGenreInput {
                name: "Drama".to_string(),
                slug: "a".repeat(51),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_taken_slug() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_genre(1, "Drama", "drama")]]);

        let result = service(db)
            .create(CreateGenreInput {
                name: "Theatre".to_string(),
                slug: "drama".to_string(),
            })
            .await;

        match result {
            Err(AppError::Validation(fields)) => assert!(fields.get("slug").is_some()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create() {
        let created = create_test_genre(3, "Jazz", "jazz");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<genre::Model>::new()])
            .append_query_results([[created.clone()]]);

        let result = service(db)
            .create(CreateGenreInput {
                name: "Jazz".to_string(),
                slug: "jazz".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result, created);
    }
}
