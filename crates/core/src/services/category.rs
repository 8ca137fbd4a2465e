//! Category service.

use serde::Deserialize;
use validator::Validate;
use yamdb_common::{AppError, AppResult};
use yamdb_db::{entities::category, repositories::CategoryRepository};

use super::Page;
use crate::validation::SLUG_RE;

/// Input for creating a category.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[validate(
        length(min = 1, max = 50),
        regex(path = *SLUG_RE, message = "slug may contain only latin letters, digits, '-' and '_'")
    )]
    pub slug: String,
}

/// Category service for business logic.
#[derive(Clone)]
pub struct CategoryService {
    category_repo: CategoryRepository,
}

impl CategoryService {
    /// Create a new category service.
    #[must_use]
    pub const fn new(category_repo: CategoryRepository) -> Self {
        Self { category_repo }
    }

    /// List categories, optionally searching by name.
    pub async fn list(
        &self,
        search: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Page<category::Model>> {
        let count = self.category_repo.count(search).await?;
        let items = self.category_repo.list(search, limit, offset).await?;
        Ok(Page { items, count })
    }

    /// Get a category by slug.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<category::Model> {
        self.category_repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category not found: {slug}")))
    }

    /// Create a category.
    pub async fn create(&self, input: CreateCategoryInput) -> AppResult<category::Model> {
        input.validate()?;

        if self.category_repo.find_by_slug(&input.slug).await?.is_some() {
            return Err(AppError::field(
                "slug",
                "a category with this slug already exists",
            ));
        }

        let category = self.category_repo.create(input.name, input.slug).await?;
        tracing::info!(slug = %category.slug, "Category created");
        Ok(category)
    }

    /// Delete a category. Its titles lose their category.
    pub async fn delete(&self, category: &category::Model) -> AppResult<()> {
        self.category_repo.delete(category.id).await?;
        tracing::info!(slug = %category.slug, "Category deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_category(id: i64, name: &str, slug: &str) -> category::Model {
        category::Model {
            id,
            name: name.to_string(),
            slug: slug.to_string(),
        }
    }

    fn service(db: MockDatabase) -> CategoryService {
        CategoryService::new(CategoryRepository::new(Arc::new(db.into_connection())))
    }

    #[tokio::test]
    async fn test_list_counts_then_pages() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(12))
            }]])
            .append_query_results([[create_test_category(1, "Books", "books")]]);

        let page = service(db).list(None, 1, 0).await.unwrap();

        assert_eq!(page.count, 12);
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_get_by_slug_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<category::Model>::new()]);

        let result = service(db).get_by_slug("nope").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_slug_before_touching_db() {
        let db = MockDatabase::new(DatabaseBackend::Postgres);

        let result = service(db)
            .create(CreateCategoryInput {
                name: "Films".to_string(),
                slug: "films & tv".to_string(),
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
            .create(CreateCategoryInput {
                name: "Films".to_string(),
                slug: "a".repeat(51),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_taken_slug() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_category(1, "Films", "films")]]);

        let result = service(db)
            .create(CreateCategoryInput {
                name: "Movies".to_string(),
                slug: "films".to_string(),
            })
            .await;

        match result {
            Err(AppError::Validation(fields)) => assert!(fields.get("slug").is_some()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create() {
        let created = create_test_category(3, "Music", "music");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<category::Model>::new()])
            .append_query_results([[created.clone()]]);

        let result = service(db)
            .create(CreateCategoryInput {
                name: "Music".to_string(),
                slug: "music".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result, created);
    }
}
