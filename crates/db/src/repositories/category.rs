//! Category repository.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use yamdb_common::{AppError, AppResult};

use super::icontains;
use crate::entities::{Category, category};
use crate::map_db_err;

/// Repository for category operations.
#[derive(Clone)]
pub struct CategoryRepository {
    db: Arc<DatabaseConnection>,
}

impl CategoryRepository {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn search_query(search: Option<&str>) -> Select<Category> {
        let mut query = Category::find();
        if let Some(needle) = search {
            query = query.filter(icontains(category::Column::Name, needle));
        }
        query
    }

    /// Find category by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<category::Model>> {
        Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find categories by IDs.
    pub async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<category::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Category::find()
            .filter(category::Column::Id.is_in(ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List categories ordered by name, optionally filtered by a name substring.
    pub async fn list(
        &self,
        search: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<category::Model>> {
        Self::search_query(search)
            .order_by_asc(category::Column::Name)
            .order_by_asc(category::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count categories matching the search.
    pub async fn count(&self, search: Option<&str>) -> AppResult<u64> {
        Self::search_query(search)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new category.
    pub async fn create(&self, name: String, slug: String) -> AppResult<category::Model> {
        let active_model = category::ActiveModel {
            name: Set(name),
            slug: Set(slug),
            ..Default::default()
        };

        active_model
            .insert(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Delete a category. Titles in it keep existing with no category.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        Category::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
