//! Title service.

use std::collections::HashMap;

use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;
use yamdb_common::{AppError, AppResult};
use yamdb_db::{
    entities::{category, genre, title},
    repositories::{CategoryRepository, GenreRepository, TitleFilter, TitleRepository},
};

use super::Page;
use crate::validation::{nullable, validate_year};

/// Input for creating a title, and for replacing one with PUT.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTitleInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    pub year: i32,

    pub description: Option<String>,

    /// Genre slugs.
    pub genre: Vec<String>,

    /// Category slug.
    pub category: String,
}

/// Partial update of a title.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTitleInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    pub year: Option<i32>,

    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,

    pub genre: Option<Vec<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub category: Option<Option<String>>,
}

impl From<CreateTitleInput> for UpdateTitleInput {
    fn from(input: CreateTitleInput) -> Self {
        Self {
            name: Some(input.name),
            year: Some(input.year),
            description: Some(input.description),
            genre: Some(input.genre),
            category: Some(Some(input.category)),
        }
    }
}

/// A title with everything needed to render it.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleDetails {
    pub title: title::Model,
    /// Mean review score truncated toward zero; `None` without reviews.
    pub rating: Option<i32>,
    pub genres: Vec<genre::Model>,
    pub category: Option<category::Model>,
}

/// Title service for business logic.
#[derive(Clone)]
pub struct TitleService {
    title_repo: TitleRepository,
    category_repo: CategoryRepository,
    genre_repo: GenreRepository,
}

impl TitleService {
    /// Create a new title service.
    #[must_use]
    pub const fn new(
        title_repo: TitleRepository,
        category_repo: CategoryRepository,
        genre_repo: GenreRepository,
    ) -> Self {
        Self {
            title_repo,
            category_repo,
            genre_repo,
        }
    }

    /// List titles matching the filter, ordered by name.
    pub async fn list(
        &self,
        filter: &TitleFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Page<TitleDetails>> {
        let count = self.title_repo.count(filter).await?;
        let titles = self.title_repo.list(filter, limit, offset).await?;
        let items = self.details(titles).await?;
        Ok(Page { items, count })
    }

    /// Get a bare title, for permission checks and nesting.
    pub async fn get_model(&self, id: i64) -> AppResult<title::Model> {
        self.title_repo.get_by_id(id).await
    }

    /// Get a title with rating, genres and category.
    pub async fn get(&self, id: i64) -> AppResult<TitleDetails> {
        let title = self.title_repo.get_by_id(id).await?;
        self.detail(title).await
    }

    /// Create a title.
    pub async fn create(&self, input: CreateTitleInput) -> AppResult<TitleDetails> {
        input.validate()?;
        validate_year(input.year).map_err(|e| AppError::field("year", error_message(&e)))?;

        let category_id = self.resolve_category(Some(input.category.as_str())).await?;
        let genre_ids = self.resolve_genres(&input.genre).await?;

        let model = title::ActiveModel {
            name: Set(input.name),
            year: Set(input.year),
            description: Set(input.description),
            category_id: Set(category_id),
            ..Default::default()
        };

        let title = self.title_repo.create(model, &genre_ids).await?;
        tracing::info!(title_id = title.id, name = %title.name, "Title created");

        self.detail(title).await
    }

    /// Update a title. Fields left out of the input keep their value.
    pub async fn update(
        &self,
        title: title::Model,
        input: UpdateTitleInput,
    ) -> AppResult<TitleDetails> {
        input.validate()?;
        if let Some(year) = input.year {
            validate_year(year).map_err(|e| AppError::field("year", error_message(&e)))?;
        }

        let category_id = match &input.category {
            Some(slug) => Some(self.resolve_category(slug.as_deref()).await?),
            None => None,
        };
        let genre_ids = match &input.genre {
            Some(slugs) => Some(self.resolve_genres(slugs).await?),
            None => None,
        };

        let mut active: title::ActiveModel = title.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(year) = input.year {
            active.year = Set(year);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(category_id) = category_id {
            active.category_id = Set(category_id);
        }

        let title = self
            .title_repo
            .update(active, genre_ids.as_deref())
            .await?;
        tracing::info!(title_id = title.id, "Title updated");

        self.detail(title).await
    }

    /// Delete a title with its reviews and comments.
    pub async fn delete(&self, title: &title::Model) -> AppResult<()> {
        self.title_repo.delete(title.id).await?;
        tracing::info!(title_id = title.id, name = %title.name, "Title deleted");
        Ok(())
    }

    async fn resolve_category(&self, slug: Option<&str>) -> AppResult<Option<i64>> {
        let Some(slug) = slug else {
            return Ok(None);
        };

        self.category_repo
            .find_by_slug(slug)
            .await?
            .map(|c| Some(c.id))
            .ok_or_else(|| {
                AppError::field("category", format!("category \"{slug}\" does not exist"))
            })
    }

    async fn resolve_genres(&self, slugs: &[String]) -> AppResult<Vec<i64>> {
        let genres = self.genre_repo.find_by_slugs(slugs).await?;

        let missing: Vec<&str> = slugs
            .iter()
            .filter(|slug| !genres.iter().any(|g| &g.slug == *slug))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(AppError::field(
                "genre",
                format!("unknown genre: {}", missing.join(", ")),
            ));
        }

        Ok(genres.into_iter().map(|g| g.id).collect())
    }

    async fn detail(&self, title: title::Model) -> AppResult<TitleDetails> {
        let mut details = self.details(vec![title]).await?;
        details
            .pop()
            .ok_or_else(|| AppError::Internal("title vanished while loading".to_string()))
    }

    async fn details(&self, titles: Vec<title::Model>) -> AppResult<Vec<TitleDetails>> {
        if titles.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = titles.iter().map(|t| t.id).collect();
        let ratings = self.title_repo.ratings(&ids).await?;
        let mut genres = self.title_repo.genres(&ids).await?;

        let mut category_ids: Vec<i64> = titles.iter().filter_map(|t| t.category_id).collect();
        category_ids.sort_unstable();
        category_ids.dedup();
        let categories: HashMap<i64, category::Model> = self
            .category_repo
            .find_by_ids(&category_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        Ok(titles
            .into_iter()
            .map(|title| TitleDetails {
                rating: ratings.get(&title.id).copied().map(truncate_rating),
                genres: genres.remove(&title.id).unwrap_or_default(),
                category: title
                    .category_id
                    .and_then(|id| categories.get(&id).cloned()),
                title,
            })
            .collect())
    }
}

/// Integer rating as reported to clients: the mean truncated toward zero.
#[must_use]
pub fn truncate_rating(mean: f64) -> i32 {
    mean.trunc() as i32
}

fn error_message(error: &validator::ValidationError) -> String {
    error
        .message
        .as_ref()
        .map_or_else(|| error.code.to_string(), ToString::to_string)
}
