//! Title repository.
//!
//! Titles are stored without their rating; it is aggregated from reviews
//! on every read. Genre links are rewritten together with the title inside
//! one transaction.

use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    TransactionTrait,
    sea_query::{Alias, Expr, Func, Query, SimpleExpr},
};
use yamdb_common::{AppError, AppResult};

use super::icontains;
use crate::entities::{Genre, GenreTitle, Review, Title, category, genre, genre_title, review, title};
use crate::map_db_err;

/// Title list filters. All present filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleFilter {
    /// Category slug.
    pub category: Option<String>,
    /// Genre slug.
    pub genre: Option<String>,
    /// Case-insensitive name substring.
    pub name: Option<String>,
    /// Exact year.
    pub year: Option<i32>,
}

#[derive(Debug, FromQueryResult)]
struct RatingRow {
    title_id: i64,
    rating: Option<f64>,
}

/// Repository for title operations.
#[derive(Clone)]
pub struct TitleRepository {
    db: Arc<DatabaseConnection>,
}

impl TitleRepository {
    /// Create a new title repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn filtered_query(filter: &TitleFilter) -> Select<Title> {
        let mut query = Title::find();

        if let Some(slug) = &filter.category {
            query = query.filter(
                title::Column::CategoryId.in_subquery(
                    Query::select()
                        .column(category::Column::Id)
                        .from(category::Entity)
                        .and_where(category::Column::Slug.eq(slug.as_str()))
                        .to_owned(),
                ),
            );
        }

        if let Some(slug) = &filter.genre {
            query = query.filter(
                title::Column::Id.in_subquery(
                    Query::select()
                        .column(genre_title::Column::TitleId)
                        .from(GenreTitle)
                        .and_where(
                            genre_title::Column::GenreId.in_subquery(
                                Query::select()
                                    .column(genre::Column::Id)
                                    .from(Genre)
                                    .and_where(genre::Column::Slug.eq(slug.as_str()))
                                    .to_owned(),
                            ),
                        )
                        .to_owned(),
                ),
            );
        }

        if let Some(name) = &filter.name {
            query = query.filter(icontains(title::Column::Name, name));
        }

        if let Some(year) = filter.year {
            query = query.filter(title::Column::Year.eq(year));
        }

        query
    }

    /// Find title by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<title::Model>> {
        Title::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get title by ID, failing with `NotFound`.
    pub async fn get_by_id(&self, id: i64) -> AppResult<title::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Title not found: {id}")))
    }

    /// List titles ordered by name.
    pub async fn list(
        &self,
        filter: &TitleFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<title::Model>> {
        Self::filtered_query(filter)
            .order_by_asc(title::Column::Name)
            .order_by_asc(title::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count titles matching the filter.
    pub async fn count(&self, filter: &TitleFilter) -> AppResult<u64> {
        Self::filtered_query(filter)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mean review score per title. Titles without reviews are absent.
    pub async fn ratings(&self, title_ids: &[i64]) -> AppResult<HashMap<i64, f64>> {
        if title_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let average = SimpleExpr::from(Func::cast_as(
            Func::avg(Expr::col(review::Column::Score)),
            Alias::new("float8"),
        ));

        let rows = Review::find()
            .select_only()
            .column(review::Column::TitleId)
            .column_as(average, "rating")
            .filter(review::Column::TitleId.is_in(title_ids.iter().copied()))
            .group_by(review::Column::TitleId)
            .into_model::<RatingRow>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.rating.map(|rating| (row.title_id, rating)))
            .collect())
    }

    /// Genres linked to each title, ordered by genre name.
    pub async fn genres(&self, title_ids: &[i64]) -> AppResult<HashMap<i64, Vec<genre::Model>>> {
        if title_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let links = GenreTitle::find()
            .filter(genre_title::Column::TitleId.is_in(title_ids.iter().copied()))
            .find_also_related(Genre)
            .order_by_asc(genre::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut by_title: HashMap<i64, Vec<genre::Model>> = HashMap::new();
        for (link, genre) in links {
            if let Some(genre) = genre {
                by_title.entry(link.title_id).or_default().push(genre);
            }
        }

        Ok(by_title)
    }

    /// Insert a title and link it to the given genres atomically.
    pub async fn create(
        &self,
        model: title::ActiveModel,
        genre_ids: &[i64],
    ) -> AppResult<title::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let title = model.insert(&txn).await.map_err(map_db_err)?;
        Self::link_genres(&txn, title.id, genre_ids).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(title)
    }

    /// Update a title. When `genre_ids` is given, its genre links are
    /// replaced in the same transaction.
    pub async fn update(
        &self,
        model: title::ActiveModel,
        genre_ids: Option<&[i64]>,
    ) -> AppResult<title::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let title = model.update(&txn).await.map_err(map_db_err)?;

        if let Some(genre_ids) = genre_ids {
            GenreTitle::delete_many()
                .filter(genre_title::Column::TitleId.eq(title.id))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            Self::link_genres(&txn, title.id, genre_ids).await?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(title)
    }

    /// Delete a title. Reviews, their comments and genre links cascade.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        Title::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn link_genres<C: ConnectionTrait>(
        conn: &C,
        title_id: i64,
        genre_ids: &[i64],
    ) -> AppResult<()> {
        if genre_ids.is_empty() {
            return Ok(());
        }

        let links = genre_ids.iter().map(|genre_id| genre_title::ActiveModel {
            genre_id: Set(Some(*genre_id)),
            title_id: Set(title_id),
            ..Default::default()
        });

        GenreTitle::insert_many(links)
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
