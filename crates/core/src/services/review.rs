//! Review service.

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;
use yamdb_common::{AppError, AppResult, error::NON_FIELD_ERRORS};
use yamdb_db::{
    entities::{review, title, user},
    repositories::{ReviewRepository, UserRepository},
};

use super::Page;

/// Input for creating a review, and for replacing one with PUT.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewInput {
    #[validate(length(min = 1))]
    pub text: String,

    #[validate(range(min = 1, max = 10, message = "score must be between 1 and 10"))]
    pub score: i32,
}

/// Partial update of a review.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateReviewInput {
    #[validate(length(min = 1))]
    pub text: Option<String>,

    #[validate(range(min = 1, max = 10, message = "score must be between 1 and 10"))]
    pub score: Option<i32>,
}

impl From<CreateReviewInput> for UpdateReviewInput {
    fn from(input: CreateReviewInput) -> Self {
        Self {
            text: Some(input.text),
            score: Some(input.score),
        }
    }
}

/// A review together with its author's username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewWithAuthor {
    pub review: review::Model,
    pub author: String,
}

/// Review service for business logic.
#[derive(Clone)]
pub struct ReviewService {
    review_repo: ReviewRepository,
    user_repo: UserRepository,
}

impl ReviewService {
    /// Create a new review service.
    #[must_use]
    pub const fn new(review_repo: ReviewRepository, user_repo: UserRepository) -> Self {
        Self {
            review_repo,
            user_repo,
        }
    }

    /// List reviews of a title, newest first.
    pub async fn list(
        &self,
        title: &title::Model,
        limit: u64,
        offset: u64,
    ) -> AppResult<Page<ReviewWithAuthor>> {
        let count = self.review_repo.count_by_title(title.id).await?;
        let reviews = self
            .review_repo
            .list_by_title(title.id, limit, offset)
            .await?;

        let author_ids: Vec<i64> = reviews.iter().map(|r| r.author_id).collect();
        let names = self.user_repo.usernames_by_ids(&author_ids).await?;

        let items = reviews
            .into_iter()
            .map(|review| ReviewWithAuthor {
                author: names.get(&review.author_id).cloned().unwrap_or_default(),
                review,
            })
            .collect();

        Ok(Page { items, count })
    }

    /// Get a review that belongs to the title.
    pub async fn get(&self, title: &title::Model, id: i64) -> AppResult<review::Model> {
        self.review_repo.get_in_title(title.id, id).await
    }

    /// Attach the author's username.
    pub async fn with_author(&self, review: review::Model) -> AppResult<ReviewWithAuthor> {
        let author = self
            .user_repo
            .find_by_id(review.author_id)
            .await?
            .map(|u| u.username)
            .unwrap_or_default();

        Ok(ReviewWithAuthor { review, author })
    }

    /// Create a review by `author`. One review per author per title.
    pub async fn create(
        &self,
        title: &title::Model,
        author: &user::Model,
        input: CreateReviewInput,
    ) -> AppResult<ReviewWithAuthor> {
        input.validate()?;

        if self
            .review_repo
            .exists_for_author(author.id, title.id)
            .await?
        {
            return Err(AppError::field(
                NON_FIELD_ERRORS,
                "you have already reviewed this title",
            ));
        }

        let model = review::ActiveModel {
            title_id: Set(title.id),
            author_id: Set(author.id),
            text: Set(input.text),
            score: Set(input.score),
            pub_date: Set(Utc::now().into()),
            ..Default::default()
        };

        let review = self.review_repo.create(model).await?;
        tracing::info!(
            review_id = review.id,
            title_id = title.id,
            author = %author.username,
            "Review created"
        );

        Ok(ReviewWithAuthor {
            review,
            author: author.username.clone(),
        })
    }

    /// Update a review. Author, title and date never change.
    pub async fn update(
        &self,
        review: review::Model,
        input: UpdateReviewInput,
    ) -> AppResult<ReviewWithAuthor> {
        input.validate()?;

        let mut active: review::ActiveModel = review.into();
        if let Some(text) = input.text {
            active.text = Set(text);
        }
        if let Some(score) = input.score {
            active.score = Set(score);
        }

        let review = self.review_repo.update(active).await?;
        tracing::info!(review_id = review.id, "Review updated");

        self.with_author(review).await
    }

    /// Delete a review with its comments.
    pub async fn delete(&self, review: &review::Model) -> AppResult<()> {
        self.review_repo.delete(review.id).await?;
        tracing::info!(review_id = review.id, "Review deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;
    use yamdb_db::entities::user::UserRole;

    fn create_test_user(id: i64, username: &str) -> user::Model {
        user::Model {
            id,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            role: UserRole::User,
            bio: None,
            first_name: String::new(),
            last_name: String::new(),
            is_superuser: false,
            last_login: None,
            date_joined: Utc::now().into(),
        }
    }

    fn create_test_title() -> title::Model {
        title::Model {
            id: 1,
            name: "Heat".to_string(),
            year: 1995,
            description: None,
            category_id: None,
        }
    }

    fn create_test_review(id: i64, author_id: i64, score: i32) -> review::Model {
        review::Model {
            id,
            title_id: 1,
            author_id,
            text: "Great".to_string(),
            score,
            pub_date: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> ReviewService {
        let db = Arc::new(db.into_connection());
        ReviewService::new(ReviewRepository::new(db.clone()), UserRepository::new(db))
    }

    fn count_row(n: i64) -> [std::collections::BTreeMap<&'static str, sea_orm::Value>; 1] {
        [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }]
    }

    #[test]
    fn test_score_bounds() {
        for (score, ok) in [(0, false), (1, true), (10, true), (11, false)] {
            let input = CreateReviewInput {
                text: "x".to_string(),
                score,
            };
            assert_eq!(input.validate().is_ok(), ok, "score {score}");
        }
    }

    #[tokio::test]
    async fn test_create_rejects_out_of_range_score() {
        let db = MockDatabase::new(DatabaseBackend::Postgres);

        let result = service(db)
            .create(
                &create_test_title(),
                &create_test_user(7, "critic"),
                CreateReviewInput {
                    text: "Meh".to_string(),
                    score: 11,
                },
            )
            .await;

        match result {
            Err(AppError::Validation(fields)) => assert!(fields.get("score").is_some()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_second_review() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([count_row(1)]);

        let result = service(db)
            .create(
                &create_test_title(),
                &create_test_user(7, "critic"),
                CreateReviewInput {
                    text: "Again".to_string(),
                    score: 5,
                },
            )
            .await;

        match result {
            Err(AppError::Validation(fields)) => assert!(fields.get(NON_FIELD_ERRORS).is_some()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create() {
        let created = create_test_review(3, 7, 8);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([count_row(0)])
            .append_query_results([[created.clone()]]);

        let result = service(db)
            .create(
                &create_test_title(),
                &create_test_user(7, "critic"),
                CreateReviewInput {
                    text: "Great".to_string(),
                    score: 8,
                },
            )
            .await
            .unwrap();

        assert_eq!(result.review, created);
        assert_eq!(result.author, "critic");
    }

    #[tokio::test]
    async fn test_list_resolves_authors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([count_row(2)])
            .append_query_results([[create_test_review(2, 8, 10), create_test_review(1, 7, 8)]])
            .append_query_results([[create_test_user(7, "alice"), create_test_user(8, "bob")]]);

        let page = service(db).list(&create_test_title(), 10, 0).await.unwrap();

        assert_eq!(page.count, 2);
        assert_eq!(page.items[0].author, "bob");
        assert_eq!(page.items[1].author, "alice");
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let original = create_test_review(3, 7, 8);
        let updated = review::Model {
            score: 6,
            ..original.clone()
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[updated.clone()]])
            .append_query_results([[create_test_user(7, "critic")]]);

        let result = service(db)
            .update(
                original,
                UpdateReviewInput {
                    text: None,
                    score: Some(6),
                },
            )
            .await
            .unwrap();

        assert_eq!(result.review.score, 6);
        assert_eq!(result.review.text, "Great");
        assert_eq!(result.author, "critic");
    }
}
