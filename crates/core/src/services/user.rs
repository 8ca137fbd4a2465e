//! User management service.

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;
use yamdb_common::{AppError, AppResult, FieldErrors};
use yamdb_db::{
    entities::user::{self, UserRole},
    repositories::UserRepository,
};

use super::Page;
use crate::validation::{USERNAME_RE, nullable, validate_username};

/// Admin input for creating a user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(
        length(min = 1, max = 150),
        regex(path = *USERNAME_RE, message = "letters, digits and @/./+/-/_ only"),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[validate(email, length(max = 254))]
    pub email: String,

    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: Option<String>,

    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: Option<String>,

    #[serde(default)]
    pub bio: Option<String>,

    #[serde(default)]
    pub role: Option<UserRole>,
}

/// Partial update of a user.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserInput {
    #[validate(
        length(min = 1, max = 150),
        regex(path = *USERNAME_RE, message = "letters, digits and @/./+/-/_ only"),
        custom(function = "validate_username")
    )]
    pub username: Option<String>,

    #[validate(email, length(max = 254))]
    pub email: Option<String>,

    #[validate(length(max = 150))]
    pub first_name: Option<String>,

    #[validate(length(max = 150))]
    pub last_name: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub bio: Option<Option<String>>,

    pub role: Option<UserRole>,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// List users ordered by ID.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Page<user::Model>> {
        let count = self.user_repo.count().await?;
        let items = self.user_repo.list(limit, offset).await?;
        Ok(Page { items, count })
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_username(username).await
    }

    /// Create a user on behalf of an admin.
    pub async fn create(&self, input: CreateUserInput) -> AppResult<user::Model> {
        input.validate()?;
        self.check_unique(None, Some(&input.username), Some(&input.email))
            .await?;

        let model = user::ActiveModel {
            username: Set(input.username),
            email: Set(input.email),
            role: Set(input.role.unwrap_or_default()),
            bio: Set(input.bio),
            first_name: Set(input.first_name.unwrap_or_default()),
            last_name: Set(input.last_name.unwrap_or_default()),
            is_superuser: Set(false),
            date_joined: Set(Utc::now().into()),
            ..Default::default()
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(
            user_id = user.id,
            username = %user.username,
            role = user.role.as_str(),
            "User created"
        );
        Ok(user)
    }

    /// Apply an admin's partial update.
    pub async fn update(
        &self,
        user: user::Model,
        input: UpdateUserInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let username = input.username.as_deref().filter(|u| *u != user.username);
        let email = input.email.as_deref().filter(|e| *e != user.email);
        self.check_unique(Some(user.id), username, email).await?;

        let mut active: user::ActiveModel = user.into();
        if let Some(username) = input.username {
            active.username = Set(username);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(first_name) = input.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = input.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(bio) = input.bio {
            active.bio = Set(bio);
        }
        if let Some(role) = input.role {
            active.role = Set(role);
        }

        let user = self.user_repo.update(active).await?;
        tracing::info!(user_id = user.id, username = %user.username, "User updated");
        Ok(user)
    }

    /// Update the caller's own profile. The role stays as it is.
    pub async fn update_me(
        &self,
        user: user::Model,
        mut input: UpdateUserInput,
    ) -> AppResult<user::Model> {
        if input.role.take().is_some() {
            tracing::debug!(username = %user.username, "Ignoring role change on self-edit");
        }
        self.update(user, input).await
    }

    /// Delete a user.
    pub async fn delete(&self, user: &user::Model) -> AppResult<()> {
        self.user_repo.delete(user.id).await?;
        tracing::info!(user_id = user.id, username = %user.username, "User deleted");
        Ok(())
    }

    async fn check_unique(
        &self,
        own_id: Option<i64>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<()> {
        let mut errors = FieldErrors::new();

        if let Some(username) = username {
            let taken = self.user_repo.find_by_username(username).await?;
            if taken.is_some_and(|u| Some(u.id) != own_id) {
                errors.add("username", "a user with this username already exists");
            }
        }
        if let Some(email) = email {
            let taken = self.user_repo.find_by_email(email).await?;
            if taken.is_some_and(|u| Some(u.id) != own_id) {
                errors.add("email", "a user with this email already exists");
            }
        }

        errors.into_result()
    }
}
