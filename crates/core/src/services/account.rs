//! Account service: signup, confirmation-code exchange and request
//! authentication.

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;
use yamdb_common::{AppError, AppResult, FieldErrors, config::BootstrapConfig};
use yamdb_db::{
    entities::user::{self, UserRole},
    repositories::UserRepository,
};

use super::{ConfirmationCodes, EmailService, TokenService};
use crate::validation::{USERNAME_RE, validate_username};

/// Signup request.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupInput {
    #[validate(
        length(min = 1, max = 150),
        regex(path = *USERNAME_RE, message = "letters, digits and @/./+/-/_ only"),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[validate(email, length(max = 254))]
    pub email: String,
}

/// Token exchange request.
#[derive(Debug, Deserialize, Validate)]
pub struct TokenInput {
    #[validate(length(min = 1))]
    pub username: String,

    #[validate(length(min = 1))]
    pub confirmation_code: String,
}

/// Account service for the signup and token flow.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    codes: ConfirmationCodes,
    tokens: TokenService,
    email: EmailService,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        codes: ConfirmationCodes,
        tokens: TokenService,
        email: EmailService,
    ) -> Self {
        Self {
            user_repo,
            codes,
            tokens,
            email,
        }
    }

    /// Register a user, or re-send a code to an existing (username, email)
    /// pair, and mail a fresh confirmation code.
    pub async fn signup(&self, input: SignupInput) -> AppResult<user::Model> {
        input.validate()?;

        let by_username = self.user_repo.find_by_username(&input.username).await?;

        let user = match by_username {
            Some(existing) if existing.email == input.email => {
                tracing::debug!(username = %existing.username, "Re-sending confirmation code");
                existing
            }
            by_username => {
                let by_email = self.user_repo.find_by_email(&input.email).await?;

                let mut errors = FieldErrors::new();
                if by_username.is_some() {
                    errors.add("username", "a user with this username already exists");
                }
                if by_email.is_some() {
                    errors.add("email", "a user with this email already exists");
                }
                errors.into_result()?;

                let model = user::ActiveModel {
                    username: Set(input.username),
                    email: Set(input.email),
                    role: Set(UserRole::User),
                    first_name: Set(String::new()),
                    last_name: Set(String::new()),
                    is_superuser: Set(false),
                    date_joined: Set(Utc::now().into()),
                    ..Default::default()
                };

                let user = self.user_repo.create(model).await?;
                tracing::info!(user_id = user.id, username = %user.username, "User signed up");
                user
            }
        };

        let code = self.codes.make_code(&user)?;
        self.email
            .send_confirmation_code(&user.email, &user.username, &code)
            .await?;

        Ok(user)
    }

    /// Exchange a confirmation code for an access token.
    ///
    /// A successful exchange records the login, which retires the code.
    pub async fn obtain_token(&self, input: TokenInput) -> AppResult<String> {
        input.validate()?;

        let user = self.user_repo.get_by_username(&input.username).await?;

        if !self.codes.check_code(&user, &input.confirmation_code) {
            return Err(AppError::field(
                "confirmation_code",
                "invalid or expired confirmation code",
            ));
        }

        let mut active: user::ActiveModel = user.into();
        active.last_login = Set(Some(Utc::now().into()));
        let user = self.user_repo.update(active).await?;

        let token = self.tokens.issue(&user)?;
        tracing::info!(user_id = user.id, username = %user.username, "Access token issued");

        Ok(token)
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate(&self, token: &str) -> AppResult<user::Model> {
        let claims = self.tokens.verify(token)?;

        self.user_repo
            .find_by_id(claims.user_id()?)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Create the configured superuser if it does not exist yet.
    pub async fn bootstrap_admin(&self, config: &BootstrapConfig) -> AppResult<user::Model> {
        if let Some(existing) = self
            .user_repo
            .find_by_username(&config.admin_username)
            .await?
        {
            return Ok(existing);
        }

        let model = user::ActiveModel {
            username: Set(config.admin_username.clone()),
            email: Set(config.admin_email.clone()),
            role: Set(UserRole::Admin),
            first_name: Set(String::new()),
            last_name: Set(String::new()),
            is_superuser: Set(true),
            date_joined: Set(Utc::now().into()),
            ..Default::default()
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = user.id, username = %user.username, "Bootstrap admin created");

        Ok(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::{MemoryTransport, confirmation_code_from};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;
    use yamdb_common::config::EmailConfig;

    const SECRET: &[u8] = b"test-secret";

    fn create_test_user(id: i64, username: &str, email: &str) -> user::Model {
        user::Model {
            id,
            username: username.to_string(),
            email: email.to_string(),
            role: UserRole::User,
            bio: None,
            first_name: String::new(),
            last_name: String::new(),
            is_superuser: false,
            last_login: None,
            date_joined: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase, outbox: &MemoryTransport) -> AccountService {
        let db = Arc::new(db.into_connection());
        AccountService::new(
            UserRepository::new(db),
            ConfirmationCodes::with_secret(SECRET, 3600),
            TokenService::with_secret(SECRET, 3600),
            EmailService::new(Arc::new(outbox.clone()), &EmailConfig::default()),
        )
    }

    fn signup_input(username: &str, email: &str) -> SignupInput {
        SignupInput {
            username: username.to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_rejects_reserved_username() {
        let outbox = MemoryTransport::new();

        for name in ["me", "Me", "ME"] {
            let db = MockDatabase::new(DatabaseBackend::Postgres);
            let result = service(db, &outbox)
                .signup(signup_input(name, "me@example.com"))
                .await;
            match result {
                Err(AppError::Validation(fields)) => assert!(fields.get("username").is_some()),
                other => panic!("unexpected result: {other:?}"),
            }
        }
        assert!(outbox.messages().is_empty());
    }

    #[tokio::test]
    async fn test_signup_rejects_bad_email() {
        let outbox = MemoryTransport::new();
        let db = MockDatabase::new(DatabaseBackend::Postgres);

        let result = service(db, &outbox)
            .signup(signup_input("reader", "not-an-email"))
            .await;

        match result {
            Err(AppError::Validation(fields)) => assert!(fields.get("email").is_some()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_signup_creates_user_and_mails_code() {
        let outbox = MemoryTransport::new();
        let created = create_test_user(1, "reader", "reader@example.com");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[created.clone()]]);

        let user = service(db, &outbox)
            .signup(signup_input("reader", "reader@example.com"))
            .await
            .unwrap();

        assert_eq!(user, created);
        let message = outbox.last_to("reader@example.com").unwrap();
        let code = confirmation_code_from(&message).unwrap();
        assert!(ConfirmationCodes::with_secret(SECRET, 3600).check_code(&created, code));
    }

    #[tokio::test]
    async fn test_signup_reuses_exact_match() {
        let outbox = MemoryTransport::new();
        let existing = create_test_user(1, "reader", "reader@example.com");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing.clone()]]);

        let user = service(db, &outbox)
            .signup(signup_input("reader", "reader@example.com"))
            .await
            .unwrap();

        assert_eq!(user, existing);
        assert_eq!(outbox.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_signup_reports_taken_fields() {
        let outbox = MemoryTransport::new();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user(1, "reader", "other@example.com")]])
            .append_query_results([[create_test_user(2, "someone", "taken@example.com")]]);

        let result = service(db, &outbox)
            .signup(signup_input("reader", "taken@example.com"))
            .await;

        match result {
            Err(AppError::Validation(fields)) => {
                assert!(fields.get("username").is_some());
                assert!(fields.get("email").is_some());
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(outbox.messages().is_empty());
    }

    #[tokio::test]
    async fn test_obtain_token_and_code_is_single_use() {
        let user = create_test_user(1, "reader", "reader@example.com");
        let code = ConfirmationCodes::with_secret(SECRET, 3600)
            .make_code(&user)
            .unwrap();
        let mut logged_in = user.clone();
        logged_in.last_login = Some(Utc::now().into());

        let outbox = MemoryTransport::new();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user.clone()]])
            .append_query_results([[logged_in.clone()]]);

        let token = service(db, &outbox)
            .obtain_token(TokenInput {
                username: "reader".to_string(),
                confirmation_code: code.clone(),
            })
            .await
            .unwrap();

        let claims = TokenService::with_secret(SECRET, 3600).verify(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), 1);

        // The stored user now carries last_login; the same code no longer works.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[logged_in]]);
        let result = service(db, &outbox)
            .obtain_token(TokenInput {
                username: "reader".to_string(),
                confirmation_code: code,
            })
            .await;

        match result {
            Err(AppError::Validation(fields)) => {
                assert!(fields.get("confirmation_code").is_some());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_obtain_token_unknown_user() {
        let outbox = MemoryTransport::new();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()]);

        let result = service(db, &outbox)
            .obtain_token(TokenInput {
                username: "ghost".to_string(),
                confirmation_code: "0-00".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_authenticate_orphaned_token() {
        let outbox = MemoryTransport::new();
        let token = TokenService::with_secret(SECRET, 3600)
            .issue(&create_test_user(9, "gone", "gone@example.com"))
            .unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()]);

        let result = service(db, &outbox).authenticate(&token).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_bootstrap_admin_creates_superuser() {
        let mut admin = create_test_user(1, "root", "root@example.com");
        admin.role = UserRole::Admin;
        admin.is_superuser = true;

        let outbox = MemoryTransport::new();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[admin.clone()]]);

        let user = service(db, &outbox)
            .bootstrap_admin(&BootstrapConfig {
                admin_username: "root".to_string(),
                admin_email: "root@example.com".to_string(),
            })
            .await
            .unwrap();

        assert!(user.is_admin());
    }
}
