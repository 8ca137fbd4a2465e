//! JWT access tokens.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use yamdb_common::{AppError, AppResult, Config};
use yamdb_db::entities::user;

/// Value of the `token_type` claim on access tokens.
pub const ACCESS_TOKEN_TYPE: &str = "access";

/// Access token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
    pub token_type: String,
}

impl Claims {
    /// The user ID carried in `sub`.
    pub fn user_id(&self) -> AppResult<i64> {
        self.sub.parse().map_err(|_| AppError::Unauthorized)
    }
}

/// Signs and verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime_secs: i64,
}

impl TokenService {
    /// Create a token service from the auth configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_secret(
            config.auth.secret_key.as_bytes(),
            config.auth.access_token_lifetime_secs,
        )
    }

    /// Create a token service from a raw secret and lifetime.
    #[must_use]
    pub fn with_secret(secret: &[u8], lifetime_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetime_secs: i64::try_from(lifetime_secs).unwrap_or(i64::MAX),
        }
    }

    /// Issue an access token for a user.
    pub fn issue(&self, user: &user::Model) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now,
            exp: now.saturating_add(self.lifetime_secs),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Token(e.to_string()))
    }

    /// Verify signature, expiry and token type.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            AppError::Unauthorized
        })?;

        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AppError::Unauthorized);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use yamdb_db::entities::user::UserRole;

    fn create_test_user() -> user::Model {
        user::Model {
            id: 42,
            username: "reader".to_string(),
            email: "reader@example.com".to_string(),
            role: UserRole::User,
            bio: None,
            first_name: String::new(),
            last_name: String::new(),
            is_superuser: false,
            last_login: None,
            date_joined: Utc::now().into(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let service = TokenService::with_secret(b"secret", 3600);
        let token = service.issue(&create_test_user()).unwrap();

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.username, "reader");
        assert_eq!(claims.token_type, ACCESS_TOKEN_TYPE);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenService::with_secret(b"secret", 3600)
            .issue(&create_test_user())
            .unwrap();

        let result = TokenService::with_secret(b"other", 3600).verify(&token);
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_expired_rejected() {
        let service = TokenService::with_secret(b"secret", 3600);
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "42".to_string(),
            username: "reader".to_string(),
            iat: now - 7200,
            exp: now - 3600,
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };
        let token = encode(&Header::default(), &claims, &service.encoding_key).unwrap();

        assert!(matches!(service.verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_wrong_token_type_rejected() {
        let service = TokenService::with_secret(b"secret", 3600);
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "42".to_string(),
            username: "reader".to_string(),
            iat: now,
            exp: now + 3600,
            token_type: "refresh".to_string(),
        };
        let token = encode(&Header::default(), &claims, &service.encoding_key).unwrap();

        assert!(matches!(service.verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_garbage_rejected() {
        let service = TokenService::with_secret(b"secret", 3600);
        assert!(matches!(service.verify("not.a.jwt"), Err(AppError::Unauthorized)));
    }
}
