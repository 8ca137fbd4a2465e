//! Confirmation codes.
//!
//! A code is `<issued-at, base36>-<hex HMAC-SHA256>`. The MAC covers the
//! user's id, username, email, role and last login together with the
//! issue time, so any change to those fields (including the login that
//! consumes the code) invalidates every outstanding code. Nothing is stored.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use yamdb_common::{AppError, AppResult, Config};
use yamdb_db::entities::user;

type HmacSha256 = Hmac<Sha256>;

/// Issues and checks stateless confirmation codes.
#[derive(Clone)]
pub struct ConfirmationCodes {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl ConfirmationCodes {
    /// Create a generator from the auth configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_secret(
            config.auth.secret_key.as_bytes(),
            config.auth.confirmation_code_ttl_secs,
        )
    }

    /// Create a generator from a raw secret and lifetime.
    #[must_use]
    pub fn with_secret(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            secret: secret.to_vec(),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    /// Issue a code for the user's current state.
    pub fn make_code(&self, user: &user::Model) -> AppResult<String> {
        self.make_code_at(user, Utc::now().timestamp())
    }

    /// Check a code against the user's current state.
    #[must_use]
    pub fn check_code(&self, user: &user::Model, code: &str) -> bool {
        self.check_code_at(user, code, Utc::now().timestamp())
    }

    fn make_code_at(&self, user: &user::Model, issued_at: i64) -> AppResult<String> {
        let mac = self.mac(user, issued_at)?;
        let issued_at = u64::try_from(issued_at)
            .map_err(|_| AppError::Internal("clock is before the epoch".to_string()))?;

        Ok(format!(
            "{}-{}",
            to_base36(issued_at),
            hex::encode(mac.finalize().into_bytes())
        ))
    }

    fn check_code_at(&self, user: &user::Model, code: &str, now: i64) -> bool {
        let Some((stamp, signature)) = code.split_once('-') else {
            return false;
        };
        let Ok(issued_at) = u64::from_str_radix(stamp, 36) else {
            return false;
        };
        let Ok(issued_at) = i64::try_from(issued_at) else {
            return false;
        };
        if issued_at > now || now - issued_at > self.ttl_secs {
            return false;
        }
        let Ok(signature) = hex::decode(signature) else {
            return false;
        };

        self.mac(user, issued_at)
            .is_ok_and(|mac| mac.verify_slice(&signature).is_ok())
    }

    fn mac(&self, user: &user::Model, issued_at: i64) -> AppResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::Internal(format!("HMAC key rejected: {e}")))?;

        let last_login = user
            .last_login
            .map(|t| t.timestamp_micros().to_string())
            .unwrap_or_default();

        mac.update(user.id.to_string().as_bytes());
        mac.update(b"\0");
        mac.update(user.username.as_bytes());
        mac.update(b"\0");
        mac.update(user.email.as_bytes());
        mac.update(b"\0");
        mac.update(user.role.as_str().as_bytes());
        mac.update(b"\0");
        mac.update(last_login.as_bytes());
        mac.update(b"\0");
        mac.update(issued_at.to_string().as_bytes());

        Ok(mac)
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use yamdb_db::entities::user::UserRole;

    const NOW: i64 = 1_750_000_000;

    fn create_test_user() -> user::Model {
        user::Model {
            id: 7,
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

    fn codes() -> ConfirmationCodes {
        ConfirmationCodes::with_secret(b"test-secret", 3 * 24 * 60 * 60)
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(u64::from_str_radix(&to_base36(NOW as u64), 36).unwrap(), NOW as u64);
    }

    #[test]
    fn test_code_is_accepted() {
        let user = create_test_user();
        let code = codes().make_code_at(&user, NOW).unwrap();

        assert!(codes().check_code_at(&user, &code, NOW + 60));
    }

    #[test]
    fn test_code_expires() {
        let user = create_test_user();
        let code = codes().make_code_at(&user, NOW).unwrap();

        assert!(!codes().check_code_at(&user, &code, NOW + 3 * 24 * 60 * 60 + 1));
    }

    #[test]
    fn test_code_invalidated_by_login() {
        let mut user = create_test_user();
        let code = codes().make_code_at(&user, NOW).unwrap();

        user.last_login = Some(Utc::now().into());
        assert!(!codes().check_code_at(&user, &code, NOW + 60));
    }

    #[test]
    fn test_code_invalidated_by_email_change() {
        let mut user = create_test_user();
        let code = codes().make_code_at(&user, NOW).unwrap();

        user.email = "new@example.com".to_string();
        assert!(!codes().check_code_at(&user, &code, NOW + 60));
    }

    #[test]
    fn test_code_bound_to_secret() {
        let user = create_test_user();
        let code = codes().make_code_at(&user, NOW).unwrap();
        let other = ConfirmationCodes::with_secret(b"other-secret", 3600);

        assert!(!other.check_code_at(&user, &code, NOW + 60));
    }

    #[test]
    fn test_malformed_codes_rejected() {
        let user = create_test_user();
        for code in ["", "nodash", "zz-nothex", "!!-abcd", "-"] {
            assert!(!codes().check_code_at(&user, code, NOW), "{code}");
        }
    }
}
