//! Field rules shared by service inputs.

use std::borrow::Cow;
use std::sync::LazyLock;

use chrono::{Datelike, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use validator::ValidationError;

/// Letters, digits and `.@+-_`.
#[allow(clippy::unwrap_used)]
pub static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+\z").unwrap());

/// URL-safe slug.
#[allow(clippy::unwrap_used)]
pub static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+\z").unwrap());

/// Username reserved for the `/users/me/` route.
pub const RESERVED_USERNAME: &str = "me";

fn error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

/// Reject the reserved username in any letter case.
pub fn validate_username(value: &str) -> Result<(), ValidationError> {
    if value.eq_ignore_ascii_case(RESERVED_USERNAME) {
        return Err(error(
            "reserved_username",
            "the username \"me\" cannot be used",
        ));
    }
    Ok(())
}

/// Reject years after the current one.
pub fn validate_year(value: i32) -> Result<(), ValidationError> {
    let current = Utc::now().year();
    if value > current {
        return Err(error(
            "future_year",
            format!("year {value} is later than the current year"),
        ));
    }
    Ok(())
}

/// Deserialize a field that may be absent, `null`, or set.
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` so a missing
/// field stays `None` while an explicit `null` becomes `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
