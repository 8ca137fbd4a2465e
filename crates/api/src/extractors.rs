//! Request extractors.

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::{Deserialize, de::DeserializeOwned};
use yamdb_common::{AppError, AppResult};
use yamdb_core::{Action, Policy, allow};
use yamdb_db::entities::user;

/// Default page size.
pub const DEFAULT_LIMIT: u64 = 10;

/// Largest page a client may ask for.
pub const MAX_LIMIT: u64 = 100;

/// Largest offset the database driver binds (`BIGINT`).
pub const MAX_OFFSET: u64 = i64::MAX as u64;

/// Authenticated user extractor, enforcing [`Policy::Authenticated`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the auth middleware
        let user = parts.extensions.get::<user::Model>().cloned();
        allow(user.as_ref(), Policy::Authenticated, Action::Read, None)?;
        user.map(AuthUser).ok_or(AppError::Unauthorized)
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl MaybeAuthUser {
    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&user::Model> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}

/// Raw request body, decoded on demand.
///
/// Handlers resolve the target objects and check permissions first, then
/// decode, so a forbidden request never reports body errors.
#[derive(Debug, Clone)]
pub struct Payload(Bytes);

impl Payload {
    /// Decode the body as JSON. An empty body reads as `{}`.
    pub fn decode<T: DeserializeOwned>(&self) -> AppResult<T> {
        if self.0.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_slice(b"{}")?);
        }
        Ok(serde_json::from_slice(&self.0)?)
    }
}

impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Bytes::from_request(req, state)
            .await
            .map(Self)
            .map_err(|e| AppError::BadRequest(e.body_text()))
    }
}

/// Query string extractor that reports failures as API errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|e| AppError::BadRequest(e.body_text()))
    }
}

/// Path segment extractor. A segment that does not parse matches no
/// resource, so it is reported as not found.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathParams<T>(pub T);

impl<T, S> FromRequestParts<S> for PathParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| Self(value))
            .map_err(|e| AppError::NotFound(e.body_text()))
    }
}

/// `?limit=&offset=` pagination parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_limit")]
    limit: u64,
    #[serde(default)]
    offset: u64,
}

const fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl PageParams {
    /// Create parameters as a client would send them.
    #[must_use]
    pub const fn new(limit: u64, offset: u64) -> Self {
        Self { limit, offset }
    }

    /// Page size, between 1 and [`MAX_LIMIT`].
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit.clamp(1, MAX_LIMIT)
    }

    /// Rows to skip, capped at [`MAX_OFFSET`].
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset.min(MAX_OFFSET)
    }
}
