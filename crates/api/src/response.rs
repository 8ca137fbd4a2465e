//! API response types.

use axum::{
    Json,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::extractors::PageParams;

/// A page of results with links to its neighbours.
#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T: Serialize> Paginated<T> {
    /// Build the envelope for `results`, linking relative to `uri`.
    pub fn new(results: Vec<T>, count: u64, params: &PageParams, uri: &Uri) -> Self {
        let limit = params.limit();
        let offset = params.offset();

        let next = offset
            .checked_add(limit)
            .filter(|next| *next < count)
            .map(|next| page_link(uri, limit, next));
        let previous = (offset > 0).then(|| page_link(uri, limit, offset.saturating_sub(limit)));

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

impl<T: Serialize> IntoResponse for Paginated<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Same path and query, with `limit` and `offset` replaced.
fn page_link(uri: &Uri, limit: u64, offset: u64) -> String {
    let mut pairs: Vec<String> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split_once('=').map_or(*pair, |(key, _)| key);
            key != "limit" && key != "offset"
        })
        .map(ToString::to_string)
        .collect();

    pairs.push(format!("limit={limit}"));
    if offset > 0 {
        pairs.push(format!("offset={offset}"));
    }

    format!("{}?{}", uri.path(), pairs.join("&"))
}

/// 201 with the created object.
pub fn created<T: Serialize>(body: T) -> Response {
    (StatusCode::CREATED, Json(body)).into_response()
}

/// Empty success response.
#[must_use]
pub fn no_content() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
