use axum::{
    extract::{FromRequestParts, Path},
    response::IntoResponse,
    Router,
};
use http::{header::LOCATION, StatusCode, Uri};
use serde::Deserialize;

use crate::{error::ApiError, state::AppState};

pub mod director;
pub mod genre;
mod macros;
pub mod movie;

/// All resource routes
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(movie::router())
        .merge(director::router())
        .merge(genre::router())
}

/// Record id taken from `/{id}` path segment, unparsable id is reported as `ApiError`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, FromRequestParts)]
#[serde(transparent)]
#[from_request(via(Path), rejection(ApiError))]
pub struct RecordId(pub i64);

/// Empty `201 Created` response with location of new record, which is resolved
/// against path of the collection the record was posted to.
pub(crate) fn created(uri: &Uri, id: i64) -> impl IntoResponse {
    let location = format!("{}/{}", uri.path().trim_end_matches('/'), id);
    (StatusCode::CREATED, [(LOCATION, location)])
}

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::openapi::OpenApiBuilder;
    OpenApiBuilder::new()
        .build()
        .nest("/movies", movie::api_docs())
        .nest("/directors", director::api_docs())
        .nest("/genres", genre::api_docs())
}
