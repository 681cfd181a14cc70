use super::RecordId;
use crate::error::{ApiError, ApiResult};
use crate::validate::Valid;
use axum::{
    extract::Query,
    response::IntoResponse,
    routing, Json, Router,
};
use filmdb_dal::movie::{CreateMovie, MovieFilter, MovieRepository};
use garde::Validate;
use http::{StatusCode, Uri};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::state::AppState;

crate::repository_from_request!(MovieRepository);

/// Optional filter keys, zero, empty or missing key means no constraint
#[derive(Debug, Clone, Copy, Default, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct MovieQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    #[garde(range(min = 0))]
    pub director_id: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[garde(range(min = 0))]
    pub genre_id: Option<i64>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(id) => id.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl From<MovieQuery> for MovieFilter {
    fn from(value: MovieQuery) -> Self {
        MovieFilter::new(value.director_id, value.genre_id)
    }
}

#[cfg_attr(feature = "openapi",  utoipa::path(get, path = "", tag = "Movie", operation_id = "listMovie",
    params(MovieQuery),
    responses((status = StatusCode::OK, description = "Movies matching filter, sorted by id", body = Vec<filmdb_dal::movie::Movie>),
        (status = StatusCode::NOT_FOUND, description = "Filter matched no movie", body = crate::error::ErrorBody),
        (status = StatusCode::BAD_REQUEST, description = "Malformed query", body = crate::error::ErrorBody))))]
pub async fn list(
    repository: MovieRepository,
    Valid(Query(query)): Valid<Query<MovieQuery>>,
) -> ApiResult<impl IntoResponse> {
    let filter = MovieFilter::from(query);
    debug!("Listing movies with {filter}");
    let movies = repository.list(filter).await?;
    if movies.is_empty() && !filter.is_empty() {
        return Err(ApiError::NoMatch(filter.to_string()));
    }
    Ok((StatusCode::OK, Json(movies)))
}

#[cfg_attr(feature = "openapi",  utoipa::path(get, path = "/{id}", tag = "Movie", operation_id = "getMovie",
    params(("id" = i64, Path, description = "Movie id")),
    responses((status = StatusCode::OK, description = "Get one", body = filmdb_dal::movie::Movie),
        (status = StatusCode::NOT_FOUND, description = "Not found", body = crate::error::ErrorBody))))]
pub async fn get(RecordId(id): RecordId, repository: MovieRepository) -> ApiResult<impl IntoResponse> {
    let movie = repository.get(id).await?;
    Ok((StatusCode::OK, Json(movie)))
}

#[cfg_attr(feature = "openapi",  utoipa::path(post, path = "", tag = "Movie", operation_id = "createMovie",
    request_body = CreateMovie,
    responses((status = StatusCode::CREATED, description = "Created movie, location header points to new record"),
        (status = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid payload", body = crate::error::ErrorBody))))]
pub async fn create(
    repository: MovieRepository,
    uri: Uri,
    Valid(Json(payload)): Valid<Json<CreateMovie>>,
) -> ApiResult<impl IntoResponse> {
    let movie = repository.create(payload).await?;
    Ok(super::created(&uri, movie.id))
}

#[cfg_attr(feature = "openapi",  utoipa::path(put, path = "/{id}", tag = "Movie", operation_id = "updateMovie",
    params(("id" = i64, Path, description = "Movie id")),
    request_body = CreateMovie,
    responses((status = StatusCode::NO_CONTENT, description = "Replaced movie"),
        (status = StatusCode::NOT_FOUND, description = "Not found", body = crate::error::ErrorBody))))]
pub async fn update(
    RecordId(id): RecordId,
    repository: MovieRepository,
    Valid(Json(payload)): Valid<Json<CreateMovie>>,
) -> ApiResult<impl IntoResponse> {
    repository.update(id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg_attr(feature = "openapi",  utoipa::path(delete, path = "/{id}", tag = "Movie", operation_id = "deleteMovie",
    params(("id" = i64, Path, description = "Movie id")),
    responses((status = StatusCode::NO_CONTENT, description = "Deleted movie"),
        (status = StatusCode::NOT_FOUND, description = "Not found", body = crate::error::ErrorBody))))]
pub async fn delete(RecordId(id): RecordId, repository: MovieRepository) -> ApiResult<impl IntoResponse> {
    repository.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(list, get, create, update, delete))]
struct ApiDocs;

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    ApiDocs::openapi()
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/movies", routing::get(list).post(create))
        .route("/movies/", routing::get(list).post(create))
        .route(
            "/movies/{id}",
            routing::get(get).put(update).delete(delete),
        )
}
