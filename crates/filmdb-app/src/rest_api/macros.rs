/// Generates CRUD handlers for simple value entity (director, genre) in module `crud_api`.
///
/// Second argument names `MovieFilter` constructor selecting movies, which reference
/// the entity; it guards deletion when strict references are enabled.
#[macro_export]
macro_rules! crud_api {
    ($entity:ident, $referenced_by:ident) => {
        paste::paste! {
        crate::repository_from_request!([<$entity Repository>]);

        pub mod crud_api {
            use super::*;
            use crate::error::{ApiError, ApiResult};
            use crate::rest_api::RecordId;
            use crate::state::AppState;
            use crate::validate::Valid;
            use axum::{
                extract::State,
                response::IntoResponse,
                Json,
            };
            use filmdb_dal::movie::{MovieFilter, MovieRepository};
            use http::{StatusCode, Uri};
            use tracing::debug;

            type EntityRepository = [<$entity Repository>];

            #[cfg_attr(feature = "openapi",  utoipa::path(get, path = "", tag = stringify!($entity), operation_id = concat!("list", stringify!($entity)),
            responses((status = StatusCode::OK, description = "List all, sorted by id", body = Vec<$entity>))))]
            pub async fn list(repository: EntityRepository) -> ApiResult<impl IntoResponse> {
                let records = repository.list().await?;
                Ok((StatusCode::OK, Json(records)))
            }

            #[cfg_attr(feature = "openapi",  utoipa::path(get, path = "/{id}", tag = stringify!($entity), operation_id = concat!("get", stringify!($entity)),
            params(("id" = i64, Path, description = "Record id")),
            responses((status = StatusCode::OK, description = "Get one", body = $entity),
                (status = StatusCode::NOT_FOUND, description = "Not found", body = crate::error::ErrorBody))))]
            pub async fn get(
                RecordId(id): RecordId,
                repository: EntityRepository,
            ) -> ApiResult<impl IntoResponse> {
                let record = repository.get(id).await?;

                Ok((StatusCode::OK, Json(record)))
            }

            #[cfg_attr(feature = "openapi",  utoipa::path(post, path = "", tag = stringify!($entity), operation_id = concat!("create", stringify!($entity)),
            request_body = [<Create $entity>],
            responses((status = StatusCode::CREATED, description = concat!("Created ", stringify!($entity), ", location header points to new record")),
                (status = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid payload", body = crate::error::ErrorBody))))]
            pub async fn create(
                repository: EntityRepository,
                uri: Uri,
                Valid(Json(payload)): Valid<Json<[<Create $entity>]>>,
            ) -> ApiResult<impl IntoResponse> {
                let record = repository.create(payload).await?;

                Ok(crate::rest_api::created(&uri, record.id))
            }

            #[cfg_attr(feature = "openapi",  utoipa::path(put, path = "/{id}", tag = stringify!($entity), operation_id = concat!("update", stringify!($entity)),
            params(("id" = i64, Path, description = "Record id")),
            request_body = [<Create $entity>],
            responses((status = StatusCode::NO_CONTENT, description = concat!("Replaced ", stringify!($entity))),
                (status = StatusCode::NOT_FOUND, description = "Not found", body = crate::error::ErrorBody))))]
            pub async fn update(
                RecordId(id): RecordId,
                repository: EntityRepository,
                Valid(Json(payload)): Valid<Json<[<Create $entity>]>>,
            ) -> ApiResult<impl IntoResponse> {
                repository.update(id, payload).await?;

                Ok(StatusCode::NO_CONTENT)
            }

            #[cfg_attr(feature = "openapi",  utoipa::path(delete, path = "/{id}", tag = stringify!($entity), operation_id = concat!("delete", stringify!($entity)),
            params(("id" = i64, Path, description = "Record id")),
            responses((status = StatusCode::NO_CONTENT, description = concat!("Deleted ", stringify!($entity))),
                (status = StatusCode::NOT_FOUND, description = "Not found", body = crate::error::ErrorBody),
                (status = StatusCode::CONFLICT, description = "Still referenced by movies", body = crate::error::ErrorBody))))]
            pub async fn delete(
                RecordId(id): RecordId,
                State(state): State<AppState>,
                repository: EntityRepository,
                movies: MovieRepository,
            ) -> ApiResult<impl IntoResponse> {
                if state.config().strict_references {
                    let referencing = movies.count(MovieFilter::$referenced_by(id)).await?;
                    if referencing > 0 {
                        debug!("Refusing to delete {} {id}, referenced by {referencing} movies", stringify!($entity));
                        return Err(ApiError::Conflict(format!(
                            "{} {id} is referenced by {referencing} movies",
                            stringify!($entity)
                        )));
                    }
                }
                repository.delete(id).await?;

                Ok(StatusCode::NO_CONTENT)
            }

            #[cfg(feature = "openapi")]
            #[derive(utoipa::OpenApi)]
            #[openapi(paths(list, get, create, update, delete))]
            struct ApiDocs;

            #[cfg(feature = "openapi")]
            pub(super) fn api_docs() -> utoipa::openapi::OpenApi {
                use utoipa::OpenApi as _;
                ApiDocs::openapi()
            }
        }
        }
    };
}

#[macro_export]
macro_rules! publish_api_docs {
    () => {
        #[cfg(feature = "openapi")]
        pub fn api_docs() -> utoipa::openapi::OpenApi {
            crud_api::api_docs()
        }
    };
}

/// Router for collection at `$path`, the collection is reachable with and without trailing slash.
#[macro_export]
macro_rules! value_router {
    ($path:literal) => {
        pub fn router() -> axum::Router<crate::state::AppState> {
            use axum::routing::get;
            axum::Router::new()
                .route($path, get(crud_api::list).post(crud_api::create))
                .route(
                    concat!($path, "/"),
                    get(crud_api::list).post(crud_api::create),
                )
                .route(
                    concat!($path, "/{id}"),
                    get(crud_api::get)
                        .put(crud_api::update)
                        .delete(crud_api::delete),
                )
        }
    };
}
