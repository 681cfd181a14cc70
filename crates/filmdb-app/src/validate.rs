use axum::extract::{FromRequest, FromRequestParts, Request};
use garde::Validate;
use http::request::Parts;
use std::ops::{Deref, DerefMut};

use crate::{error::ApiError, state::AppState};

/// Extractor wrapper, which validates extracted value with `garde`.
///
/// Works for body extractors like `Json` as well as for `Query`. Both failed
/// extraction and failed validation are reported as `ApiError`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Valid<E>(pub E);

impl<E> Deref for Valid<E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<E> DerefMut for Valid<E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<E> Valid<E> {
    pub fn into_inner(self) -> E {
        self.0
    }
}

fn validate<T: Validate<Context = ()>>(value: &T) -> Result<(), ApiError> {
    value
        .validate()
        .map_err(|report| ApiError::InvalidRequest(report.to_string().trim_end().to_string()))
}

impl<Extractor, T> FromRequest<AppState> for Valid<Extractor>
where
    T: Validate<Context = ()>,
    Extractor: Deref<Target = T> + FromRequest<AppState>,
    ApiError: From<<Extractor as FromRequest<AppState>>::Rejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let inner = Extractor::from_request(req, state).await?;
        validate(inner.deref())?;
        Ok(Valid(inner))
    }
}

impl<Extractor, T> FromRequestParts<AppState> for Valid<Extractor>
where
    T: Validate<Context = ()>,
    Extractor: Deref<Target = T> + FromRequestParts<AppState>,
    ApiError: From<<Extractor as FromRequestParts<AppState>>::Rejection>,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let inner = Extractor::from_request_parts(parts, state).await?;
        validate(inner.deref())?;
        Ok(Valid(inner))
    }
}
