//! Request body extractors that report failures as JSON 400s.

use axum::{
    Json,
    extract::{
        FromRequest, Request,
        multipart::MultipartError,
        rejection::JsonRejection,
    },
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// `axum::Json`, but a malformed or mistyped body is a 400 with the usual
/// `{message}` envelope instead of axum's plain-text 422.
///
/// Unknown order status labels are refused here.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(error: MultipartError) -> Self {
        Self::BadRequest(error.body_text())
    }
}
