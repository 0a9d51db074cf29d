use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use codeatlas_api::ApiError;
use serde::Serialize;

/// Wraps `ApiError` so it can be returned straight from a handler; status
/// mapping is `ApiError::http_status`, translated into axum's `StatusCode`
/// here at the transport boundary.
#[derive(Debug)]
pub struct HttpError(pub ApiError);

impl From<ApiError> for HttpError {
    fn from(value: ApiError) -> Self {
        Self(value)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a ApiError,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorBody { error: &self.0 })).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, HttpError>;
