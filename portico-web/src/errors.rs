//! Web layer error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use portico_api_types::{ApiError, ErrorCode};
use thiserror::Error;

pub type WebResult<T> = Result<T, WebError>;

/// Errors raised before a request reaches domain logic
#[derive(Error, Debug)]
pub enum WebError {
    #[error("Missing or malformed Authorization header")]
    MissingBearer,

    #[error("Token invalid")]
    TokenInvalid,

    #[error("Token expired")]
    TokenExpired,

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl WebError {
    pub fn to_api_error(&self) -> ApiError {
        match self {
            WebError::MissingBearer | WebError::TokenInvalid => {
                ApiError::new(ErrorCode::TokenInvalid, "Token invalid")
            }
            WebError::TokenExpired => ApiError::new(ErrorCode::TokenExpired, "Token expired"),
            WebError::Forbidden(_) => ApiError::not_permitted(),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let api_error = self.to_api_error();
        let status = StatusCode::from_u16(api_error.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(api_error)).into_response()
    }
}
