//! # API Errors
//!
//! Failures raised while handling a request, and the envelope they are rendered as.
//!
//! Handlers return [`ApiError`]. Its `IntoResponse` does not render anything itself:
//! it parks the error in the response extensions, and the
//! [`handle_errors`](crate::middleware::handle_errors) middleware turns it into the
//! envelope. That keeps the middleware the only place where failures become wire
//! responses.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use aviary_core::error::DocumentStoreError;

/// Result type for request handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Anything that can go wrong while handling a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failure reported by the data-access layer
    #[error(transparent)]
    Store(#[from] DocumentStoreError),

    /// The request body could not be parsed as a JSON object
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// A path parameter could not be extracted
    #[error("Invalid path parameter: {0}")]
    InvalidPath(String),

    /// No route matches the request
    #[error("No route for {method} {path}")]
    RouteNotFound { method: String, path: String },

    /// The route exists but does not accept this method
    #[error("Method {method} not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },

    /// Any other failure
    #[error("{0}")]
    Generic(String),
}

/// The kinds of failure a client can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ConnectionError,
    NotConnectedError,
    InvalidIdError,
    NotFoundError,
    InsertError,
    InvalidBodyError,
    MethodNotAllowedError,
    GenericFailure,
}

impl ErrorKind {
    /// Get HTTP status code for this kind
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::InvalidIdError | ErrorKind::InvalidBodyError => StatusCode::BAD_REQUEST,
            ErrorKind::NotFoundError => StatusCode::NOT_FOUND,
            ErrorKind::MethodNotAllowedError => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::ConnectionError => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::NotConnectedError | ErrorKind::InsertError | ErrorKind::GenericFailure => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Store(err) => match err {
                DocumentStoreError::Connection(_) => ErrorKind::ConnectionError,
                DocumentStoreError::NotConnected(_) => ErrorKind::NotConnectedError,
                DocumentStoreError::InvalidId(_) => ErrorKind::InvalidIdError,
                DocumentStoreError::DocumentNotFound(..) => ErrorKind::NotFoundError,
                DocumentStoreError::Insert(..) => ErrorKind::InsertError,
                DocumentStoreError::InvalidFields(_) => ErrorKind::InvalidBodyError,
                DocumentStoreError::InvalidDocument(_)
                | DocumentStoreError::Serialization(_)
                | DocumentStoreError::InvariantViolation(_)
                | DocumentStoreError::Backend(_) => ErrorKind::GenericFailure,
            },
            ApiError::InvalidBody(_) => ErrorKind::InvalidBodyError,
            ApiError::InvalidPath(_) => ErrorKind::InvalidIdError,
            ApiError::RouteNotFound { .. } => ErrorKind::NotFoundError,
            ApiError::MethodNotAllowed { .. } => ErrorKind::MethodNotAllowedError,
            ApiError::Generic(_) => ErrorKind::GenericFailure,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidPath(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    pub kind: ErrorKind,
    pub message: String,
    pub status: u16,
}

impl From<&ApiError> for ErrorEnvelope {
    fn from(err: &ApiError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            status: err.status_code().as_u16(),
        }
    }
}

impl ErrorEnvelope {
    pub fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// A failure waiting in the response extensions to be rendered by the middleware.
#[derive(Debug, Clone)]
pub(crate) struct PendingFailure(pub(crate) Arc<ApiError>);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = self.status_code().into_response();
        response
            .extensions_mut()
            .insert(PendingFailure(Arc::new(self)));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::from(DocumentStoreError::Connection("down".into())), StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::from(DocumentStoreError::NotConnected("birds".into())), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::from(DocumentStoreError::InvalidId("x".into())), StatusCode::BAD_REQUEST),
            (
                ApiError::from(DocumentStoreError::DocumentNotFound("a".into(), "birds".into())),
                StatusCode::NOT_FOUND,
            ),
            (ApiError::from(DocumentStoreError::Insert("birds".into(), "no ack".into())), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::from(DocumentStoreError::Backend("timeout".into())), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::from(DocumentStoreError::InvalidFields("too big".into())), StatusCode::BAD_REQUEST),
            (ApiError::InvalidBody("bad".into()), StatusCode::BAD_REQUEST),
            (ApiError::InvalidPath("bad utf-8".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::MethodNotAllowed { method: "PATCH".into(), path: "/birds/a".into() },
                StatusCode::METHOD_NOT_ALLOWED,
            ),
            (
                ApiError::RouteNotFound { method: "GET".into(), path: "/nope".into() },
                StatusCode::NOT_FOUND,
            ),
            (ApiError::Generic("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(error.status_code(), status, "{error:?}");
        }
    }

    #[test]
    fn test_not_found_and_invalid_id_are_distinct_kinds() {
        let missing = ApiError::from(DocumentStoreError::DocumentNotFound("a".into(), "birds".into()));
        let malformed = ApiError::from(DocumentStoreError::InvalidId("a".into()));

        assert_eq!(missing.kind(), ErrorKind::NotFoundError);
        assert_eq!(malformed.kind(), ErrorKind::InvalidIdError);
    }

    #[test]
    fn test_envelope_body() {
        let envelope = ErrorEnvelope::from(&ApiError::Generic("Error handling works!".into()));

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            serde_json::json!({
                "kind": "GenericFailure",
                "message": "Error handling works!",
                "status": 500,
            })
        );
    }

    #[test]
    fn test_into_response_defers_rendering() {
        let response = ApiError::Generic("boom".into()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<PendingFailure>().is_some());
    }
}
