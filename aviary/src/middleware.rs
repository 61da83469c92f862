//! Request middleware.

use std::{any::Any, panic::AssertUnwindSafe};

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};
use futures::FutureExt;
use tracing::{Instrument, error, info_span, warn};
use uuid::Uuid;

use crate::error::{ApiError, ErrorEnvelope, PendingFailure};

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Turns every failure of the inner service into an [`ErrorEnvelope`] response.
///
/// Handlers report failures by returning [`ApiError`]; a handler that panics is
/// reported as a generic failure. The router's own bare `405` for a method the
/// route does not accept is replaced by an envelope, keeping its `Allow` header.
///
/// Each request gets a fresh id, attached to the request span and echoed in the
/// `x-request-id` response header.
///
/// Only failures that happen before the response is returned are seen here. A
/// streaming body that fails after its headers went out is not intercepted.
pub async fn handle_errors(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    async move {
        let outcome = AssertUnwindSafe(next.run(request)).catch_unwind().await;

        let mut response = match outcome {
            Ok(mut response) => match response.extensions_mut().remove::<PendingFailure>() {
                Some(PendingFailure(failure)) => render(&failure),
                None if response.status() == StatusCode::METHOD_NOT_ALLOWED => {
                    let allow = response.headers().get(header::ALLOW).cloned();
                    let mut rendered = render(&ApiError::MethodNotAllowed { method, path });
                    if let Some(allow) = allow {
                        rendered.headers_mut().insert(header::ALLOW, allow);
                    }
                    rendered
                }
                None => response,
            },
            Err(panic) => {
                let failure = ApiError::Generic(panic_message(panic.as_ref()));
                render(&failure)
            }
        };

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}

fn render(failure: &ApiError) -> Response {
    let status = failure.status_code();
    if status.is_server_error() {
        error!(kind = ?failure.kind(), status = status.as_u16(), error = %failure, "request failed");
    } else {
        warn!(kind = ?failure.kind(), status = status.as_u16(), error = %failure, "request rejected");
    }

    ErrorEnvelope::from(failure).into_response()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("Handler panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("Handler panicked: {message}")
    } else {
        "Handler panicked".to_string()
    }
}
