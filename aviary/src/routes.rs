//! # HTTP Routes
//!
//! `/birds` CRUD endpoints plus the two service endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{Method, StatusCode, Uri},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use aviary_core::document::{Document, Fields};

use crate::db::Database;
use crate::error::{ApiError, ApiResult};
use crate::middleware::handle_errors;

/// Builds the application router over `db`.
pub fn router(db: Database) -> Router {
    let routes = Router::new()
        .route("/", get(hello_handler))
        .route("/error/test", get(error_test_handler))
        .route("/birds", post(create_bird_handler))
        .route(
            "/birds/:id",
            get(get_bird_handler)
                .put(update_bird_handler)
                .delete(delete_bird_handler),
        )
        .fallback(route_not_found_handler)
        .with_state(db);

    with_middleware(routes)
}

/// Wraps `router` in request tracing and error handling.
///
/// Everything the router serves, its fallback included, runs inside
/// [`handle_errors`].
pub fn with_middleware(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(handle_errors)),
    )
}

// ==================
// Service Endpoints
// ==================

async fn hello_handler() -> Json<Value> {
    Json(json!({ "hello": "world" }))
}

async fn error_test_handler() -> ApiResult<Json<Value>> {
    Err(ApiError::Generic("Error handling works!".to_string()))
}

async fn route_not_found_handler(method: Method, uri: Uri) -> ApiError {
    ApiError::RouteNotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}

// ==================
// Birds
// ==================

/// Create a bird
async fn create_bird_handler(
    State(db): State<Database>,
    body: Result<Json<Fields>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let Json(fields) = body?;
    db.connect().await?;

    let bird = db.birds().insert_one(fields).await?;
    Ok((StatusCode::CREATED, Json(bird)))
}

/// Get a bird by id
async fn get_bird_handler(
    State(db): State<Database>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Document>> {
    let Path(id) = path?;
    db.connect().await?;

    let bird = db.birds().find_one_by_id(&id).await?;
    Ok(Json(bird))
}

/// Merge the body's fields into a bird
async fn update_bird_handler(
    State(db): State<Database>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<Fields>, JsonRejection>,
) -> ApiResult<Json<Document>> {
    let Path(id) = path?;
    let Json(changes) = body?;
    db.connect().await?;

    let bird = db.birds().find_one_and_update(&id, changes).await?;
    Ok(Json(bird))
}

/// Delete a bird
async fn delete_bird_handler(
    State(db): State<Database>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = path?;
    db.connect().await?;

    db.birds().remove_one(&id).await?;
    Ok(Json(json!({ "success": true })))
}
