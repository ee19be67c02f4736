//! HTTP routes for the expertise workflow

mod assignments;
mod comments;
mod expertise;

use axum::http::Method;
use axum::routing::{get, patch};
use axum::Router;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::AppState;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/expertise",
            get(expertise::list).post(expertise::create),
        )
        .route(
            "/api/expertise/:id",
            get(expertise::retrieve)
                .patch(expertise::update)
                .put(expertise::update),
        )
        .route(
            "/api/expertise/work_program/:work_program_id",
            get(expertise::by_work_program),
        )
        .route(
            "/api/expertise/user",
            get(assignments::list_mine).post(assignments::create),
        )
        .route(
            "/api/expertise/user/:expertise_id",
            get(assignments::list_mine_in),
        )
        .route(
            "/api/expertise/assignment/:id",
            patch(assignments::update)
                .put(assignments::update)
                .delete(assignments::delete),
        )
        .route(
            "/api/expertise/comments",
            get(comments::list_all).post(comments::create),
        )
        .route(
            "/api/expertise/comments/:expertise_id",
            get(comments::list),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// PUT replaces the whole record, so every writable field must be present
fn require_for_put<T>(method: &Method, field: &Option<T>, name: &str) -> Result<()> {
    if *method == Method::PUT && field.is_none() {
        return Err(AppError::BadRequest(format!(
            "{}: this field is required",
            name
        )));
    }
    Ok(())
}
