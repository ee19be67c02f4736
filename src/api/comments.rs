use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::models::{CreateCommentRequest, ExpertiseComment};
use crate::permissions::{require, Permission, Target};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CommentQuery {
    pub block: Option<String>,
}

/// Every comment, regardless of expertise
pub async fn list_all(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ExpertiseComment>>> {
    require(
        &state.store,
        &user,
        &Method::GET,
        &[Permission::ExpertiseMember],
        Target::Collection,
    )
    .await?;

    Ok(Json(state.store.list_comments(None, None).await?))
}

/// Comments of one expertise, optionally narrowed to `?block=`
pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(expertise_id): Path<i64>,
    Query(query): Query<CommentQuery>,
) -> Result<Json<Vec<ExpertiseComment>>> {
    require(
        &state.store,
        &user,
        &Method::GET,
        &[Permission::ExpertiseMember],
        Target::ExpertiseId(expertise_id),
    )
    .await?;

    let comments = state
        .store
        .list_comments(Some(expertise_id), query.block.as_deref())
        .await?;
    Ok(Json(comments))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<ExpertiseComment>)> {
    let permissions = [Permission::ExpertiseMember];
    match state.store.get_user_expertise(request.user_expertise).await {
        Ok(assignment) => {
            require(
                &state.store,
                &user,
                &Method::POST,
                &permissions,
                Target::Assignment(&assignment),
            )
            .await?
        }
        // Unknown assignments are reported by validation below
        Err(AppError::NotFound(_)) => {
            require(
                &state.store,
                &user,
                &Method::POST,
                &permissions,
                Target::Collection,
            )
            .await?
        }
        Err(e) => return Err(e),
    }

    let comment = state.store.create_comment(request).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
