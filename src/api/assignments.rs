use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::Json;
use std::sync::Arc;

use super::require_for_put;
use crate::auth::CurrentUser;
use crate::error::Result;
use crate::models::{CreateUserExpertiseRequest, UpdateUserExpertiseRequest, UserExpertise};
use crate::permissions::{require, Permission, Target};
use crate::AppState;

/// Every assignment held by the requester
pub async fn list_mine(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<UserExpertise>>> {
    require(
        &state.store,
        &user,
        &Method::GET,
        &[Permission::ExpertiseMember],
        Target::Collection,
    )
    .await?;

    Ok(Json(state.store.list_user_expertises(user.id, None).await?))
}

/// The requester's assignments within one expertise
pub async fn list_mine_in(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(expertise_id): Path<i64>,
) -> Result<Json<Vec<UserExpertise>>> {
    require(
        &state.store,
        &user,
        &Method::GET,
        &[Permission::ExpertiseMember],
        Target::ExpertiseId(expertise_id),
    )
    .await?;

    Ok(Json(
        state
            .store
            .list_user_expertises(user.id, Some(expertise_id))
            .await?,
    ))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateUserExpertiseRequest>,
) -> Result<(StatusCode, Json<UserExpertise>)> {
    require(
        &state.store,
        &user,
        &Method::POST,
        &[Permission::ExpertiseMember],
        Target::ExpertiseId(request.expertise),
    )
    .await?;

    let assignment = state.store.create_user_expertise(request).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    method: Method,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserExpertiseRequest>,
) -> Result<Json<UserExpertise>> {
    let permissions = [Permission::AssignmentMember];
    require(&state.store, &user, &method, &permissions, Target::Collection).await?;

    let assignment = state.store.get_user_expertise(id).await?;
    require(
        &state.store,
        &user,
        &method,
        &permissions,
        Target::Assignment(&assignment),
    )
    .await?;
    require_for_put(
        &method,
        &request.user_expertise_status,
        "user_expertise_status",
    )?;

    Ok(Json(state.store.update_user_expertise(id, request).await?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    require(
        &state.store,
        &user,
        &Method::DELETE,
        &[Permission::ExpertiseMaster],
        Target::Collection,
    )
    .await?;

    state.store.delete_user_expertise(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
