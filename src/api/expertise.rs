use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::Json;
use std::sync::Arc;

use super::require_for_put;
use crate::auth::CurrentUser;
use crate::error::Result;
use crate::filters::ExpertiseQuery;
use crate::models::{CreateExpertiseRequest, Expertise, ExpertiseDetail, UpdateExpertiseRequest};
use crate::permissions::{require, Permission, Target};
use crate::scope::ExpertiseScope;
use crate::AppState;

/// Expertises the requester may see, filtered and ordered by the query
pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ExpertiseQuery>,
) -> Result<Json<Vec<Expertise>>> {
    require(
        &state.store,
        &user,
        &Method::GET,
        &[Permission::AssignmentMember],
        Target::Collection,
    )
    .await?;

    let scope = ExpertiseScope::resolve(&state.store, &user).await?;
    let expertises = state.store.list_expertises(&scope, &query).await?;
    Ok(Json(expertises))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateExpertiseRequest>,
) -> Result<(StatusCode, Json<ExpertiseDetail>)> {
    require(
        &state.store,
        &user,
        &Method::POST,
        &[Permission::DeveloperOrReadOnly],
        Target::WorkProgram(request.work_program),
    )
    .await?;

    let expertise = state.store.create_expertise(&user, request).await?;
    let detail = state.store.expertise_detail(expertise).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ExpertiseDetail>> {
    require(
        &state.store,
        &user,
        &Method::GET,
        &[Permission::ExpertiseMaster],
        Target::ExpertiseId(id),
    )
    .await?;

    let expertise = state.store.get_expertise(id).await?;
    Ok(Json(state.store.expertise_detail(expertise).await?))
}

/// PATCH changes the given fields, PUT requires all of them
pub async fn update(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    method: Method,
    Path(id): Path<i64>,
    Json(request): Json<UpdateExpertiseRequest>,
) -> Result<Json<ExpertiseDetail>> {
    require(
        &state.store,
        &user,
        &method,
        &[Permission::ExpertiseMaster],
        Target::ExpertiseId(id),
    )
    .await?;
    require_for_put(&method, &request.expertise_status, "expertise_status")?;

    let expertise = state.store.update_expertise(id, request).await?;
    Ok(Json(state.store.expertise_detail(expertise).await?))
}

/// The expertise opened for a work program
pub async fn by_work_program(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(work_program_id): Path<i64>,
) -> Result<Json<ExpertiseDetail>> {
    let permissions = [
        Permission::WorkProgramParticipant,
        Permission::DeveloperOrReadOnly,
    ];
    require(
        &state.store,
        &user,
        &Method::GET,
        &permissions,
        Target::WorkProgram(work_program_id),
    )
    .await?;

    let expertise = state
        .store
        .get_expertise_by_work_program(work_program_id)
        .await?;
    require(
        &state.store,
        &user,
        &Method::GET,
        &permissions,
        Target::Expertise(&expertise),
    )
    .await?;

    Ok(Json(state.store.expertise_detail(expertise).await?))
}
