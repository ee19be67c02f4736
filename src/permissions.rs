//! Permission predicates guarding the expertise endpoints
//!
//! Each endpoint lists the permissions it needs; all of them must allow the
//! request. A permission is checked once before the resource is loaded
//! (against [`Target::Collection`] or an id from the request) and, for
//! endpoints acting on one record, again against the loaded record.

use axum::http::Method;

use crate::error::{AppError, Result};
use crate::models::{Expertise, User, UserExpertise, EXPERTISE_MASTER_GROUP, RPD_DEVELOPER_GROUP};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Member of the `expertise_master` group
    ExpertiseMaster,
    /// Master, or assigned to the expertise in question
    ExpertiseMember,
    /// Master, or the expert owning the assignment in question
    AssignmentMember,
    /// Read-only requests, or work program developers
    DeveloperOrReadOnly,
    /// Master, assigned expert, or editor of the expertise's work program
    WorkProgramParticipant,
}

/// What a request acts on
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Collection,
    ExpertiseId(i64),
    Expertise(&'a Expertise),
    Assignment(&'a UserExpertise),
    WorkProgram(i64),
}

impl Target<'_> {
    fn expertise_id(&self) -> Option<i64> {
        match self {
            Target::ExpertiseId(id) => Some(*id),
            Target::Expertise(expertise) => Some(expertise.id),
            Target::Assignment(assignment) => Some(assignment.expertise_id),
            Target::Collection | Target::WorkProgram(_) => None,
        }
    }

    fn work_program_id(&self) -> Option<i64> {
        match self {
            Target::Expertise(expertise) => Some(expertise.work_program.id),
            Target::WorkProgram(id) => Some(*id),
            _ => None,
        }
    }
}

impl Permission {
    pub async fn allows(
        &self,
        store: &Store,
        user: &User,
        method: &Method,
        target: Target<'_>,
    ) -> Result<bool> {
        let is_master = move || store.user_in_group(user.id, EXPERTISE_MASTER_GROUP);

        match self {
            Permission::ExpertiseMaster => is_master().await,
            Permission::ExpertiseMember => {
                if is_master().await? {
                    return Ok(true);
                }
                match target.expertise_id() {
                    Some(expertise_id) => store.is_expert_of(user.id, expertise_id).await,
                    None => store.has_any_assignment(user.id).await,
                }
            }
            Permission::AssignmentMember => match target {
                Target::Assignment(assignment) => {
                    Ok(assignment.expert.id == user.id || is_master().await?)
                }
                _ => Ok(true),
            },
            Permission::DeveloperOrReadOnly => {
                if is_safe(method) || store.user_in_group(user.id, RPD_DEVELOPER_GROUP).await? {
                    return Ok(true);
                }
                match target.work_program_id() {
                    Some(program) => store.is_work_program_editor(user.id, program).await,
                    None => Ok(false),
                }
            }
            Permission::WorkProgramParticipant => match target {
                Target::Expertise(expertise) => Ok(is_master().await?
                    || store.is_expert_of(user.id, expertise.id).await?
                    || store
                        .is_work_program_editor(user.id, expertise.work_program.id)
                        .await?),
                _ => Ok(true),
            },
        }
    }
}

/// Fail with `Forbidden` unless every permission allows the request
pub async fn require(
    store: &Store,
    user: &User,
    method: &Method,
    permissions: &[Permission],
    target: Target<'_>,
) -> Result<()> {
    for permission in permissions {
        if !permission.allows(store, user, method, target).await? {
            tracing::debug!(user_id = user.id, ?permission, "Permission denied");
            return Err(AppError::Forbidden(
                "You do not have permission to perform this action".to_string(),
            ));
        }
    }
    Ok(())
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}
