//! Role-based visibility of expertises
//!
//! A requester sees every expertise when they belong to the
//! `expertise_master` group. Leaders and deputies of a structural unit see
//! the expertises of their unit's work programs plus those they are assigned
//! to. Everybody else sees only the expertises they are assigned to.

use sqlx::{QueryBuilder, Sqlite};

use crate::error::Result;
use crate::models::{UnitStatus, User, EXPERTISE_MASTER_GROUP};
use crate::store::Store;

/// Which expertises a requester is allowed to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpertiseScope {
    /// Every expertise
    All,
    /// Expertises of led units, plus assigned ones
    Leadership { user_id: i64 },
    /// Only expertises the user is assigned to
    Assigned { user_id: i64 },
}

impl ExpertiseScope {
    /// Pick the scope from the requester's roles. Mastership wins outright.
    pub fn from_roles(user_id: i64, is_master: bool, leads_unit: bool) -> Self {
        if is_master {
            ExpertiseScope::All
        } else if leads_unit {
            ExpertiseScope::Leadership { user_id }
        } else {
            ExpertiseScope::Assigned { user_id }
        }
    }

    pub async fn resolve(store: &Store, user: &User) -> Result<Self> {
        let is_master = store.user_in_group(user.id, EXPERTISE_MASTER_GROUP).await?;
        // Skip the unit lookup once mastership is known
        let leads_unit = !is_master && store.leads_structural_unit(user.id).await?;

        let scope = Self::from_roles(user.id, is_master, leads_unit);
        tracing::debug!(user_id = user.id, ?scope, "Resolved expertise scope");
        Ok(scope)
    }

    /// Append the visibility predicate to a query over `expertises e`
    /// joined with `work_programs wp`.
    pub fn push_predicate(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        match *self {
            ExpertiseScope::All => {}
            ExpertiseScope::Leadership { user_id } => {
                builder
                    .push(
                        " AND (EXISTS (SELECT 1 FROM user_structural_units usu \
                         WHERE usu.structural_unit_id = wp.structural_unit_id \
                         AND usu.user_id = ",
                    )
                    .push_bind(user_id)
                    .push(" AND usu.status IN (")
                    .push_bind(UnitStatus::Leader.as_str())
                    .push(", ")
                    .push_bind(UnitStatus::Deputy.as_str())
                    .push(")) OR ");
                push_assigned(builder, user_id);
                builder.push(")");
            }
            ExpertiseScope::Assigned { user_id } => {
                builder.push(" AND ");
                push_assigned(builder, user_id);
            }
        }
    }
}

fn push_assigned(builder: &mut QueryBuilder<'_, Sqlite>, user_id: i64) {
    builder
        .push(
            "EXISTS (SELECT 1 FROM user_expertises sue \
             WHERE sue.expertise_id = e.id AND sue.expert_id = ",
        )
        .push_bind(user_id)
        .push(")");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::setup_test_db;

    #[test]
    fn test_master_short_circuits() {
        assert_eq!(ExpertiseScope::from_roles(1, true, true), ExpertiseScope::All);
        assert_eq!(ExpertiseScope::from_roles(1, true, false), ExpertiseScope::All);
    }

    #[test]
    fn test_leader_scope() {
        assert_eq!(
            ExpertiseScope::from_roles(4, false, true),
            ExpertiseScope::Leadership { user_id: 4 }
        );
    }

    #[test]
    fn test_plain_user_scope() {
        assert_eq!(
            ExpertiseScope::from_roles(4, false, false),
            ExpertiseScope::Assigned { user_id: 4 }
        );
    }

    #[test]
    fn test_all_pushes_nothing() {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT 1 WHERE 1 = 1");
        ExpertiseScope::All.push_predicate(&mut builder);
        assert_eq!(builder.sql(), "SELECT 1 WHERE 1 = 1");
    }

    #[test]
    fn test_leadership_predicate_unions_assignment() {
        let mut builder = QueryBuilder::<Sqlite>::new("");
        ExpertiseScope::Leadership { user_id: 2 }.push_predicate(&mut builder);
        let sql = builder.sql();
        assert!(sql.contains("user_structural_units"));
        assert!(sql.contains(" OR EXISTS (SELECT 1 FROM user_expertises"));
    }

    #[tokio::test]
    async fn test_resolve_from_store() {
        let store = setup_test_db().await;
        let master = store.create_user("master", "M", "M").await.unwrap();
        let leader = store.create_user("leader", "L", "L").await.unwrap();
        let plain = store.create_user("plain", "P", "P").await.unwrap();

        store
            .add_user_to_group(master.id, EXPERTISE_MASTER_GROUP)
            .await
            .unwrap();
        let unit = store.create_structural_unit("History").await.unwrap();
        store
            .add_unit_member(leader.id, unit, UnitStatus::Leader)
            .await
            .unwrap();

        assert_eq!(
            ExpertiseScope::resolve(&store, &master).await.unwrap(),
            ExpertiseScope::All
        );
        assert_eq!(
            ExpertiseScope::resolve(&store, &leader).await.unwrap(),
            ExpertiseScope::Leadership { user_id: leader.id }
        );
        assert_eq!(
            ExpertiseScope::resolve(&store, &plain).await.unwrap(),
            ExpertiseScope::Assigned { user_id: plain.id }
        );
    }
}
