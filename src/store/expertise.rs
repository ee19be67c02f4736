use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

use super::{parse_column, reject_duplicate, Store};
use crate::error::{AppError, Result};
use crate::filters::ExpertiseQuery;
use crate::models::{
    CreateExpertiseRequest, Expertise, ExpertiseDetail, StuffStatus, UpdateExpertiseRequest, User,
    WorkProgramSummary,
};
use crate::scope::ExpertiseScope;

const EXPERTISE_SELECT: &str = r#"
    SELECT e.id, e.expertise_status, e.date_of_last_change,
           wp.id AS work_program_id,
           wp.title AS work_program_title,
           wp.qualification AS work_program_qualification,
           wp.discipline_code AS work_program_discipline_code
    FROM expertises e
    JOIN work_programs wp ON wp.id = e.work_program_id
"#;

impl Store {
    /// Expertises visible under `scope`, narrowed by the listing query
    pub async fn list_expertises(
        &self,
        scope: &ExpertiseScope,
        query: &ExpertiseQuery,
    ) -> Result<Vec<Expertise>> {
        let mut builder = QueryBuilder::<Sqlite>::new(EXPERTISE_SELECT);
        builder.push(" WHERE 1 = 1");
        scope.push_predicate(&mut builder);
        query.push_filters(&mut builder);
        query.push_ordering(&mut builder);

        let rows = builder
            .build_query_as::<ExpertiseRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    pub async fn get_expertise(&self, id: i64) -> Result<Expertise> {
        let row = sqlx::query_as::<_, ExpertiseRow>(&format!("{} WHERE e.id = ?", EXPERTISE_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Expertise {} not found", id)))?;

        row.try_into()
    }

    pub async fn get_expertise_by_work_program(&self, work_program_id: i64) -> Result<Expertise> {
        let row = sqlx::query_as::<_, ExpertiseRow>(&format!(
            "{} WHERE e.work_program_id = ?",
            EXPERTISE_SELECT
        ))
        .bind(work_program_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No expertise for work program {}",
                work_program_id
            ))
        })?;

        row.try_into()
    }

    /// Attach the participants of an expertise
    pub async fn expertise_detail(&self, expertise: Expertise) -> Result<ExpertiseDetail> {
        let experts = self.list_participants(expertise.id).await?;
        Ok(ExpertiseDetail { expertise, experts })
    }

    /// Open an expertise for a work program. The creator joins it as leader
    /// in the same transaction.
    pub async fn create_expertise(
        &self,
        creator: &User,
        request: CreateExpertiseRequest,
    ) -> Result<Expertise> {
        let work_program = match self.get_work_program(request.work_program).await {
            Ok(program) => program,
            Err(AppError::NotFound(msg)) => return Err(AppError::BadRequest(msg)),
            Err(e) => return Err(e),
        };

        let existing = sqlx::query("SELECT 1 FROM expertises WHERE work_program_id = ?")
            .bind(work_program.id)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::BadRequest(format!(
                "Work program {} already has an expertise",
                work_program.id
            )));
        }

        let status = request.expertise_status.unwrap_or_default();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO expertises (work_program_id, expertise_status, date_of_last_change)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(work_program.id)
        .bind(status.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            reject_duplicate(e, || {
                format!("Work program {} already has an expertise", work_program.id)
            })
        })?
        .last_insert_rowid();

        sqlx::query(
            r#"
            INSERT INTO user_expertises (expertise_id, expert_id, stuff_status)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(creator.id)
        .bind(StuffStatus::Leader.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            expertise_id = id,
            work_program_id = work_program.id,
            creator_id = creator.id,
            "Created expertise"
        );

        Ok(Expertise {
            id,
            work_program,
            expertise_status: status,
            date_of_last_change: now,
        })
    }

    /// Apply the given changes and refresh `date_of_last_change`
    pub async fn update_expertise(
        &self,
        id: i64,
        changes: UpdateExpertiseRequest,
    ) -> Result<Expertise> {
        let current = self.get_expertise(id).await?;
        let status = changes
            .expertise_status
            .unwrap_or(current.expertise_status);
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE expertises SET expertise_status = ?, date_of_last_change = ? WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        tracing::info!(expertise_id = id, status = status.as_str(), "Updated expertise");

        Ok(Expertise {
            expertise_status: status,
            date_of_last_change: now,
            ..current
        })
    }
}

#[derive(sqlx::FromRow)]
struct ExpertiseRow {
    id: i64,
    expertise_status: String,
    date_of_last_change: chrono::DateTime<Utc>,
    work_program_id: i64,
    work_program_title: String,
    work_program_qualification: String,
    work_program_discipline_code: String,
}

impl TryFrom<ExpertiseRow> for Expertise {
    type Error = AppError;

    fn try_from(row: ExpertiseRow) -> Result<Self> {
        Ok(Expertise {
            id: row.id,
            work_program: WorkProgramSummary {
                id: row.work_program_id,
                title: row.work_program_title,
                qualification: row.work_program_qualification,
                discipline_code: row.work_program_discipline_code,
            },
            expertise_status: parse_column(&row.expertise_status, "expertise status")?,
            date_of_last_change: row.date_of_last_change,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExpertiseStatus, UnitStatus, EXPERTISE_MASTER_GROUP};
    use crate::store::test_support::{assign, seed_campus, setup_test_db};

    fn ids(expertises: &[Expertise]) -> Vec<i64> {
        expertises.iter().map(|e| e.id).collect()
    }

    async fn open(store: &Store, creator: &User, work_program: i64) -> Expertise {
        store
            .create_expertise(
                creator,
                CreateExpertiseRequest {
                    work_program,
                    expertise_status: None,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_expertise_makes_creator_leader() {
        let store = setup_test_db().await;
        let campus = seed_campus(&store).await;

        let expertise = open(&store, &campus.expert, campus.outside_program).await;
        assert_eq!(expertise.expertise_status, ExpertiseStatus::OnExpertise);
        assert_eq!(expertise.work_program.title, "Organic Chemistry");

        let participants = store.list_participants(expertise.id).await.unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].expert.id, campus.expert.id);
        assert_eq!(participants[0].stuff_status, StuffStatus::Leader);
    }

    #[tokio::test]
    async fn test_create_expertise_unknown_work_program() {
        let store = setup_test_db().await;
        let campus = seed_campus(&store).await;

        let result = store
            .create_expertise(
                &campus.expert,
                CreateExpertiseRequest {
                    work_program: 999,
                    expertise_status: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_expertise_twice_for_same_program() {
        let store = setup_test_db().await;
        let campus = seed_campus(&store).await;
        open(&store, &campus.expert, campus.inside_program).await;

        let result = store
            .create_expertise(
                &campus.outsider,
                CreateExpertiseRequest {
                    work_program: campus.inside_program,
                    expertise_status: Some(ExpertiseStatus::Rework),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_concurrent_create_for_same_program() {
        let store = setup_test_db().await;
        let campus = seed_campus(&store).await;
        let request = || CreateExpertiseRequest {
            work_program: campus.inside_program,
            expertise_status: None,
        };

        let (first, second) = tokio::join!(
            store.create_expertise(&campus.leader, request()),
            store.create_expertise(&campus.expert, request())
        );
        let created = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(created, 1);
        assert!(
            matches!(first, Err(AppError::BadRequest(_)))
                || matches!(second, Err(AppError::BadRequest(_)))
        );

        // The losing creator must not be left behind as a leader
        let expertise = store
            .get_expertise_by_work_program(campus.inside_program)
            .await
            .unwrap();
        let participants = store.list_participants(expertise.id).await.unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].stuff_status, StuffStatus::Leader);
    }

    #[tokio::test]
    async fn test_get_expertise_by_work_program() {
        let store = setup_test_db().await;
        let campus = seed_campus(&store).await;
        let created = open(&store, &campus.expert, campus.inside_program).await;

        let found = store
            .get_expertise_by_work_program(campus.inside_program)
            .await
            .unwrap();
        assert_eq!(found.id, created.id);

        let missing = store
            .get_expertise_by_work_program(campus.outside_program)
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_expertise_partial() {
        let store = setup_test_db().await;
        let campus = seed_campus(&store).await;
        let created = open(&store, &campus.expert, campus.inside_program).await;

        let unchanged = store
            .update_expertise(created.id, UpdateExpertiseRequest::default())
            .await
            .unwrap();
        assert_eq!(unchanged.expertise_status, ExpertiseStatus::OnExpertise);
        assert!(unchanged.date_of_last_change >= created.date_of_last_change);

        store
            .update_expertise(
                created.id,
                UpdateExpertiseRequest {
                    expertise_status: Some(ExpertiseStatus::Accepted),
                },
            )
            .await
            .unwrap();
        let reloaded = store.get_expertise(created.id).await.unwrap();
        assert_eq!(reloaded.expertise_status, ExpertiseStatus::Accepted);
    }

    #[tokio::test]
    async fn test_update_missing_expertise() {
        let store = setup_test_db().await;
        let result = store
            .update_expertise(5, UpdateExpertiseRequest::default())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_master_sees_everything() {
        let store = setup_test_db().await;
        let campus = seed_campus(&store).await;
        let a = open(&store, &campus.expert, campus.inside_program).await;
        let b = open(&store, &campus.expert, campus.outside_program).await;

        store
            .add_user_to_group(campus.outsider.id, EXPERTISE_MASTER_GROUP)
            .await
            .unwrap();
        let scope = ExpertiseScope::resolve(&store, &campus.outsider).await.unwrap();

        let listed = store
            .list_expertises(&scope, &ExpertiseQuery::default())
            .await
            .unwrap();
        assert_eq!(ids(&listed), vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn test_leader_sees_unit_and_assigned_without_duplicates() {
        let store = setup_test_db().await;
        let campus = seed_campus(&store).await;
        let inside = open(&store, &campus.expert, campus.inside_program).await;
        let outside = open(&store, &campus.expert, campus.outside_program).await;

        // Assigned to the unit's own expertise too: must not appear twice
        assign(&store, inside.id, campus.leader.id).await;

        let scope = ExpertiseScope::resolve(&store, &campus.leader).await.unwrap();
        let listed = store
            .list_expertises(&scope, &ExpertiseQuery::default())
            .await
            .unwrap();
        assert_eq!(ids(&listed), vec![inside.id]);

        assign(&store, outside.id, campus.leader.id).await;
        let listed = store
            .list_expertises(&scope, &ExpertiseQuery::default())
            .await
            .unwrap();
        assert_eq!(ids(&listed), vec![inside.id, outside.id]);
    }

    #[tokio::test]
    async fn test_deputy_sees_unit_expertises() {
        let store = setup_test_db().await;
        let campus = seed_campus(&store).await;
        let inside = open(&store, &campus.expert, campus.inside_program).await;
        open(&store, &campus.expert, campus.outside_program).await;

        store
            .add_unit_member(campus.outsider.id, campus.unit_id, UnitStatus::Deputy)
            .await
            .unwrap();
        let scope = ExpertiseScope::resolve(&store, &campus.outsider).await.unwrap();
        let listed = store
            .list_expertises(&scope, &ExpertiseQuery::default())
            .await
            .unwrap();
        assert_eq!(ids(&listed), vec![inside.id]);
    }

    #[tokio::test]
    async fn test_deputy_status_applies_to_its_own_unit_only() {
        let store = setup_test_db().await;
        let campus = seed_campus(&store).await;
        let physics = store.create_structural_unit("Physics").await.unwrap();
        let mechanics = store
            .create_work_program("Mechanics", "bachelor", "B1.05", Some(physics))
            .await
            .unwrap()
            .id;
        let in_physics = open(&store, &campus.expert, mechanics).await;
        let in_mathematics = open(&store, &campus.expert, campus.inside_program).await;

        store
            .add_unit_member(campus.outsider.id, physics, UnitStatus::Deputy)
            .await
            .unwrap();
        store
            .add_unit_member(campus.outsider.id, campus.unit_id, UnitStatus::Employee)
            .await
            .unwrap();

        let scope = ExpertiseScope::resolve(&store, &campus.outsider).await.unwrap();
        let listed = store
            .list_expertises(&scope, &ExpertiseQuery::default())
            .await
            .unwrap();
        assert_eq!(ids(&listed), vec![in_physics.id]);
        assert!(!ids(&listed).contains(&in_mathematics.id));
    }

    #[tokio::test]
    async fn test_employee_of_unit_is_not_leadership() {
        let store = setup_test_db().await;
        let campus = seed_campus(&store).await;
        open(&store, &campus.expert, campus.inside_program).await;

        store
            .add_unit_member(campus.outsider.id, campus.unit_id, UnitStatus::Employee)
            .await
            .unwrap();
        let scope = ExpertiseScope::resolve(&store, &campus.outsider).await.unwrap();
        let listed = store
            .list_expertises(&scope, &ExpertiseQuery::default())
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_plain_expert_sees_exactly_assigned() {
        let store = setup_test_db().await;
        let campus = seed_campus(&store).await;
        let inside = open(&store, &campus.expert, campus.inside_program).await;
        let outside = open(&store, &campus.leader, campus.outside_program).await;
        assign(&store, outside.id, campus.outsider.id).await;

        let scope = ExpertiseScope::resolve(&store, &campus.outsider).await.unwrap();
        let listed = store
            .list_expertises(&scope, &ExpertiseQuery::default())
            .await
            .unwrap();
        assert_eq!(ids(&listed), vec![outside.id]);

        let scope = ExpertiseScope::resolve(&store, &campus.expert).await.unwrap();
        let listed = store
            .list_expertises(&scope, &ExpertiseQuery::default())
            .await
            .unwrap();
        assert_eq!(ids(&listed), vec![inside.id]);
    }

    #[tokio::test]
    async fn test_filters_and_search() {
        let store = setup_test_db().await;
        let campus = seed_campus(&store).await;
        let inside = open(&store, &campus.expert, campus.inside_program).await;
        let outside = open(&store, &campus.expert, campus.outside_program).await;
        store
            .add_work_program_editor(campus.outside_program, campus.outsider.id)
            .await
            .unwrap();
        store
            .update_expertise(
                outside.id,
                UpdateExpertiseRequest {
                    expertise_status: Some(ExpertiseStatus::Rework),
                },
            )
            .await
            .unwrap();

        let all = ExpertiseScope::All;

        let by_status = ExpertiseQuery {
            expertise_status: Some(ExpertiseStatus::Rework),
            ..Default::default()
        };
        assert_eq!(
            ids(&store.list_expertises(&all, &by_status).await.unwrap()),
            vec![outside.id]
        );

        let by_title = ExpertiseQuery {
            work_program_title: Some("Linear Algebra".to_string()),
            ..Default::default()
        };
        assert_eq!(
            ids(&store.list_expertises(&all, &by_title).await.unwrap()),
            vec![inside.id]
        );

        let by_editor = ExpertiseQuery {
            editor_last_name: Some("Sidorova".to_string()),
            ..Default::default()
        };
        assert_eq!(
            ids(&store.list_expertises(&all, &by_editor).await.unwrap()),
            vec![outside.id]
        );

        // Both expertises have Petrov as leader; only one matches "algebra"
        let search = ExpertiseQuery {
            search: Some("petrov ALGEBRA".to_string()),
            ..Default::default()
        };
        assert_eq!(
            ids(&store.list_expertises(&all, &search).await.unwrap()),
            vec![inside.id]
        );

        let ordered = ExpertiseQuery {
            ordering: Some("-work_program_title".to_string()),
            ..Default::default()
        };
        assert_eq!(
            ids(&store.list_expertises(&all, &ordered).await.unwrap()),
            vec![outside.id, inside.id]
        );
    }

    #[tokio::test]
    async fn test_expertise_detail_lists_participants() {
        let store = setup_test_db().await;
        let campus = seed_campus(&store).await;
        let expertise = open(&store, &campus.leader, campus.inside_program).await;
        assign(&store, expertise.id, campus.expert.id).await;

        let detail = store.expertise_detail(expertise).await.unwrap();
        let experts: Vec<_> = detail.experts.iter().map(|ue| ue.expert.id).collect();
        assert_eq!(experts, vec![campus.leader.id, campus.expert.id]);
    }
}
