use super::{parse_column, reject_duplicate, Store};
use crate::error::{AppError, Result};
use crate::models::{
    CreateUserExpertiseRequest, UpdateUserExpertiseRequest, User, UserExpertise,
};

const USER_EXPERTISE_SELECT: &str = r#"
    SELECT ue.id, ue.expertise_id, ue.stuff_status, ue.user_expertise_status, ue.expert_result,
           u.id AS expert_id, u.username, u.first_name, u.last_name
    FROM user_expertises ue
    JOIN users u ON u.id = ue.expert_id
"#;

impl Store {
    /// Assignments held by `expert_id`, optionally within one expertise
    pub async fn list_user_expertises(
        &self,
        expert_id: i64,
        expertise_id: Option<i64>,
    ) -> Result<Vec<UserExpertise>> {
        let rows = sqlx::query_as::<_, UserExpertiseRow>(&format!(
            "{} WHERE ue.expert_id = ? AND (? IS NULL OR ue.expertise_id = ?) ORDER BY ue.id ASC",
            USER_EXPERTISE_SELECT
        ))
        .bind(expert_id)
        .bind(expertise_id)
        .bind(expertise_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Everyone taking part in an expertise
    pub async fn list_participants(&self, expertise_id: i64) -> Result<Vec<UserExpertise>> {
        let rows = sqlx::query_as::<_, UserExpertiseRow>(&format!(
            "{} WHERE ue.expertise_id = ? ORDER BY ue.id ASC",
            USER_EXPERTISE_SELECT
        ))
        .bind(expertise_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    pub async fn get_user_expertise(&self, id: i64) -> Result<UserExpertise> {
        let row = sqlx::query_as::<_, UserExpertiseRow>(&format!(
            "{} WHERE ue.id = ?",
            USER_EXPERTISE_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User expertise {} not found", id)))?;

        row.try_into()
    }

    pub async fn is_expert_of(&self, user_id: i64, expertise_id: i64) -> Result<bool> {
        let found =
            sqlx::query("SELECT 1 FROM user_expertises WHERE expert_id = ? AND expertise_id = ?")
                .bind(user_id)
                .bind(expertise_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    pub async fn has_any_assignment(&self, user_id: i64) -> Result<bool> {
        let found = sqlx::query("SELECT 1 FROM user_expertises WHERE expert_id = ? LIMIT 1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    pub async fn create_user_expertise(
        &self,
        request: CreateUserExpertiseRequest,
    ) -> Result<UserExpertise> {
        let expertise_exists = sqlx::query("SELECT 1 FROM expertises WHERE id = ?")
            .bind(request.expertise)
            .fetch_optional(&self.pool)
            .await?
            .is_some();
        if !expertise_exists {
            return Err(AppError::BadRequest(format!(
                "Expertise {} does not exist",
                request.expertise
            )));
        }
        if !self.user_exists(request.expert).await? {
            return Err(AppError::BadRequest(format!(
                "User {} does not exist",
                request.expert
            )));
        }
        if self.is_expert_of(request.expert, request.expertise).await? {
            return Err(AppError::BadRequest(format!(
                "User {} is already assigned to expertise {}",
                request.expert, request.expertise
            )));
        }

        let stuff_status = request.stuff_status.unwrap_or_default();
        let id = sqlx::query(
            r#"
            INSERT INTO user_expertises (expertise_id, expert_id, stuff_status)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(request.expertise)
        .bind(request.expert)
        .bind(stuff_status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            reject_duplicate(e, || {
                format!(
                    "User {} is already assigned to expertise {}",
                    request.expert, request.expertise
                )
            })
        })?
        .last_insert_rowid();

        tracing::info!(
            user_expertise_id = id,
            expertise_id = request.expertise,
            expert_id = request.expert,
            "Assigned expert"
        );

        self.get_user_expertise(id).await
    }

    pub async fn update_user_expertise(
        &self,
        id: i64,
        changes: UpdateUserExpertiseRequest,
    ) -> Result<UserExpertise> {
        let current = self.get_user_expertise(id).await?;
        let status = changes
            .user_expertise_status
            .or(current.user_expertise_status);
        let result = changes.expert_result.or(current.expert_result);

        sqlx::query(
            r#"
            UPDATE user_expertises SET user_expertise_status = ?, expert_result = ? WHERE id = ?
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .bind(result.as_deref())
        .bind(id)
        .execute(&self.pool)
        .await?;

        tracing::info!(user_expertise_id = id, "Updated user expertise");

        Ok(UserExpertise {
            user_expertise_status: status,
            expert_result: result,
            ..current
        })
    }

    pub async fn delete_user_expertise(&self, id: i64) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM user_expertises WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::NotFound(format!("User expertise {} not found", id)));
        }

        tracing::info!(user_expertise_id = id, "Deleted user expertise");
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct UserExpertiseRow {
    id: i64,
    expertise_id: i64,
    stuff_status: String,
    user_expertise_status: Option<String>,
    expert_result: Option<String>,
    expert_id: i64,
    username: String,
    first_name: String,
    last_name: String,
}

impl TryFrom<UserExpertiseRow> for UserExpertise {
    type Error = AppError;

    fn try_from(row: UserExpertiseRow) -> Result<Self> {
        let user_expertise_status = row
            .user_expertise_status
            .as_deref()
            .map(|s| parse_column(s, "user expertise status"))
            .transpose()?;

        Ok(UserExpertise {
            id: row.id,
            expertise_id: row.expertise_id,
            expert: User {
                id: row.expert_id,
                username: row.username,
                first_name: row.first_name,
                last_name: row.last_name,
            },
            stuff_status: parse_column(&row.stuff_status, "stuff status")?,
            user_expertise_status,
            expert_result: row.expert_result,
        })
    }
}
