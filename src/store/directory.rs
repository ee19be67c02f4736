//! Users, groups, structural units and work programs
//!
//! These records belong to the surrounding system. The service reads them to
//! authenticate requests and decide visibility. The provisioning methods
//! below exist to build fixtures in tests; no request handler writes these
//! tables.

use sqlx::Row;

use super::{Store, UserRow};
use crate::error::{AppError, Result};
use crate::models::{UnitStatus, User, WorkProgramSummary};

impl Store {
    // Lookups

    pub async fn user_by_token(&self, key: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.username, u.first_name, u.last_name
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    pub async fn user_exists(&self, user_id: i64) -> Result<bool> {
        let found = sqlx::query("SELECT 1 FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    pub async fn user_in_group(&self, user_id: i64, group: &str) -> Result<bool> {
        let found = sqlx::query("SELECT 1 FROM user_groups WHERE user_id = ? AND name = ?")
            .bind(user_id)
            .bind(group)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Whether the user leads (or deputises in) at least one structural unit
    pub async fn leads_structural_unit(&self, user_id: i64) -> Result<bool> {
        let found = sqlx::query(
            r#"
            SELECT 1 FROM user_structural_units
            WHERE user_id = ? AND status IN (?, ?)
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(UnitStatus::Leader.as_str())
        .bind(UnitStatus::Deputy.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    pub async fn is_work_program_editor(&self, user_id: i64, work_program_id: i64) -> Result<bool> {
        let found = sqlx::query(
            "SELECT 1 FROM work_program_editors WHERE user_id = ? AND work_program_id = ?",
        )
        .bind(user_id)
        .bind(work_program_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    pub async fn get_work_program(&self, id: i64) -> Result<WorkProgramSummary> {
        let row = sqlx::query(
            "SELECT id, title, qualification, discipline_code FROM work_programs WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Work program {} not found", id)))?;

        Ok(WorkProgramSummary {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            qualification: row.try_get("qualification")?,
            discipline_code: row.try_get("discipline_code")?,
        })
    }

    // Provisioning

    pub async fn create_user(
        &self,
        username: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User> {
        let id = sqlx::query("INSERT INTO users (username, first_name, last_name) VALUES (?, ?, ?)")
            .bind(username)
            .bind(first_name)
            .bind(last_name)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        Ok(User {
            id,
            username: username.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        })
    }

    /// Bind an API token to a user, replacing any previous token
    pub async fn issue_token(&self, user_id: i64, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM auth_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        sqlx::query("INSERT INTO auth_tokens (key, user_id) VALUES (?, ?)")
            .bind(key)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn add_user_to_group(&self, user_id: i64, group: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO user_groups (user_id, name) VALUES (?, ?)")
            .bind(user_id)
            .bind(group)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn create_structural_unit(&self, title: &str) -> Result<i64> {
        let id = sqlx::query("INSERT INTO structural_units (title) VALUES (?)")
            .bind(title)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        Ok(id)
    }

    pub async fn add_unit_member(
        &self,
        user_id: i64,
        structural_unit_id: i64,
        status: UnitStatus,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_structural_units (user_id, structural_unit_id, status) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(structural_unit_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn create_work_program(
        &self,
        title: &str,
        qualification: &str,
        discipline_code: &str,
        structural_unit_id: Option<i64>,
    ) -> Result<WorkProgramSummary> {
        let id = sqlx::query(
            r#"
            INSERT INTO work_programs (title, qualification, discipline_code, structural_unit_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(title)
        .bind(qualification)
        .bind(discipline_code)
        .bind(structural_unit_id)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(WorkProgramSummary {
            id,
            title: title.to_string(),
            qualification: qualification.to_string(),
            discipline_code: discipline_code.to_string(),
        })
    }

    pub async fn add_work_program_editor(&self, work_program_id: i64, user_id: i64) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO work_program_editors (work_program_id, user_id) VALUES (?, ?)",
        )
        .bind(work_program_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
