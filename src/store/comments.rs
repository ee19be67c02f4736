use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

use super::{parse_column, Store};
use crate::error::{AppError, Result};
use crate::models::{CreateCommentRequest, ExpertiseComment, User, MAX_COMMENT_LEN};

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.user_expertise_id, c.comment_block, c.comment_text, c.comment_date,
           u.id AS author_id, u.username, u.first_name, u.last_name
    FROM expertise_comments c
    JOIN user_expertises ue ON ue.id = c.user_expertise_id
    JOIN users u ON u.id = ue.expert_id
"#;

impl Store {
    /// Comments of one expertise, optionally limited to a single block.
    ///
    /// Without an expertise every comment is returned and `block` is ignored.
    pub async fn list_comments(
        &self,
        expertise_id: Option<i64>,
        block: Option<&str>,
    ) -> Result<Vec<ExpertiseComment>> {
        let mut builder = QueryBuilder::<Sqlite>::new(COMMENT_SELECT);
        if let Some(expertise_id) = expertise_id {
            builder
                .push(" WHERE ue.expertise_id = ")
                .push_bind(expertise_id);
            if let Some(block) = block {
                builder
                    .push(" AND c.comment_block = ")
                    .push_bind(block.to_string());
            }
        }
        builder.push(" ORDER BY c.comment_date ASC, c.id ASC");

        let rows = builder
            .build_query_as::<CommentRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    pub async fn get_comment(&self, id: i64) -> Result<ExpertiseComment> {
        let row = sqlx::query_as::<_, CommentRow>(&format!("{} WHERE c.id = ?", COMMENT_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", id)))?;

        row.try_into()
    }

    pub async fn create_comment(&self, request: CreateCommentRequest) -> Result<ExpertiseComment> {
        if request.comment_text.trim().is_empty() {
            return Err(AppError::BadRequest("comment_text may not be blank".to_string()));
        }
        if request.comment_text.chars().count() > MAX_COMMENT_LEN {
            return Err(AppError::BadRequest(format!(
                "comment_text is longer than {} characters",
                MAX_COMMENT_LEN
            )));
        }

        let user_expertise = match self.get_user_expertise(request.user_expertise).await {
            Ok(ue) => ue,
            Err(AppError::NotFound(msg)) => return Err(AppError::BadRequest(msg)),
            Err(e) => return Err(e),
        };

        let id = sqlx::query(
            r#"
            INSERT INTO expertise_comments (user_expertise_id, comment_block, comment_text, comment_date)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user_expertise.id)
        .bind(request.comment_block.as_str())
        .bind(&request.comment_text)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        tracing::info!(
            comment_id = id,
            user_expertise_id = user_expertise.id,
            block = request.comment_block.as_str(),
            "Created comment"
        );

        self.get_comment(id).await
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    user_expertise_id: i64,
    comment_block: String,
    comment_text: String,
    comment_date: chrono::DateTime<Utc>,
    author_id: i64,
    username: String,
    first_name: String,
    last_name: String,
}

impl TryFrom<CommentRow> for ExpertiseComment {
    type Error = AppError;

    fn try_from(row: CommentRow) -> Result<Self> {
        Ok(ExpertiseComment {
            id: row.id,
            user_expertise_id: row.user_expertise_id,
            author: User {
                id: row.author_id,
                username: row.username,
                first_name: row.first_name,
                last_name: row.last_name,
            },
            comment_block: parse_column(&row.comment_block, "comment block")?,
            comment_text: row.comment_text,
            comment_date: row.comment_date,
        })
    }
}
