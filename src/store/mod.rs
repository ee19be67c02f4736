//! Database store for expertises, assignments and comments
//!
//! Each resource keeps its queries in its own submodule; all of them extend
//! the same [`Store`] handle.

mod assignments;
mod comments;
mod directory;
mod expertise;

use sqlx::SqlitePool;

use crate::error::{AppError, Result};
use crate::models::User;

/// Database store
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// Row types shared by the submodules

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    id: i64,
    username: String,
    first_name: String,
    last_name: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}

fn parse_column<T>(value: &str, column: &str) -> Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|e| AppError::Internal(format!("Invalid {}: {}", column, e)))
}

/// Report a UNIQUE constraint failure as a validation error
fn reject_duplicate(err: sqlx::Error, message: impl FnOnce() -> String) -> AppError {
    match err {
        sqlx::Error::Database(e) if e.is_unique_violation() => AppError::BadRequest(message()),
        other => AppError::Database(other),
    }
}
