//! Response types mirrored from the server

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkProgram {
    pub id: i64,
    pub title: String,
    pub qualification: String,
    pub discipline_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expertise {
    pub id: i64,
    pub work_program: WorkProgram,
    pub expertise_status: String,
    pub date_of_last_change: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpertiseDetail {
    #[serde(flatten)]
    pub expertise: Expertise,
    pub experts: Vec<UserExpertise>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserExpertise {
    pub id: i64,
    pub expertise_id: i64,
    pub expert: User,
    pub stuff_status: String,
    pub user_expertise_status: Option<String>,
    pub expert_result: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub user_expertise_id: i64,
    pub author: User,
    pub comment_block: String,
    pub comment_text: String,
    pub comment_date: DateTime<Utc>,
}
