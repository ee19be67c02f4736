//! Data models for expertises, assignments and review comments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Group whose members see and manage every expertise
pub const EXPERTISE_MASTER_GROUP: &str = "expertise_master";

/// Group of work program developers allowed to request an expertise
pub const RPD_DEVELOPER_GROUP: &str = "rpd_developer";

/// Maximum length of a review comment
pub const MAX_COMMENT_LEN: usize = 50_000;

/// An authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// The work program fields embedded in expertise responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkProgramSummary {
    pub id: i64,
    pub title: String,
    pub qualification: String,
    pub discipline_code: String,
}

/// A review process for one work program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expertise {
    pub id: i64,
    pub work_program: WorkProgramSummary,
    pub expertise_status: ExpertiseStatus,
    pub date_of_last_change: DateTime<Utc>,
}

/// An expertise together with its participants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpertiseDetail {
    #[serde(flatten)]
    pub expertise: Expertise,
    pub experts: Vec<UserExpertise>,
}

/// One expert's participation in an expertise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserExpertise {
    pub id: i64,
    pub expertise_id: i64,
    pub expert: User,
    pub stuff_status: StuffStatus,
    pub user_expertise_status: Option<UserExpertiseStatus>,
    pub expert_result: Option<String>,
}

/// A review comment left within one participation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpertiseComment {
    pub id: i64,
    pub user_expertise_id: i64,
    pub author: User,
    pub comment_block: CommentBlock,
    pub comment_text: String,
    pub comment_date: DateTime<Utc>,
}

/// Review state of an expertise
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpertiseStatus {
    #[default]
    OnExpertise,
    Rework,
    Accepted,
}

impl ExpertiseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpertiseStatus::OnExpertise => "on_expertise",
            ExpertiseStatus::Rework => "rework",
            ExpertiseStatus::Accepted => "accepted",
        }
    }
}

impl std::str::FromStr for ExpertiseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on_expertise" => Ok(ExpertiseStatus::OnExpertise),
            "rework" => Ok(ExpertiseStatus::Rework),
            "accepted" => Ok(ExpertiseStatus::Accepted),
            _ => Err(format!("Invalid expertise status: {}", s)),
        }
    }
}

/// Role of a participant inside an expertise
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StuffStatus {
    Leader,
    #[default]
    Expert,
}

impl StuffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StuffStatus::Leader => "leader",
            StuffStatus::Expert => "expert",
        }
    }
}

impl std::str::FromStr for StuffStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "leader" => Ok(StuffStatus::Leader),
            "expert" => Ok(StuffStatus::Expert),
            _ => Err(format!("Invalid stuff status: {}", s)),
        }
    }
}

/// An individual expert's verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserExpertiseStatus {
    Approved,
    Rework,
}

impl UserExpertiseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserExpertiseStatus::Approved => "approved",
            UserExpertiseStatus::Rework => "rework",
        }
    }
}

impl std::str::FromStr for UserExpertiseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(UserExpertiseStatus::Approved),
            "rework" => Ok(UserExpertiseStatus::Rework),
            _ => Err(format!("Invalid user expertise status: {}", s)),
        }
    }
}

/// Section of the review form a comment belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentBlock {
    Main,
    Prerequisites,
    Sections,
    Topics,
    Sources,
    EvaluationTools,
    Results,
}

impl CommentBlock {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentBlock::Main => "main",
            CommentBlock::Prerequisites => "prerequisites",
            CommentBlock::Sections => "sections",
            CommentBlock::Topics => "topics",
            CommentBlock::Sources => "sources",
            CommentBlock::EvaluationTools => "evaluation_tools",
            CommentBlock::Results => "results",
        }
    }
}

impl std::str::FromStr for CommentBlock {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(CommentBlock::Main),
            "prerequisites" => Ok(CommentBlock::Prerequisites),
            "sections" => Ok(CommentBlock::Sections),
            "topics" => Ok(CommentBlock::Topics),
            "sources" => Ok(CommentBlock::Sources),
            "evaluation_tools" => Ok(CommentBlock::EvaluationTools),
            "results" => Ok(CommentBlock::Results),
            _ => Err(format!("Invalid comment block: {}", s)),
        }
    }
}

/// Position of a user inside a structural unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Leader,
    Deputy,
    Employee,
}

impl UnitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitStatus::Leader => "leader",
            UnitStatus::Deputy => "deputy",
            UnitStatus::Employee => "employee",
        }
    }

    /// Whether this position grants visibility over the unit's expertises
    pub fn is_leadership(&self) -> bool {
        matches!(self, UnitStatus::Leader | UnitStatus::Deputy)
    }
}

/// Request to create a new expertise
#[derive(Debug, Deserialize)]
pub struct CreateExpertiseRequest {
    pub work_program: i64,
    pub expertise_status: Option<ExpertiseStatus>,
}

/// Request to change an expertise (PATCH: any subset, PUT: all fields)
#[derive(Debug, Default, Deserialize)]
pub struct UpdateExpertiseRequest {
    pub expertise_status: Option<ExpertiseStatus>,
}

/// Request to assign an expert to an expertise
#[derive(Debug, Deserialize)]
pub struct CreateUserExpertiseRequest {
    pub expertise: i64,
    pub expert: i64,
    pub stuff_status: Option<StuffStatus>,
}

/// Request to change an expert's own review state
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserExpertiseRequest {
    pub user_expertise_status: Option<UserExpertiseStatus>,
    pub expert_result: Option<String>,
}

/// Request to leave a comment
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub user_expertise: i64,
    pub comment_block: CommentBlock,
    pub comment_text: String,
}
