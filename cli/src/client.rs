//! HTTP client for the expertise server

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::messages::{Comment, Expertise, ExpertiseDetail, UserExpertise};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid server URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Filters for `GET /api/expertise`
#[derive(Debug, Default)]
pub struct ListFilter {
    pub search: Option<String>,
    pub status: Option<String>,
    pub ordering: Option<String>,
}

/// Token-authenticated client
pub struct ExpertiseClient {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl ExpertiseClient {
    pub fn new(server: &str, token: impl Into<String>) -> Result<Self> {
        let mut base = Url::parse(server)?;
        // Keep a trailing slash so joins append instead of replacing
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base,
            token: token.into(),
        })
    }

    pub fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    pub async fn list_expertises(&self, filter: &ListFilter) -> Result<Vec<Expertise>> {
        let mut url = self.url("api/expertise")?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(search) = &filter.search {
                query.append_pair("search", search);
            }
            if let Some(status) = &filter.status {
                query.append_pair("expertise_status", status);
            }
            if let Some(ordering) = &filter.ordering {
                query.append_pair("ordering", ordering);
            }
        }
        // An empty query still leaves a dangling '?'
        if url.query() == Some("") {
            url.set_query(None);
        }
        self.get(url).await
    }

    pub async fn get_expertise(&self, id: i64) -> Result<ExpertiseDetail> {
        self.get(self.url(&format!("api/expertise/{}", id))?).await
    }

    pub async fn expertise_for_work_program(&self, work_program_id: i64) -> Result<ExpertiseDetail> {
        self.get(self.url(&format!("api/expertise/work_program/{}", work_program_id))?)
            .await
    }

    pub async fn comments(&self, expertise_id: i64, block: Option<&str>) -> Result<Vec<Comment>> {
        let mut url = self.url(&format!("api/expertise/comments/{}", expertise_id))?;
        if let Some(block) = block {
            url.query_pairs_mut().append_pair("block", block);
        }
        self.get(url).await
    }

    pub async fn assignments(&self, expertise_id: Option<i64>) -> Result<Vec<UserExpertise>> {
        let path = match expertise_id {
            Some(id) => format!("api/expertise/user/{}", id),
            None => "api/expertise/user".to_string(),
        };
        self.get(self.url(&path)?).await
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .header("Authorization", format!("Token {}", self.token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}
