// GitHub REST client
// Fetches one bounded page of a user's public repositories

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Upper bound requested from the API. Only a single page is ever fetched.
pub const PER_PAGE: u32 = 200;

/// Public repository as returned by `GET /users/{account}/repos`.
/// Only the fields the page displays are kept; everything else is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Repository {
    pub name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GitHub API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GitHub API error: {0}")]
    Status(StatusCode),

    #[error("GitHub API returned malformed repository list: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Success-with-data or failure-with-reason for a single fetch.
pub type FetchOutcome = Result<Vec<Repository>, FetchError>;

/// Parse a repository list body. Anything other than an array of
/// repository objects is malformed.
pub fn parse_repos(body: &str) -> FetchOutcome {
    Ok(serde_json::from_str(body)?)
}

pub struct GitHubClient {
    api_base: String,
    client: reqwest::Client,
}

impl GitHubClient {
    /// Unauthenticated client against `api_base` (no trailing slash needed).
    pub fn new(api_base: &str) -> Result<Self, FetchError> {
        // The API rejects requests without a User-Agent
        let client = reqwest::Client::builder()
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn repos_url(&self, account: &str) -> String {
        format!(
            "{}/users/{}/repos?per_page={}",
            self.api_base, account, PER_PAGE
        )
    }

    /// Fetch up to `PER_PAGE` repositories for `account`. No retry.
    pub async fn fetch_repos(&self, account: &str) -> FetchOutcome {
        let url = self.repos_url(account);
        log::info!("fetching repositories from {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        let repos = parse_repos(&body)?;

        log::info!("fetched {} repositories for {}", repos.len(), account);
        Ok(repos)
    }
}
