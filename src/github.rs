//! GitHub REST client for release lookup and pull request comments

use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

const COMMENTS_PER_PAGE: usize = 100;

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("GitHub request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GitHub API returned HTTP {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("no releases found for {owner}/{repo}")]
    NoReleases { owner: String, repo: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub prerelease: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Serialize)]
struct NewComment<'a> {
    body: &'a str,
}

/// Explicitly constructed API client; unauthenticated when no token is given
pub struct GithubClient {
    api_url: String,
    token: Option<String>,
    http: Client,
}

impl GithubClient {
    pub fn new(api_url: &str, token: Option<String>) -> Result<Self, GithubError> {
        let http = Client::builder()
            .user_agent(concat!("spin-actions/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            http,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("Accept", "application/vnd.github+json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, GithubError> {
        debug!(%url, "GitHub API request");
        let response = self.authorized(self.http.get(url)).send()?;
        if !response.status().is_success() {
            return Err(GithubError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json()?)
    }

    /// Tag of the newest non-prerelease release
    pub fn latest_release(&self, owner: &str, repo: &str) -> Result<String, GithubError> {
        let url = format!("{}/repos/{}/{}/releases", self.api_url, owner, repo);
        let releases: Vec<Release> = self.get_json(&url)?;

        select_latest(&releases)
            .map(str::to_string)
            .ok_or_else(|| GithubError::NoReleases {
                owner: owner.to_string(),
                repo: repo.to_string(),
            })
    }

    /// Whether the pull request already carries a comment with exactly `body`
    pub fn find_comment(
        &self,
        owner: &str,
        repo: &str,
        pr: u64,
        body: &str,
    ) -> Result<bool, GithubError> {
        let mut page = 1;
        loop {
            let url = format!(
                "{}/repos/{}/{}/issues/{}/comments?per_page={}&page={}",
                self.api_url, owner, repo, pr, COMMENTS_PER_PAGE, page
            );
            let comments: Vec<IssueComment> = self.get_json(&url)?;

            if comments.iter().any(|c| c.body.as_deref() == Some(body)) {
                return Ok(true);
            }
            if comments.len() < COMMENTS_PER_PAGE {
                return Ok(false);
            }
            page += 1;
        }
    }

    /// Posts `body` on the pull request unless an identical comment exists
    pub fn update_comment(
        &self,
        owner: &str,
        repo: &str,
        pr: u64,
        body: &str,
    ) -> Result<(), GithubError> {
        if self.find_comment(owner, repo, pr, body)? {
            debug!(pr, "Comment already present");
            return Ok(());
        }

        let url = format!("{}/repos/{}/{}/issues/{}/comments", self.api_url, owner, repo, pr);
        let response = self
            .authorized(self.http.post(&url))
            .json(&NewComment { body })
            .send()?;

        if !response.status().is_success() {
            return Err(GithubError::UnexpectedStatus {
                status: response.status().as_u16(),
                url,
            });
        }

        info!("updated comment on PR #{}", pr);
        Ok(())
    }
}

fn select_latest(releases: &[Release]) -> Option<&str> {
    releases
        .iter()
        .find(|r| !r.prerelease)
        .map(|r| r.tag_name.as_str())
}
