//! GitHub REST implementation of the history boundary.
//!
//! Every call is a sequential blocking round trip; the client applies no
//! retry/backoff of its own. Pagination is bounded by explicit page caps
//! in addition to the usual stop conditions.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{RelverError, Result};
use crate::history::{
    sort_tags_by_version, CommitInfo, HistoryClient, ReleaseInfo, TagInfo, TagQuery,
};

const PER_PAGE: usize = 100;
const MAX_TAG_PAGES: usize = 10;
const MAX_COMMIT_PAGES: usize = 10;

const USER_AGENT: &str = concat!("relver/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct TagPayload {
    name: String,
    commit: CommitRef,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitPayload {
    sha: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ReleasePayload {
    tag_name: String,
    prerelease: bool,
}

#[derive(Debug, Serialize)]
struct CreateTagBody<'a> {
    tag: &'a str,
    message: &'a str,
    object: &'a str,
    r#type: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateRefBody<'a> {
    r#ref: String,
    sha: &'a str,
}

/// History client backed by the GitHub REST API
pub struct GithubHistoryClient {
    http: Client,
    api_url: String,
    owner: String,
    repo: String,
    token: String,
}

impl GithubHistoryClient {
    /// Create a client for `owner/repo` against the given API base URL
    /// (usually `https://api.github.com`).
    pub fn new(api_url: &str, repository: &str, token: &str) -> Result<Self> {
        let (owner, repo) = repository.split_once('/').ok_or_else(|| {
            RelverError::config(format!(
                "Repository '{}' is not in 'owner/name' form",
                repository
            ))
        })?;
        if owner.is_empty() || repo.is_empty() {
            return Err(RelverError::config(format!(
                "Repository '{}' is not in 'owner/name' form",
                repository
            )));
        }

        let http = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(GithubHistoryClient {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token: token.to_string(),
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_url, self.owner, self.repo, path
        )
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RelverError::api(format!(
                "{} for {}/{} returned {}: {}",
                what, self.owner, self.repo, status, body
            )));
        }

        Ok(response.json()?)
    }

    fn post_json<B: Serialize>(&self, url: &str, body: &B, what: &str) -> Result<()> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(body)
            .send()?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response.text().unwrap_or_default();
        if status == StatusCode::UNPROCESSABLE_ENTITY && text.contains("already exists") {
            // Surfaced as its own variant so callers can treat the lost
            // race with a concurrent invocation as success-equivalent.
            return Err(RelverError::TagAlreadyExists(what.to_string()));
        }

        Err(RelverError::api(format!(
            "{} for {}/{} returned {}: {}",
            what, self.owner, self.repo, status, text
        )))
    }
}

impl HistoryClient for GithubHistoryClient {
    fn list_tags(&self, query: &TagQuery) -> Result<Vec<TagInfo>> {
        let mut tags = Vec::new();

        for page in 1..=MAX_TAG_PAGES {
            let url = format!(
                "{}?per_page={}&page={}",
                self.repo_url("tags"),
                PER_PAGE,
                page
            );
            let payload: Vec<TagPayload> = self.get_json(&url, "listing tags")?;
            let exhausted = payload.len() < PER_PAGE;

            tags.extend(
                payload
                    .into_iter()
                    .filter(|t| t.name.contains(query.contains))
                    .map(|t| TagInfo {
                        name: t.name,
                        commit_sha: t.commit.sha,
                    }),
            );

            if exhausted || (query.stop_on_first_match && !tags.is_empty()) {
                break;
            }
        }

        sort_tags_by_version(&mut tags, query.contains);
        Ok(tags)
    }

    fn list_commits(&self, from_sha: &str, stop_at_sha: Option<&str>) -> Result<Vec<CommitInfo>> {
        let mut commits = Vec::new();

        'pages: for page in 1..=MAX_COMMIT_PAGES {
            let url = format!(
                "{}?sha={}&per_page={}&page={}",
                self.repo_url("commits"),
                from_sha,
                PER_PAGE,
                page
            );
            let payload: Vec<CommitPayload> = self.get_json(&url, "listing commits")?;
            let exhausted = payload.len() < PER_PAGE;

            for entry in payload {
                let reached_stop = stop_at_sha == Some(entry.sha.as_str());
                commits.push(CommitInfo {
                    sha: entry.sha,
                    message: entry.commit.message,
                });
                if reached_stop {
                    break 'pages;
                }
            }

            if exhausted {
                break;
            }
        }

        Ok(commits)
    }

    fn create_tag(&self, name: &str, message: &str, target_sha: &str) -> Result<()> {
        // Annotated tag object first, then the ref pointing at the commit.
        let tag_body = CreateTagBody {
            tag: name,
            message,
            object: target_sha,
            r#type: "commit",
        };
        self.post_json(&self.repo_url("git/tags"), &tag_body, name)?;

        let ref_body = CreateRefBody {
            r#ref: format!("refs/tags/{}", name),
            sha: target_sha,
        };
        self.post_json(&self.repo_url("git/refs"), &ref_body, name)
    }

    fn list_releases(&self) -> Result<Vec<ReleaseInfo>> {
        let url = format!("{}?per_page={}", self.repo_url("releases"), PER_PAGE);
        let payload: Vec<ReleasePayload> = self.get_json(&url, "listing releases")?;

        Ok(payload
            .into_iter()
            .map(|r| ReleaseInfo {
                tag_name: r.tag_name,
                prerelease: r.prerelease,
            })
            .collect())
    }
}
