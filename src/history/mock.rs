use std::cell::RefCell;

use crate::error::{RelverError, Result};
use crate::history::{
    sort_tags_by_version, CommitInfo, HistoryClient, ReleaseInfo, TagInfo, TagQuery,
};

/// What the mock does when asked to create a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreateBehavior {
    #[default]
    Succeed,
    /// Simulate a concurrent invocation having created the tag first
    AlreadyExists,
    /// Simulate an unrecoverable API failure
    Fail,
}

/// A tag creation recorded by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTag {
    pub name: String,
    pub message: String,
    pub target_sha: String,
}

/// Mock history client for testing without network or a real repository
#[derive(Default)]
pub struct MockHistoryClient {
    tags: Vec<TagInfo>,
    commits: Vec<CommitInfo>,
    releases: Vec<ReleaseInfo>,
    create_behavior: CreateBehavior,
    created: RefCell<Vec<CreatedTag>>,
}

impl MockHistoryClient {
    /// Create a new empty mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag pointing at a commit sha
    pub fn add_tag(&mut self, name: impl Into<String>, commit_sha: impl Into<String>) {
        self.tags.push(TagInfo {
            name: name.into(),
            commit_sha: commit_sha.into(),
        });
    }

    /// Append a commit; call in descending recency order (head first)
    pub fn add_commit(&mut self, sha: impl Into<String>, message: impl Into<String>) {
        self.commits.push(CommitInfo {
            sha: sha.into(),
            message: message.into(),
        });
    }

    /// Add a published release
    pub fn add_release(&mut self, tag_name: impl Into<String>, prerelease: bool) {
        self.releases.push(ReleaseInfo {
            tag_name: tag_name.into(),
            prerelease,
        });
    }

    /// Configure the outcome of create_tag calls
    pub fn set_create_behavior(&mut self, behavior: CreateBehavior) {
        self.create_behavior = behavior;
    }

    /// Tag creations recorded so far
    pub fn created_tags(&self) -> Vec<CreatedTag> {
        self.created.borrow().clone()
    }
}

impl HistoryClient for MockHistoryClient {
    fn list_tags(&self, query: &TagQuery) -> Result<Vec<TagInfo>> {
        let mut tags: Vec<TagInfo> = self
            .tags
            .iter()
            .filter(|t| t.name.contains(query.contains))
            .cloned()
            .collect();
        sort_tags_by_version(&mut tags, query.contains);
        Ok(tags)
    }

    fn list_commits(&self, from_sha: &str, stop_at_sha: Option<&str>) -> Result<Vec<CommitInfo>> {
        let start = self
            .commits
            .iter()
            .position(|c| c.sha == from_sha)
            .unwrap_or(0);

        let mut commits = Vec::new();
        for commit in &self.commits[start..] {
            let reached_stop = stop_at_sha == Some(commit.sha.as_str());
            commits.push(commit.clone());
            if reached_stop {
                break;
            }
        }
        Ok(commits)
    }

    fn create_tag(&self, name: &str, message: &str, target_sha: &str) -> Result<()> {
        match self.create_behavior {
            CreateBehavior::Succeed => {
                self.created.borrow_mut().push(CreatedTag {
                    name: name.to_string(),
                    message: message.to_string(),
                    target_sha: target_sha.to_string(),
                });
                Ok(())
            }
            CreateBehavior::AlreadyExists => Err(RelverError::TagAlreadyExists(name.to_string())),
            CreateBehavior::Fail => Err(RelverError::api(format!(
                "Creating tag '{}' failed: simulated outage",
                name
            ))),
        }
    }

    fn list_releases(&self) -> Result<Vec<ReleaseInfo>> {
        Ok(self.releases.clone())
    }
}
