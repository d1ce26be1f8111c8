//! Local-checkout implementation of the history boundary using `git2`.
//!
//! Useful for running without an API token: tags and commits are read from
//! the working repository and tags are created locally (pushing them is
//! left to the surrounding workflow).

use git2::{ErrorCode, Oid, Repository};
use std::path::Path;

use crate::error::{RelverError, Result};
use crate::history::{
    sort_tags_by_version, CommitInfo, HistoryClient, ReleaseInfo, TagInfo, TagQuery,
};

/// Hard cap on the commit walk; the bounded-fetch analog of API page caps
const MAX_WALK_COMMITS: usize = 1000;

/// Wrapper around git2::Repository with our boundary interface
pub struct LocalGitHistory {
    repo: Repository,
}

impl LocalGitHistory {
    /// Open or discover a git repository
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::discover(path)?;

        Ok(LocalGitHistory { repo })
    }

    /// Create from an existing git2::Repository
    pub fn from_git2(repo: Repository) -> Self {
        LocalGitHistory { repo }
    }

    fn tag_commit_sha(&self, tag_name: &str) -> Result<String> {
        let reference_name = format!("refs/tags/{}", tag_name);
        let reference = self.repo.find_reference(&reference_name)?;

        // peel through annotated tag objects down to the commit
        let commit = reference
            .peel_to_commit()
            .map_err(|e| RelverError::api(format!("Cannot peel tag '{}': {}", tag_name, e)))?;

        Ok(commit.id().to_string())
    }
}

impl HistoryClient for LocalGitHistory {
    fn list_tags(&self, query: &TagQuery) -> Result<Vec<TagInfo>> {
        let names = self.repo.tag_names(None)?;
        let mut tags = Vec::new();

        for name in names.iter().flatten() {
            if !name.contains(query.contains) {
                continue;
            }
            tags.push(TagInfo {
                name: name.to_string(),
                commit_sha: self.tag_commit_sha(name)?,
            });
        }

        // the full tag list is already local; early-stop has nothing to save
        sort_tags_by_version(&mut tags, query.contains);
        Ok(tags)
    }

    fn list_commits(&self, from_sha: &str, stop_at_sha: Option<&str>) -> Result<Vec<CommitInfo>> {
        let from_oid = Oid::from_str(from_sha)
            .map_err(|e| RelverError::api(format!("Invalid commit sha '{}': {}", from_sha, e)))?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(from_oid)?;

        let mut commits = Vec::new();

        for oid_result in revwalk {
            let oid = oid_result?;
            let commit = self.repo.find_commit(oid)?;
            let sha = oid.to_string();
            let reached_stop = stop_at_sha == Some(sha.as_str());

            commits.push(CommitInfo {
                sha,
                message: commit.message().unwrap_or("").to_string(),
            });

            if reached_stop || commits.len() >= MAX_WALK_COMMITS {
                break;
            }
        }

        Ok(commits)
    }

    fn create_tag(&self, name: &str, message: &str, target_sha: &str) -> Result<()> {
        let oid = Oid::from_str(target_sha)
            .map_err(|e| RelverError::api(format!("Invalid commit sha '{}': {}", target_sha, e)))?;
        let object = self.repo.find_object(oid, None)?;
        let signature = self.repo.signature()?;

        match self.repo.tag(name, &object, &signature, message, false) {
            Ok(_) => Ok(()),
            Err(e) if e.code() == ErrorCode::Exists => {
                Err(RelverError::TagAlreadyExists(name.to_string()))
            }
            Err(e) => Err(RelverError::api(format!(
                "Creating tag '{}' failed: {}",
                name, e
            ))),
        }
    }

    fn list_releases(&self) -> Result<Vec<ReleaseInfo>> {
        // a bare checkout has no release registry
        Ok(Vec::new())
    }
}
