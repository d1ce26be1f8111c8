//! History-store abstraction layer
//!
//! This module provides a trait-based abstraction over the repository's
//! tag/commit history, allowing for multiple implementations including the
//! GitHub REST API, a local git checkout, and a mock for testing.
//!
//! # Overview
//!
//! The primary abstraction is the [HistoryClient] trait, which defines the
//! operations release resolution needs. The concrete implementations are:
//!
//! - [github::GithubHistoryClient]: the GitHub REST API (paginated)
//! - [local::LocalGitHistory]: a local checkout via the `git2` crate
//! - [mock::MockHistoryClient]: a scripted implementation for testing
//!
//! # Usage
//!
//! Most code should depend on the [HistoryClient] trait rather than
//! concrete implementations to enable easy testing and flexibility.

pub mod github;
pub mod local;
pub mod mock;

pub use github::GithubHistoryClient;
pub use local::LocalGitHistory;
pub use mock::MockHistoryClient;

use crate::domain::ReleaseTagVersion;
use crate::error::Result;

/// Tag information as read from history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    /// The tag name, prefix included
    pub name: String,
    /// Sha of the commit the tag points at
    pub commit_sha: String,
}

/// Commit information as read from history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// The full commit sha
    pub sha: String,
    /// The commit message
    pub message: String,
}

/// Published release information, used only for container-tag derivation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub tag_name: String,
    pub prerelease: bool,
}

/// Filter for tag listing
#[derive(Debug, Clone, Default)]
pub struct TagQuery<'a> {
    /// Keep only tag names containing this substring (empty keeps all)
    pub contains: &'a str,
    /// Permit ending pagination at the first page that yields a match.
    /// Trades completeness of the fetch for latency; callers re-validate
    /// by scanning everything that was fetched.
    pub stop_on_first_match: bool,
}

/// Read/write access to the repository's tag and commit history.
///
/// ## Ordering
///
/// [list_tags](HistoryClient::list_tags) returns tags ascending by parsed
/// version when comparable so the most advanced valid version sorts last;
/// unparseable names come first in fetch order.
/// [list_commits](HistoryClient::list_commits) returns commits in
/// descending recency order starting at `from_sha`.
///
/// ## Bounds
///
/// Both listing operations are bounded: implementations stop at an
/// explicit page or commit cap even when no stop condition is hit, so a
/// pathological repository can never page indefinitely.
///
/// ## Error handling
///
/// All methods return [crate::error::Result]. A duplicate tag name on
/// creation is reported as [crate::error::RelverError::TagAlreadyExists]
/// so callers can treat the lost race as success; any other failure is a
/// transport error carrying the operation and identifiers involved.
pub trait HistoryClient {
    /// List tags matching the query, ordered as described above.
    fn list_tags(&self, query: &TagQuery) -> Result<Vec<TagInfo>>;

    /// List commits reachable from `from_sha`, most recent first.
    ///
    /// Stops after including the commit named by `stop_at_sha` (when given
    /// and encountered), at pagination exhaustion, or at the
    /// implementation's cap, whichever comes first.
    fn list_commits(&self, from_sha: &str, stop_at_sha: Option<&str>) -> Result<Vec<CommitInfo>>;

    /// Create an annotated tag plus its ref at `target_sha`.
    fn create_tag(&self, name: &str, message: &str, target_sha: &str) -> Result<()>;

    /// List published releases, most recent first. Implementations without
    /// a release registry report none.
    fn list_releases(&self) -> Result<Vec<ReleaseInfo>>;
}

/// Sort tags ascending by version parsed after `prefix` removal.
///
/// Unparseable names keep their fetch order and come first, so the most
/// advanced valid version always sorts last. The sort is stable.
pub fn sort_tags_by_version(tags: &mut [TagInfo], prefix: &str) {
    tags.sort_by_key(|tag| match ReleaseTagVersion::from_tag_name(&tag.name, prefix) {
        Some(ver) => (1, ver),
        None => (0, ReleaseTagVersion::new(0, 0, 0)),
    });
}
