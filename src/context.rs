/// Facts about the current CI invocation.
///
/// Everything here arrives from the environment (or flags) at startup;
/// nothing in the crate mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Full commit sha the build runs against
    pub sha: String,
    /// Ref string, e.g. `refs/heads/main`, `refs/pull/37/merge`, `refs/tags/v1.2.3`
    pub git_ref: String,
    /// Monotonic run number assigned by the CI system
    pub run_number: u64,
    /// Event kind, e.g. `push`, `pull_request`, `schedule`
    pub event_name: String,
}

impl BuildContext {
    /// First 8 hex characters of the commit sha (the whole sha if shorter)
    pub fn short_sha(&self) -> &str {
        let end = self.sha.len().min(8);
        &self.sha[..end]
    }

    /// Final path segment of the ref: branch name, PR merge label, or tag name
    pub fn ref_end(&self) -> &str {
        self.git_ref.rsplit('/').next().unwrap_or("")
    }

    /// Whether the ref points at a tag
    pub fn is_tag_ref(&self) -> bool {
        self.git_ref.starts_with("refs/tags")
    }
}
