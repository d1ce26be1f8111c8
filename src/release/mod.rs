//! Release-tag resolution.
//!
//! Given the current commit, the ref, and the repository's tag/commit
//! history, determine the previous release, whether a new release should be
//! cut, the bump category derived from conventional commits, and create the
//! release tag when warranted. The git history is the only persistence
//! layer; each invocation is stateless.

use regex::Regex;

use crate::domain::commit::classify;
use crate::domain::{BumpDecision, ReleaseTagVersion};
use crate::error::{RelverError, Result};
use crate::history::{CommitInfo, HistoryClient, TagQuery};
use crate::ui;

/// Inputs to release resolution
#[derive(Debug, Clone)]
pub struct ReleaseRequest<'a> {
    /// Commit sha the build runs against
    pub sha: &'a str,
    /// Current ref string (e.g. `refs/heads/main`)
    pub git_ref: &'a str,
    /// Branch on which tagging is allowed; empty disables release creation
    pub releases_branch: &'a str,
    /// Seed version used when history holds no prior release
    pub base_version: &'a str,
    /// Bump patch even when no qualifying commits are found
    pub force_patch_if_no_changes: bool,
    /// Prefix carried by release tag names (may be empty)
    pub tag_prefix: &'a str,
}

/// Outcome of release resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    /// Set when this invocation runs on the releases branch: the tag that
    /// was created, or the previous version again when the build turned
    /// out to be a rerun with no new commits. `None` otherwise.
    pub created_tag: Option<ReleaseTagVersion>,
    /// Previous version; the latest found in history, or the seed when no
    /// valid release exists yet.
    pub previous_tag: ReleaseTagVersion,
    /// Commit sha of the previous release; `None` when no valid release
    /// tag exists in the repository.
    pub previous_tag_commit_sha: Option<String>,
}

impl ReleaseOutcome {
    /// Construct the outcome of an invocation that never consulted history
    /// (e.g. no API token). The seed version must still be valid.
    pub fn baseline(base_version: &str) -> Result<Self> {
        let previous_tag = parse_base_version(base_version)?;
        Ok(ReleaseOutcome {
            created_tag: None,
            previous_tag,
            previous_tag_commit_sha: None,
        })
    }

    /// A build with no created release tag is a pre-release build
    pub fn is_prerelease(&self) -> bool {
        self.created_tag.is_none()
    }

    /// Version string the build semantic-version resolver starts from
    pub fn base_version(&self) -> String {
        self.created_tag.unwrap_or(self.previous_tag).to_string()
    }
}

fn parse_base_version(base_version: &str) -> Result<ReleaseTagVersion> {
    ReleaseTagVersion::parse(base_version)
        .ok_or_else(|| RelverError::config(format!("Failed to parse base version '{}'", base_version)))
}

/// Walk commits head-down to (but not including) the previous release
/// commit, accumulating the bump decision and the concatenated messages
/// for the tag annotation.
///
/// The previous release must be an ancestor of the walked range; a walk
/// that runs out of commits without encountering it means the branch
/// history does not contain the claimed ancestor, which is a fatal
/// contract violation rather than something to paper over.
fn analyze_commits_since(
    commits: &[CommitInfo],
    previous_tag: &ReleaseTagVersion,
    previous_sha: &str,
    releases_branch: &str,
) -> Result<(BumpDecision, String)> {
    let mut decision = BumpDecision::None;
    let mut release_comments = String::new();

    for commit in commits {
        if commit.sha == previous_sha {
            return Ok((decision, release_comments));
        }

        if !commit.message.is_empty() {
            release_comments.push('\n');
            release_comments.push_str(&commit.message);
        }

        decision = decision.max(classify(&commit.message));
    }

    Err(RelverError::consistency(format!(
        "Failed to reach the latest release tag '{}' ({}) inside of the '{}' branch",
        previous_tag, previous_sha, releases_branch
    )))
}

/// Resolve the previous release and, when the ref matches the releases
/// branch, compute and create the next release tag.
///
/// The only tolerated failure is a duplicate tag name on creation (a
/// concurrent invocation won the race); everything else aborts the run.
pub fn resolve_release<H: HistoryClient + ?Sized>(
    history: &H,
    request: &ReleaseRequest<'_>,
) -> Result<ReleaseOutcome> {
    let mut outcome = ReleaseOutcome::baseline(request.base_version)?;

    let tags = history.list_tags(&TagQuery {
        contains: request.tag_prefix,
        stop_on_first_match: true,
    })?;
    let commits = history.list_commits(
        request.sha,
        tags.first().map(|tag| tag.commit_sha.as_str()),
    )?;

    // Find the previous release: the most advanced valid version among
    // tags whose commit is an ancestor of the current build. Tags only
    // reachable from other branches, or from commits ahead of a rerun,
    // must not win.
    for tag in &tags {
        let Some(version) = ReleaseTagVersion::from_tag_name(&tag.name, request.tag_prefix) else {
            continue;
        };

        if !commits.iter().any(|commit| commit.sha == tag.commit_sha) {
            continue;
        }

        if version.is_greater_or_equal_to(&outcome.previous_tag) {
            outcome.previous_tag = version;
            outcome.previous_tag_commit_sha = Some(tag.commit_sha.clone());
        }
    }

    // Release creation switched off entirely
    if request.releases_branch.is_empty() {
        return Ok(outcome);
    }

    // Tagging is allowed only on the designated releases branch
    let branch_pattern = format!("refs/heads/{}", request.releases_branch);
    let branch_regex = Regex::new(&branch_pattern).map_err(|e| {
        RelverError::config(format!(
            "Releases branch '{}' is not a valid pattern: {}",
            request.releases_branch, e
        ))
    })?;
    if !branch_regex.is_match(request.git_ref) {
        return Ok(outcome);
    }

    let mut next_version = outcome.previous_tag;
    let mut release_comments = String::new();

    // Without any valid prior release there is no history to justify a
    // bump: the seed version is tagged unchanged.
    if let Some(previous_sha) = outcome.previous_tag_commit_sha.as_deref() {
        let (decision, comments) = analyze_commits_since(
            &commits,
            &outcome.previous_tag,
            previous_sha,
            request.releases_branch,
        )?;
        release_comments = comments;

        next_version = match decision {
            BumpDecision::Major => next_version.increment_major(),
            BumpDecision::Minor => next_version.increment_minor(),
            BumpDecision::Patch => next_version.increment_patch(),
            BumpDecision::None if request.force_patch_if_no_changes => {
                next_version.increment_patch()
            }
            BumpDecision::None => {
                ui::display_info(
                    "Did not find any new commit since the latest release tag. Seems that release is already created.",
                );
                outcome.created_tag = Some(next_version);
                return Ok(outcome);
            }
        };
    }

    outcome.created_tag = Some(next_version);

    let next_tag_name = format!("{}{}", request.tag_prefix, next_version);
    ui::display_status(&format!("Creating a tag '{}'...", next_tag_name));

    match history.create_tag(&next_tag_name, &release_comments, request.sha) {
        Ok(()) => {
            ui::display_success(&format!("Created a tag '{}'", next_tag_name));
        }
        Err(RelverError::TagAlreadyExists(_)) => {
            // Parallel jobs race to create the same release tag; losing
            // the race means the release exists, which is what we wanted.
            ui::display_warning(&format!(
                "Tag '{}' already exists. Ignoring this error...",
                next_tag_name
            ));
        }
        Err(e) => {
            return Err(RelverError::api(format!(
                "Failed to create a tag {}: {}",
                next_tag_name, e
            )));
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::mock::{CreateBehavior, MockHistoryClient};

    const HEAD: &str = "c9";

    fn request<'a>(releases_branch: &'a str, git_ref: &'a str) -> ReleaseRequest<'a> {
        ReleaseRequest {
            sha: HEAD,
            git_ref,
            releases_branch,
            base_version: "0.1.0",
            force_patch_if_no_changes: false,
            tag_prefix: "v",
        }
    }

    /// History: c9 (head, feat) -> c8 (fix) -> c7 (tagged v1.2.3) -> c6
    fn seeded_mock() -> MockHistoryClient {
        let mut mock = MockHistoryClient::new();
        mock.add_commit(HEAD, "feat: add export");
        mock.add_commit("c8", "fix: close handle");
        mock.add_commit("c7", "chore: release plumbing");
        mock.add_commit("c6", "docs: old readme");
        mock.add_tag("v1.2.3", "c7");
        mock
    }

    #[test]
    fn test_baseline_requires_valid_seed() {
        assert!(ReleaseOutcome::baseline("1.2.3").is_ok());
        let err = ReleaseOutcome::baseline("not-a-version").unwrap_err();
        assert!(err
            .to_string()
            .contains("Failed to parse base version 'not-a-version'"));
    }

    #[test]
    fn test_invalid_base_version_is_fatal() {
        let mock = seeded_mock();
        let mut req = request("main", "refs/heads/main");
        req.base_version = "v1.2.3";
        assert!(matches!(
            resolve_release(&mock, &req),
            Err(RelverError::Config(_))
        ));
    }

    #[test]
    fn test_previous_release_found_without_tagging_off_branch() {
        let mock = seeded_mock();
        let outcome = resolve_release(&mock, &request("main", "refs/heads/feature-x")).unwrap();

        assert_eq!(outcome.created_tag, None);
        assert_eq!(outcome.previous_tag, ReleaseTagVersion::new(1, 2, 3));
        assert_eq!(outcome.previous_tag_commit_sha.as_deref(), Some("c7"));
        assert!(outcome.is_prerelease());
        assert_eq!(outcome.base_version(), "1.2.3");
        assert!(mock.created_tags().is_empty());
    }

    #[test]
    fn test_empty_releases_branch_disables_tagging() {
        let mock = seeded_mock();
        let outcome = resolve_release(&mock, &request("", "refs/heads/main")).unwrap();

        assert_eq!(outcome.created_tag, None);
        assert!(mock.created_tags().is_empty());
    }

    #[test]
    fn test_minor_bump_from_feat_commits() {
        let mock = seeded_mock();
        let outcome = resolve_release(&mock, &request("main", "refs/heads/main")).unwrap();

        // feat beats fix across the range c9..c7
        assert_eq!(outcome.created_tag, Some(ReleaseTagVersion::new(1, 3, 0)));
        assert!(!outcome.is_prerelease());
        assert_eq!(outcome.base_version(), "1.3.0");

        let created = mock.created_tags();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "v1.3.0");
        assert_eq!(created[0].target_sha, HEAD);
        assert_eq!(created[0].message, "\nfeat: add export\nfix: close handle");
    }

    #[test]
    fn test_major_bump_wins_regardless_of_order() {
        let mut mock = MockHistoryClient::new();
        mock.add_commit(HEAD, "fix: small");
        mock.add_commit("c8", "feat!: breaking");
        mock.add_commit("c7", "chore: base");
        mock.add_tag("v2.0.1", "c7");

        let outcome = resolve_release(&mock, &request("main", "refs/heads/main")).unwrap();
        assert_eq!(outcome.created_tag, Some(ReleaseTagVersion::new(3, 0, 0)));
    }

    #[test]
    fn test_unparseable_commits_still_move_patch() {
        let mut mock = MockHistoryClient::new();
        mock.add_commit(HEAD, "merged the thing");
        mock.add_commit("c7", "chore: base");
        mock.add_tag("v1.0.0", "c7");

        let outcome = resolve_release(&mock, &request("main", "refs/heads/main")).unwrap();
        assert_eq!(outcome.created_tag, Some(ReleaseTagVersion::new(1, 0, 1)));
    }

    #[test]
    fn test_unreachable_tag_excluded_from_previous_selection() {
        let mut mock = seeded_mock();
        // numerically greatest, but its commit is not in the walk from HEAD
        mock.add_tag("v9.9.9", "other-branch-sha");

        let outcome = resolve_release(&mock, &request("main", "refs/heads/main")).unwrap();
        assert_eq!(outcome.previous_tag, ReleaseTagVersion::new(1, 2, 3));
        assert_eq!(outcome.created_tag, Some(ReleaseTagVersion::new(1, 3, 0)));
    }

    #[test]
    fn test_invalid_tag_names_skipped() {
        let mut mock = seeded_mock();
        mock.add_tag("v-nightly", "c8");
        mock.add_tag("very-latest", "c8");

        let outcome = resolve_release(&mock, &request("main", "refs/heads/main")).unwrap();
        assert_eq!(outcome.previous_tag, ReleaseTagVersion::new(1, 2, 3));
    }

    #[test]
    fn test_first_release_tags_seed_without_bump() {
        let mut mock = MockHistoryClient::new();
        mock.add_commit(HEAD, "feat: brand new");
        mock.add_commit("c8", "fix: early");

        let outcome = resolve_release(&mock, &request("main", "refs/heads/main")).unwrap();

        // never auto-bump a version that has no history to justify it
        assert_eq!(outcome.created_tag, Some(ReleaseTagVersion::new(0, 1, 0)));
        assert_eq!(outcome.previous_tag, ReleaseTagVersion::new(0, 1, 0));
        assert_eq!(outcome.previous_tag_commit_sha, None);

        let created = mock.created_tags();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "v0.1.0");
        assert_eq!(created[0].message, "");
    }

    #[test]
    fn test_rerun_with_no_new_commits_creates_nothing() {
        let mut mock = MockHistoryClient::new();
        mock.add_commit(HEAD, "feat: released already");
        mock.add_commit("c8", "chore: earlier");
        mock.add_tag("v1.2.3", HEAD);

        let outcome = resolve_release(&mock, &request("main", "refs/heads/main")).unwrap();

        // the rerun state: created tag reported, but nothing was created
        assert_eq!(outcome.created_tag, Some(ReleaseTagVersion::new(1, 2, 3)));
        assert!(!outcome.is_prerelease());
        assert!(mock.created_tags().is_empty());
    }

    #[test]
    fn test_force_patch_when_no_changes() {
        let mut mock = MockHistoryClient::new();
        mock.add_commit(HEAD, "feat: released already");
        mock.add_tag("v1.2.3", HEAD);

        let mut req = request("main", "refs/heads/main");
        req.force_patch_if_no_changes = true;

        let outcome = resolve_release(&mock, &req).unwrap();
        assert_eq!(outcome.created_tag, Some(ReleaseTagVersion::new(1, 2, 4)));
        assert_eq!(mock.created_tags()[0].name, "v1.2.4");
    }

    #[test]
    fn test_sentinel_never_reached_is_consistency_error() {
        let commits = vec![
            CommitInfo {
                sha: HEAD.to_string(),
                message: "feat: x".to_string(),
            },
            CommitInfo {
                sha: "c8".to_string(),
                message: "fix: y".to_string(),
            },
        ];

        let err = analyze_commits_since(
            &commits,
            &ReleaseTagVersion::new(1, 2, 3),
            "missing-ancestor",
            "main",
        )
        .unwrap_err();

        assert!(matches!(err, RelverError::Consistency(_)));
        assert!(err.to_string().contains("1.2.3"));
        assert!(err.to_string().contains("missing-ancestor"));
    }

    #[test]
    fn test_analysis_stops_before_previous_release_commit() {
        let commits = vec![
            CommitInfo {
                sha: HEAD.to_string(),
                message: "fix: head".to_string(),
            },
            CommitInfo {
                sha: "c7".to_string(),
                message: "feat!: already released".to_string(),
            },
            CommitInfo {
                sha: "c6".to_string(),
                message: "feat!: older still".to_string(),
            },
        ];

        let (decision, comments) =
            analyze_commits_since(&commits, &ReleaseTagVersion::new(1, 0, 0), "c7", "main")
                .unwrap();

        // commits at and below the previous release are not re-counted
        assert_eq!(decision, BumpDecision::Patch);
        assert_eq!(comments, "\nfix: head");
    }

    #[test]
    fn test_duplicate_tag_race_is_swallowed() {
        let mut mock = seeded_mock();
        mock.set_create_behavior(CreateBehavior::AlreadyExists);

        let outcome = resolve_release(&mock, &request("main", "refs/heads/main")).unwrap();
        assert_eq!(outcome.created_tag, Some(ReleaseTagVersion::new(1, 3, 0)));
    }

    #[test]
    fn test_other_create_failure_is_fatal() {
        let mut mock = seeded_mock();
        mock.set_create_behavior(CreateBehavior::Fail);

        let err = resolve_release(&mock, &request("main", "refs/heads/main")).unwrap_err();
        assert!(err.to_string().contains("Failed to create a tag v1.3.0"));
    }

    #[test]
    fn test_tag_prefix_round_trip() {
        let mut mock = MockHistoryClient::new();
        mock.add_commit(HEAD, "fix: tweak");
        mock.add_commit("c7", "chore: base");
        mock.add_tag("service-1.0.0", "c7");

        let mut req = request("main", "refs/heads/main");
        req.tag_prefix = "service-";

        let outcome = resolve_release(&mock, &req).unwrap();
        assert_eq!(outcome.previous_tag, ReleaseTagVersion::new(1, 0, 0));
        assert_eq!(mock.created_tags()[0].name, "service-1.0.1");
    }

    #[test]
    fn test_equal_version_updates_previous_commit_sha() {
        // seed 0.1.0 and a 0.1.0 tag deeper in history: equal versions
        // still take over the commit sha, so the bump starts from the tag
        let mut mock = MockHistoryClient::new();
        mock.add_commit(HEAD, "feat: head");
        mock.add_commit("c7", "chore: base");
        mock.add_tag("v0.1.0", "c7");

        let outcome = resolve_release(&mock, &request("main", "refs/heads/main")).unwrap();
        assert_eq!(outcome.previous_tag, ReleaseTagVersion::new(0, 1, 0));
        assert_eq!(outcome.previous_tag_commit_sha.as_deref(), Some("c7"));
        assert_eq!(outcome.created_tag, Some(ReleaseTagVersion::new(0, 2, 0)));
    }

    #[test]
    fn test_releases_branch_matches_by_pattern() {
        let mock = seeded_mock();

        let outcome =
            resolve_release(&mock, &request("main", "refs/heads/feature/main-x")).unwrap();
        assert_eq!(outcome.created_tag, None);

        // the pattern is a regex, so a branch family can release too
        let outcome =
            resolve_release(&mock, &request("release/.*", "refs/heads/release/2024")).unwrap();
        assert!(outcome.created_tag.is_some());

        let outcome =
            resolve_release(&mock, &request("release/.*", "refs/heads/hotfix")).unwrap();
        assert_eq!(outcome.created_tag, None);
    }
}
