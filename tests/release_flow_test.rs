// tests/release_flow_test.rs
//
// End-to-end scenarios: release resolution over a scripted history feeding
// the build semantic-version resolver, the way main wires them together.

use std::collections::HashMap;

use relver::context::BuildContext;
use relver::domain::ReleaseTagVersion;
use relver::history::mock::{CreateBehavior, MockHistoryClient};
use relver::release::{resolve_release, ReleaseOutcome, ReleaseRequest};
use relver::semver::resolve_build_version;

const HEAD: &str = "a8cb3d0eae1f1a064896493f4cf63dafc17bafcf";

fn context(git_ref: &str, run_number: u64) -> BuildContext {
    BuildContext {
        sha: HEAD.to_string(),
        git_ref: git_ref.to_string(),
        run_number,
        event_name: "push".to_string(),
    }
}

fn mappings() -> HashMap<String, String> {
    HashMap::from([("main".to_string(), "edge".to_string())])
}

/// History: HEAD (feat) -> b2 (fix) -> b1 (tagged v1.2.2) -> b0
fn seeded_history() -> MockHistoryClient {
    let mut mock = MockHistoryClient::new();
    mock.add_commit(HEAD, "feat: add exporter");
    mock.add_commit("b2", "fix: flush on close");
    mock.add_commit("b1", "chore: cut release");
    mock.add_commit("b0", "docs: initial");
    mock.add_tag("v1.2.2", "b1");
    mock
}

fn request<'a>(git_ref: &'a str, releases_branch: &'a str) -> ReleaseRequest<'a> {
    ReleaseRequest {
        sha: HEAD,
        git_ref,
        releases_branch,
        base_version: "0.1.0",
        force_patch_if_no_changes: false,
        tag_prefix: "v",
    }
}

#[test]
fn release_then_resolve_on_releases_branch() {
    let history = seeded_history();
    let git_ref = "refs/heads/main";

    let outcome = resolve_release(&history, &request(git_ref, "main")).unwrap();
    assert_eq!(outcome.created_tag, Some(ReleaseTagVersion::new(1, 3, 0)));
    assert_eq!(history.created_tags()[0].name, "v1.3.0");

    let version = resolve_build_version(
        &outcome.base_version(),
        &mappings(),
        "prerelease",
        &context(git_ref, 23),
    )
    .unwrap();

    assert_eq!((version.major, version.minor, version.patch), (1, 3, 0));
    assert_eq!(version.tag, "edge");
    assert_eq!(version.pre_release, "prerelease.23");
    assert!(version.sem_ver.starts_with("1.3.0-prerelease.23+"));
    assert!(version.sem_ver.ends_with(".a8cb3d0e"));
}

#[test]
fn feature_branch_build_uses_previous_release() {
    let history = seeded_history();
    let git_ref = "refs/heads/my-working-branch";

    let outcome = resolve_release(&history, &request(git_ref, "main")).unwrap();
    assert!(outcome.is_prerelease());
    assert_eq!(outcome.base_version(), "1.2.2");
    assert!(history.created_tags().is_empty());

    let version =
        resolve_build_version(&outcome.base_version(), &mappings(), "", &context(git_ref, 17))
            .unwrap();

    assert_eq!(version.tag, "my-working-branch");
    assert_eq!(version.pre_release, "17");
    assert!(version.sem_ver.starts_with("1.2.2-17+"));
}

#[test]
fn pull_request_build() {
    let history = seeded_history();
    let git_ref = "refs/pull/37/merge";

    let outcome = resolve_release(&history, &request(git_ref, "main")).unwrap();
    assert!(outcome.is_prerelease());

    let version = resolve_build_version(
        &outcome.base_version(),
        &mappings(),
        "beta",
        &context(git_ref, 17),
    )
    .unwrap();

    // no mapping entry for "merge": the raw segment stays
    assert_eq!(version.tag, "merge");
    assert_eq!(version.pre_release, "beta.17");
    assert_eq!(
        (version.major, version.minor, version.patch),
        (1, 2, 2)
    );
}

#[test]
fn tag_build_overrides_everything() {
    let history = seeded_history();
    let git_ref = "refs/tags/v2.4.6-beta.2";

    let outcome = resolve_release(&history, &request(git_ref, "main")).unwrap();

    let version = resolve_build_version(
        &outcome.base_version(),
        &mappings(),
        "prerelease",
        &context(git_ref, 23),
    )
    .unwrap();

    assert_eq!((version.major, version.minor, version.patch), (2, 4, 6));
    assert_eq!(version.pre_release, "beta.2");
    assert_eq!(version.tag, "v2.4.6-beta.2");
    assert!(version.sem_ver.starts_with("2.4.6-beta.2+"));
}

#[test]
fn duplicate_tag_race_still_produces_a_version() {
    let mut history = seeded_history();
    history.set_create_behavior(CreateBehavior::AlreadyExists);
    let git_ref = "refs/heads/main";

    let outcome = resolve_release(&history, &request(git_ref, "main")).unwrap();
    assert_eq!(outcome.created_tag, Some(ReleaseTagVersion::new(1, 3, 0)));

    let version =
        resolve_build_version(&outcome.base_version(), &mappings(), "", &context(git_ref, 5))
            .unwrap();
    assert!(version.sem_ver.starts_with("1.3.0-5+"));
}

#[test]
fn missing_token_baseline_flow() {
    // no history client at all: the seed version carries the build
    let outcome = ReleaseOutcome::baseline("1.2.3").unwrap();
    assert!(outcome.is_prerelease());

    let version = resolve_build_version(
        &outcome.base_version(),
        &mappings(),
        "prerelease",
        &context("refs/heads/main", 23),
    )
    .unwrap();

    assert_eq!(version.sem_ver_no_meta, "1.2.3-prerelease.23");
    assert_eq!(version.tag, "edge");
}

#[test]
fn unreachable_tag_never_wins() {
    let mut history = seeded_history();
    // greatest version in the repository, but on another branch
    history.add_tag("v9.9.9", "dangling-sha");

    let outcome = resolve_release(&history, &request("refs/heads/main", "main")).unwrap();
    assert_eq!(outcome.previous_tag, ReleaseTagVersion::new(1, 2, 2));
    assert_eq!(outcome.created_tag, Some(ReleaseTagVersion::new(1, 3, 0)));
}
