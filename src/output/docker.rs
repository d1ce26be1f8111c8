//! Container image tag derivation.
//!
//! Deterministic formatting of the resolved version into the set of image
//! tags a build should publish, and whether it should push at all.

use serde::Serialize;

use crate::context::BuildContext;
use crate::history::ReleaseInfo;
use crate::semver::{parse_semver, ResolvedVersion};

/// Derived container-image publishing instructions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DockerInfo {
    /// Comma-joined list of image tags to apply
    pub tags: String,
    /// Whether the image should be pushed (pull requests never push)
    pub push: bool,
}

/// Compute the image tags for this build.
///
/// `releases` carries the published releases when a history client was
/// available; `None` disables the `latest` determination entirely.
pub fn docker_info(
    image: &str,
    version: &ResolvedVersion,
    platform_suffix: &str,
    ctx: &BuildContext,
    releases: Option<&[ReleaseInfo]>,
) -> DockerInfo {
    let mut tags: Vec<String> = Vec::new();

    // The version label itself, with any leading 'v' stripped when the
    // label is a semantic version
    if version.tag != "latest" {
        let label_is_semver = parse_semver(&version.tag).is_some();
        if label_is_semver && version.tag.to_lowercase().starts_with('v') {
            tags.push(version.tag[1..].to_string());
        } else {
            tags.push(version.tag.clone());
        }
    }

    // Every push gets a sha tag for traceability
    if ctx.event_name == "push" {
        tags.push(format!("sha-{}", ctx.short_sha()));
    }

    if parse_semver(&version.tag).is_some() {
        if !version.pre_release.is_empty() {
            // pre-release: only the full (metadata-free) version
            tags.push(version.sem_ver_no_meta.clone());
        } else {
            // stable release: rolling tags at every precision
            tags.push(version.major.to_string());
            tags.push(format!("{}.{}", version.major, version.minor));
            tags.push(format!("{}.{}.{}", version.major, version.minor, version.patch));

            if let Some(releases) = releases {
                if is_newest_release(&version.tag, releases) {
                    tags.push("latest".to_string());
                }
            }
        }
    }

    let mut qualified: Vec<String> = Vec::new();
    for tag in tags {
        let full = if platform_suffix.is_empty() {
            format!("{}:{}", image, tag)
        } else {
            format!("{}:{}-{}", image, tag, platform_suffix)
        };
        if !qualified.contains(&full) {
            qualified.push(full);
        }
    }

    DockerInfo {
        tags: qualified.join(","),
        push: ctx.event_name != "pull_request",
    }
}

/// True when no non-prerelease release carries a higher version than
/// `version_tag`. Build metadata never participates in the comparison.
fn is_newest_release(version_tag: &str, releases: &[ReleaseInfo]) -> bool {
    let Some(current) = lenient_semver(version_tag) else {
        return false;
    };

    for release in releases {
        if release.prerelease {
            continue;
        }
        if let Some(published) = lenient_semver(&release.tag_name) {
            if current.cmp_precedence(&published) == std::cmp::Ordering::Less {
                return false;
            }
        }
    }
    true
}

fn lenient_semver(tag: &str) -> Option<semver::Version> {
    let parts = parse_semver(tag)?;
    let mut version = semver::Version::new(
        u64::from(parts.major),
        u64::from(parts.minor),
        u64::from(parts.patch),
    );
    if !parts.pre_release.is_empty() {
        version.pre = semver::Prerelease::new(&parts.pre_release).ok()?;
    }
    Some(version)
}
