//! Build semantic-version resolution.
//!
//! Combines the base version produced by release resolution with the
//! current ref, branch-name mappings, and build identifiers into the final
//! published version. An exact tag ref always wins over the base version.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

use crate::context::BuildContext;
use crate::error::{RelverError, Result};

/// Relaxed semantic-version grammar: `major.minor.patch[-prerelease][+build]`
/// with an optional leading `v`. Pre-release and build segments are
/// dot-separated alphanumeric/hyphen tokens. This pattern is an interop
/// contract: it must accept `9.6.1-something.bla.bla+something.else-here`
/// and reject `1.2.3.4`.
const SEMVER_PATTERN: &str = r"(?i)^v?(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-((?:0|[1-9]\d*|[\da-z-]*[a-z-][\da-z-]*)(?:\.(?:0|[1-9]\d*|[\da-z-]*[a-z-][\da-z-]*))*))?(?:\+([\da-z-]+(?:\.[\da-z-]+)*))?$";

/// Components captured from the semantic-version grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemVerParts {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub pre_release: String,
    pub build: String,
}

/// Match a string against the semantic-version grammar.
///
/// Returns `None` when the string is not a semantic version. Numeric
/// components too large for `u32` also fail the match.
pub fn parse_semver(s: &str) -> Option<SemVerParts> {
    let captures = Regex::new(SEMVER_PATTERN).ok()?.captures(s)?;

    let component = |i: usize| captures.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let segment = |i: usize| {
        captures
            .get(i)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    };

    Some(SemVerParts {
        major: component(1)?,
        minor: component(2)?,
        patch: component(3)?,
        pre_release: segment(4),
        build: segment(5),
    })
}

/// Final resolved version for the current build.
///
/// Field names serialize in camelCase because they are emitted verbatim as
/// workflow outputs (`ver_preRelease`, `ver_semVer`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub pre_release: String,
    pub build: String,
    /// Human label for this build: branch name, mapped label, PR merge
    /// label, or literal tag name. Independent of the numeric triple.
    pub tag: String,
    pub sem_ver: String,
    /// `sem_ver` without the build-metadata segment
    pub sem_ver_no_meta: String,
}

/// Resolve the published version for this build, stamping the current time
/// into the build-metadata segment.
pub fn resolve_build_version(
    base_ver: &str,
    branch_mappings: &HashMap<String, String>,
    prerelease_prefix: &str,
    ctx: &BuildContext,
) -> Result<ResolvedVersion> {
    resolve_build_version_at(base_ver, branch_mappings, prerelease_prefix, ctx, Utc::now())
}

/// Resolve the published version with an explicit timestamp.
///
/// Rules, in order:
/// 1. The base version must match the semantic-version grammar (fatal
///    configuration error otherwise).
/// 2. `tag` defaults to the final path segment of the ref.
/// 3. `pre_release` defaults to `<prefix>.<run number>` (prefix omitted
///    when empty); `build` is `<UTC timestamp, punctuation stripped>.<sha8>`.
/// 4. A tag ref must itself be a valid semantic version and fully overrides
///    the numeric triple and pre-release; `build` stays freshly computed.
/// 5. Otherwise a branch-mapping entry for the lower-cased ref segment
///    replaces `tag` with the mapped label.
pub fn resolve_build_version_at(
    base_ver: &str,
    branch_mappings: &HashMap<String, String>,
    prerelease_prefix: &str,
    ctx: &BuildContext,
    now: DateTime<Utc>,
) -> Result<ResolvedVersion> {
    let base = parse_semver(base_ver).ok_or_else(|| {
        RelverError::config(format!(
            "base-version of \"{}\" is not a valid SEMVER",
            base_ver
        ))
    })?;

    let prefix = if prerelease_prefix.is_empty() {
        String::new()
    } else {
        format!("{}.", prerelease_prefix)
    };

    let mut major = base.major;
    let mut minor = base.minor;
    let mut patch = base.patch;
    let mut pre_release = format!("{}{}", prefix, ctx.run_number);
    let build = format!("{}.{}", now.format("%Y%m%dT%H%M%S%3fZ"), ctx.short_sha());

    let ref_end = ctx.ref_end();
    let mut tag = ref_end.to_string();

    if ctx.is_tag_ref() {
        // A git tag is ground truth: its own components fully override the
        // base version, while build metadata stays fresh.
        let tag_parts = parse_semver(ref_end).ok_or_else(|| {
            RelverError::config(format!("Tag of \"{}\" is not a valid SEMVER", ref_end))
        })?;

        major = tag_parts.major;
        minor = tag_parts.minor;
        patch = tag_parts.patch;
        pre_release = tag_parts.pre_release;
    } else if let Some(mapped) = branch_mappings.get(&ref_end.to_lowercase()) {
        tag = mapped.clone();
    }

    let sem_ver_no_meta = if pre_release.is_empty() {
        format!("{}.{}.{}", major, minor, patch)
    } else {
        format!("{}.{}.{}-{}", major, minor, patch, pre_release)
    };
    let sem_ver = if build.is_empty() {
        sem_ver_no_meta.clone()
    } else {
        format!("{}+{}", sem_ver_no_meta, build)
    };

    Ok(ResolvedVersion {
        major,
        minor,
        patch,
        pre_release,
        build,
        tag,
        sem_ver,
        sem_ver_no_meta,
    })
}
