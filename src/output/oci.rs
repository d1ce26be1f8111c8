//! OCI image label derivation.
//!
//! Values for the standard `org.opencontainers.image.*` annotations,
//! emitted as flat workflow outputs for the image build step to consume.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::context::BuildContext;
use crate::semver::ResolvedVersion;

/// Label values for the image being built
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OciInfo {
    /// `org.opencontainers.image.created`: RFC 3339 UTC build time
    pub created: String,
    /// `org.opencontainers.image.revision`: full commit sha
    pub revision: String,
    /// `org.opencontainers.image.version`: resolved semantic version
    pub version: String,
    /// `org.opencontainers.image.ref.name`: human label for this build
    pub ref_name: String,
}

/// Derive OCI labels, stamping the current time
pub fn oci_info(version: &ResolvedVersion, ctx: &BuildContext) -> OciInfo {
    oci_info_at(version, ctx, Utc::now())
}

/// Derive OCI labels with an explicit timestamp
pub fn oci_info_at(version: &ResolvedVersion, ctx: &BuildContext, now: DateTime<Utc>) -> OciInfo {
    OciInfo {
        created: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        revision: ctx.sha.clone(),
        version: version.sem_ver.clone(),
        ref_name: version.tag.clone(),
    }
}
