use std::fmt;

/// Release version derived from a repository tag name.
///
/// Holds the bare `major.minor.patch` triple; the tag prefix is stripped
/// before parsing and re-applied when the tag name is rebuilt. The derived
/// ordering is the lexicographic order on (major, minor, patch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReleaseTagVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ReleaseTagVersion {
    /// Create a new version
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        ReleaseTagVersion {
            major,
            minor,
            patch,
        }
    }

    /// Parse a bare `major.minor.patch` string.
    ///
    /// Accepts ONLY the exact numeric triple: no `v` prefix, no pre-release
    /// or build suffix, no leading zeros. Returns `None` on any mismatch —
    /// a repository without a prior release is a legitimate state, so
    /// failure to parse is not an error here.
    ///
    /// # Example
    /// ```ignore
    /// assert_eq!(ReleaseTagVersion::parse("1.2.3"), Some(ReleaseTagVersion::new(1, 2, 3)));
    /// assert_eq!(ReleaseTagVersion::parse("v1.2.3"), None);
    /// assert_eq!(ReleaseTagVersion::parse("1.2.3-beta.1"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }

        let mut parts = s.split('.');
        let major = parse_component(parts.next()?)?;
        let minor = parse_component(parts.next()?)?;
        let patch = parse_component(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }

        Some(ReleaseTagVersion::new(major, minor, patch))
    }

    /// Parse a version out of a tag name by removing the first occurrence
    /// of `prefix` and strict-parsing the remainder.
    pub fn from_tag_name(name: &str, prefix: &str) -> Option<Self> {
        if prefix.is_empty() {
            Self::parse(name)
        } else {
            Self::parse(&name.replacen(prefix, "", 1))
        }
    }

    /// Selection predicate used when scanning history for the most advanced
    /// prior release. Reflexive: a version is greater-or-equal to itself.
    pub fn is_greater_or_equal_to(&self, other: &ReleaseTagVersion) -> bool {
        self >= other
    }

    /// Return a new version with major incremented and minor/patch reset to 0
    pub fn increment_major(&self) -> Self {
        ReleaseTagVersion::new(self.major + 1, 0, 0)
    }

    /// Return a new version with minor incremented and patch reset to 0
    pub fn increment_minor(&self) -> Self {
        ReleaseTagVersion::new(self.major, self.minor + 1, 0)
    }

    /// Return a new version with patch incremented
    pub fn increment_patch(&self) -> Self {
        ReleaseTagVersion::new(self.major, self.minor, self.patch + 1)
    }
}

/// Numeric component: digits only, no leading zeros
fn parse_component(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.len() > 1 && s.starts_with('0') {
        return None;
    }
    s.parse::<u32>().ok()
}

impl fmt::Display for ReleaseTagVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Most significant change observed across a commit range.
///
/// The derived ordering is the accumulation priority: any Major commit in
/// range forces a major bump regardless of what else is present, so ranges
/// combine with `max`, never by counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BumpDecision {
    None,
    Patch,
    Minor,
    Major,
}
