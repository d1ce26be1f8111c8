use regex::Regex;

use crate::domain::BumpDecision;

/// Conventional-commit header grammar.
///
/// Unanchored on purpose: the header is located anywhere in the first
/// matching position of the message, type is case-insensitive, scope is
/// free text in parentheses, and a `!` before the colon marks a breaking
/// change. This pattern is an interop contract; downstream bump decisions
/// depend on its exact acceptance boundaries.
const HEADER_PATTERN: &str = r"(?i)(feat|fix|chore|refactor|style|test|docs)(\(([^)]*)\))?(!)?:\s?(.*)";

/// Literal marker in a commit body that denotes a breaking change
const BREAKING_CHANGE_MARKER: &str = "BREAKING CHANGE:";

/// Parsed representation of a conventional commit message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
    pub r#type: String,
    pub scope: Option<String>,
    pub description: String,
    pub is_breaking_change: bool,
}

impl ParsedCommit {
    /// Parse a commit message against the conventional-commit grammar.
    ///
    /// Supports formats:
    /// - type(scope)!: description
    /// - type(scope): description
    /// - type!: description
    /// - type: description
    ///
    /// Returns `None` when the message does not match the grammar at all.
    /// The `BREAKING CHANGE:` body marker only applies to messages whose
    /// header matched; an unmatched message is never a parsed commit.
    pub fn parse(message: &str) -> Option<Self> {
        let captures = Regex::new(HEADER_PATTERN)
            .ok()
            .and_then(|re| re.captures(message))?;

        let r#type = captures
            .get(1)
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_default();
        let scope = captures.get(3).map(|m| m.as_str().to_string());
        let has_exclamation = captures.get(4).is_some();
        let description = captures
            .get(5)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        Some(ParsedCommit {
            r#type,
            scope,
            description,
            is_breaking_change: has_exclamation || message.contains(BREAKING_CHANGE_MARKER),
        })
    }
}

/// Classify a single commit message into a bump category.
///
/// Breaking changes win; `feat` is a minor bump; every other recognized
/// type is a patch. A message that does not match the grammar still yields
/// `Patch` — teams not writing conventional commits still get version
/// movement, an unrecognized commit is never silently ignored.
pub fn classify(message: &str) -> BumpDecision {
    match ParsedCommit::parse(message) {
        Some(parsed) if parsed.is_breaking_change => BumpDecision::Major,
        Some(parsed) if parsed.r#type == "feat" => BumpDecision::Minor,
        Some(_) => BumpDecision::Patch,
        None => BumpDecision::Patch,
    }
}
