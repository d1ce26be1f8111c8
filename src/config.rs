use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{RelverError, Result};

/// Represents the complete configuration for relver.
///
/// Mirrors the CLI surface; flag values override anything loaded from a
/// configuration file.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Seed semantic version used when history holds no prior release
    #[serde(default = "default_base_version")]
    pub base_version: String,

    /// Lower-cased branch name -> display label
    #[serde(default)]
    pub branch_mappings: HashMap<String, String>,

    /// Prefix prepended to the run number in pre-release identifiers
    #[serde(default)]
    pub prerelease_prefix: String,

    /// Prefix carried by release tag names
    #[serde(default)]
    pub tag_prefix: String,

    /// Branch on which release tags are created; empty disables tagging
    #[serde(default)]
    pub releases_branch: String,

    /// Bump patch even when no qualifying commits are found
    #[serde(default)]
    pub force_patch_increment_if_no_changes: bool,

    /// Container image name; empty skips docker tag derivation
    #[serde(default)]
    pub docker_image: String,

    /// Platform suffix appended to every derived docker tag
    #[serde(default)]
    pub docker_platform_suffix: String,

    /// Path the resolved semVer is written to; empty skips the write
    #[serde(default)]
    pub version_file: String,
}

fn default_base_version() -> String {
    "0.1.0".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_version: default_base_version(),
            branch_mappings: HashMap::new(),
            prerelease_prefix: String::new(),
            tag_prefix: String::new(),
            releases_branch: String::new(),
            force_patch_increment_if_no_changes: false,
            docker_image: String::new(),
            docker_platform_suffix: String::new(),
            version_file: String::new(),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `relver.toml` in current directory
/// 3. `.relver.toml` in the user config directory
/// 4. Default configuration if no file found
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new("./relver.toml").exists() {
        fs::read_to_string("./relver.toml")?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(".relver.toml");
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| RelverError::config(format!("Cannot parse configuration: {}", e)))?;
    validate_mappings(&config.branch_mappings)?;
    Ok(config)
}

/// Parse `branch:label` mapping lines into a lookup keyed by lower-cased
/// branch name.
///
/// A mapping must name both sides: a line without a separator, or with an
/// empty branch or label, is a configuration error — there is no
/// found-but-empty state for a mapping to be in.
pub fn parse_branch_mappings(lines: &[String]) -> Result<HashMap<String, String>> {
    let mut mappings = HashMap::new();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (branch, label) = line.split_once(':').ok_or_else(|| {
            RelverError::config(format!(
                "Branch mapping '{}' is not in 'branch:label' form",
                line
            ))
        })?;
        let branch = branch.trim();
        let label = label.trim();
        if branch.is_empty() || label.is_empty() {
            return Err(RelverError::config(format!(
                "Branch mapping '{}' has an empty branch or label",
                line
            )));
        }

        mappings.insert(branch.to_lowercase(), label.to_string());
    }

    Ok(mappings)
}

fn validate_mappings(mappings: &HashMap<String, String>) -> Result<()> {
    for (branch, label) in mappings {
        if branch.is_empty() || label.is_empty() {
            return Err(RelverError::config(format!(
                "Branch mapping '{}:{}' has an empty branch or label",
                branch, label
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.base_version, "0.1.0");
        assert!(config.branch_mappings.is_empty());
        assert_eq!(config.releases_branch, "");
        assert!(!config.force_patch_increment_if_no_changes);
    }

    #[test]
    fn test_parse_mappings() {
        let lines = vec!["main:edge".to_string(), "Release:stable".to_string()];
        let mappings = parse_branch_mappings(&lines).unwrap();
        assert_eq!(mappings.get("main"), Some(&"edge".to_string()));
        // keys are lower-cased for case-insensitive branch lookup
        assert_eq!(mappings.get("release"), Some(&"stable".to_string()));
    }

    #[test]
    fn test_parse_mappings_skips_blank_lines() {
        let lines = vec!["".to_string(), "  ".to_string(), "main:edge".to_string()];
        let mappings = parse_branch_mappings(&lines).unwrap();
        assert_eq!(mappings.len(), 1);
    }

    #[test]
    fn test_parse_mappings_rejects_missing_separator() {
        let lines = vec!["main".to_string()];
        assert!(parse_branch_mappings(&lines).is_err());
    }

    #[test]
    fn test_parse_mappings_rejects_empty_label() {
        for line in ["main:", ":edge", " : "] {
            let err = parse_branch_mappings(&[line.to_string()]).unwrap_err();
            assert!(
                matches!(err, RelverError::Config(_)),
                "'{}' should be a configuration error",
                line
            );
        }
    }

    #[test]
    fn test_config_from_toml_string() {
        let toml_str = r#"
base_version = "1.0.0"
releases_branch = "main"
tag_prefix = "v"
force_patch_increment_if_no_changes = true

[branch_mappings]
main = "edge"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.base_version, "1.0.0");
        assert_eq!(config.releases_branch, "main");
        assert_eq!(config.tag_prefix, "v");
        assert!(config.force_patch_increment_if_no_changes);
        assert_eq!(config.branch_mappings.get("main"), Some(&"edge".to_string()));
    }
}
