//! Configuration loading and validation.
//!
//! The configuration is one YAML document: a `settings` block of global
//! desired state, optional file-sync / ruleset / autolink / package.json
//! blocks, and a `repositories` list whose entries are `owner/name` strings
//! (or `owner/*` patterns) plus per-repository overrides. Override keys
//! exactly mirror the global setting names.
//!
//! Unknown keys are detected against an explicitly constructed
//! [`KnownKeys`] table that callers pass into the validator — deliberately
//! not an ambient global cache, so the validator stays pure and testable.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::autolinks::AutolinkSpec;
use crate::types::{DesiredSettings, MergeSettings};

/// Errors raised while loading or validating configuration.
///
/// All of these are fatal at the driver level, before any per-repository
/// work begins.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// One settings block: global or per-repository override. All fields are
/// tri-state so an omitted key means "inherit" (for overrides) or "do not
/// touch" (globally).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsBlock {
    #[serde(default)]
    pub allow_squash_merge: Option<bool>,
    #[serde(default)]
    pub allow_merge_commit: Option<bool>,
    #[serde(default)]
    pub allow_rebase_merge: Option<bool>,
    #[serde(default)]
    pub allow_auto_merge: Option<bool>,
    #[serde(default)]
    pub delete_branch_on_merge: Option<bool>,
    #[serde(default)]
    pub allow_update_branch: Option<bool>,
    #[serde(default)]
    pub topics: Option<Vec<String>>,
    #[serde(default)]
    pub code_scanning: Option<bool>,
    #[serde(default)]
    pub immutable_releases: Option<bool>,
    #[serde(default)]
    pub secret_scanning: Option<bool>,
    #[serde(default)]
    pub secret_scanning_push_protection: Option<bool>,
    #[serde(default)]
    pub dependabot_alerts: Option<bool>,
    #[serde(default)]
    pub dependabot_security_updates: Option<bool>,

    /// Anything not recognized above; reported as typo warnings.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

impl SettingsBlock {
    /// Layers this block over a base, field by field (`Some` wins).
    pub fn merged_over(&self, base: &SettingsBlock) -> SettingsBlock {
        SettingsBlock {
            allow_squash_merge: self.allow_squash_merge.or(base.allow_squash_merge),
            allow_merge_commit: self.allow_merge_commit.or(base.allow_merge_commit),
            allow_rebase_merge: self.allow_rebase_merge.or(base.allow_rebase_merge),
            allow_auto_merge: self.allow_auto_merge.or(base.allow_auto_merge),
            delete_branch_on_merge: self.delete_branch_on_merge.or(base.delete_branch_on_merge),
            allow_update_branch: self.allow_update_branch.or(base.allow_update_branch),
            topics: self.topics.clone().or_else(|| base.topics.clone()),
            code_scanning: self.code_scanning.or(base.code_scanning),
            immutable_releases: self.immutable_releases.or(base.immutable_releases),
            secret_scanning: self.secret_scanning.or(base.secret_scanning),
            secret_scanning_push_protection: self
                .secret_scanning_push_protection
                .or(base.secret_scanning_push_protection),
            dependabot_alerts: self.dependabot_alerts.or(base.dependabot_alerts),
            dependabot_security_updates: self
                .dependabot_security_updates
                .or(base.dependabot_security_updates),
            unknown: BTreeMap::new(),
        }
    }

    /// Converts into the reconciler-facing desired state.
    pub fn to_desired(&self) -> DesiredSettings {
        DesiredSettings {
            merge: MergeSettings {
                allow_squash_merge: self.allow_squash_merge,
                allow_merge_commit: self.allow_merge_commit,
                allow_rebase_merge: self.allow_rebase_merge,
                allow_auto_merge: self.allow_auto_merge,
                delete_branch_on_merge: self.delete_branch_on_merge,
                allow_update_branch: self.allow_update_branch,
            },
            topics: self.topics.clone(),
            code_scanning: self.code_scanning,
            immutable_releases: self.immutable_releases,
            secret_scanning: self.secret_scanning,
            secret_scanning_push_protection: self.secret_scanning_push_protection,
            dependabot_alerts: self.dependabot_alerts,
            dependabot_security_updates: self.dependabot_security_updates,
        }
    }
}

/// One file-sync block: a batch of files delivered through one branch/PR.
#[derive(Debug, Clone, Deserialize)]
pub struct FileSyncBlock {
    /// Result key this sync reports under (e.g. "dependabot").
    pub key: String,
    pub branch: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    /// Optional named content processor; currently only "gitignore".
    #[serde(default)]
    pub processor: Option<String>,
    pub targets: Vec<FileTargetBlock>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileTargetBlock {
    pub source: PathBuf,
    pub target: String,
}

/// package.json field merge configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageJsonBlock {
    pub source: PathBuf,
    /// Subset of {"scripts", "engines"}.
    pub fields: Vec<String>,
    pub branch: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
}

/// One repository entry: the identifier (or `owner/*` pattern) plus
/// overrides mirroring the global setting names.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoEntry {
    pub repo: String,
    #[serde(flatten)]
    pub overrides: SettingsBlock,
}

/// The complete configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub settings: SettingsBlock,
    #[serde(default)]
    pub file_syncs: Vec<FileSyncBlock>,
    #[serde(default)]
    pub ruleset: Option<serde_json::Value>,
    #[serde(default)]
    pub delete_other_rulesets: bool,
    #[serde(default)]
    pub autolinks: Option<Vec<AutolinkSpec>>,
    #[serde(default)]
    pub package_json: Option<PackageJsonBlock>,
    pub repositories: Vec<RepoEntry>,
}

/// The set of recognized setting keys, constructed explicitly and passed
/// into validation.
#[derive(Debug, Clone)]
pub struct KnownKeys(BTreeSet<&'static str>);

impl KnownKeys {
    /// The standard key set: the global setting names, which override keys
    /// mirror exactly.
    pub fn standard() -> Self {
        let mut keys = BTreeSet::new();
        for field in MergeSettings::FIELDS {
            keys.insert(field);
        }
        for extra in [
            "topics",
            "code_scanning",
            "immutable_releases",
            "secret_scanning",
            "secret_scanning_push_protection",
            "dependabot_alerts",
            "dependabot_security_updates",
        ] {
            keys.insert(extra);
        }
        Self(keys)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }
}

/// Returns the unrecognized keys of a settings block (candidate typos).
pub fn unknown_keys(known: &KnownKeys, block: &SettingsBlock) -> Vec<String> {
    block
        .unknown
        .keys()
        .filter(|k| !known.contains(k))
        .cloned()
        .collect()
}

/// Loads and validates a configuration file.
///
/// Structural problems (empty repository list, empty file-sync target list,
/// unsupported package.json fields, invalid ruleset document) are fatal
/// here, before any per-repository work. Unknown setting keys are warned
/// about but tolerated.
pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ConfigFile = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    validate_config(&config)?;

    let known = KnownKeys::standard();
    for key in unknown_keys(&known, &config.settings) {
        tracing::warn!(key, "unknown key in global settings block");
    }
    for entry in &config.repositories {
        for key in unknown_keys(&known, &entry.overrides) {
            tracing::warn!(repo = %entry.repo, key, "unknown override key");
        }
    }

    Ok(config)
}

fn validate_config(config: &ConfigFile) -> Result<(), ConfigError> {
    if config.repositories.is_empty() {
        return Err(ConfigError::Validation(
            "repositories list is empty".to_string(),
        ));
    }

    for sync in &config.file_syncs {
        if sync.targets.is_empty() {
            return Err(ConfigError::Validation(format!(
                "file sync {:?} has no targets",
                sync.key
            )));
        }
        if let Some(processor) = &sync.processor {
            if processor != "gitignore" {
                return Err(ConfigError::Validation(format!(
                    "file sync {:?} names unknown processor {processor:?}",
                    sync.key
                )));
            }
        }
    }

    if let Some(ruleset) = &config.ruleset {
        if ruleset.get("name").and_then(serde_json::Value::as_str).is_none() {
            return Err(ConfigError::Validation(
                "ruleset document is missing a \"name\" field".to_string(),
            ));
        }
    }

    if let Some(block) = &config.package_json {
        if block.fields.is_empty() {
            return Err(ConfigError::Validation(
                "package_json.fields is empty".to_string(),
            ));
        }
        for field in &block.fields {
            if !crate::package_json::ALLOWED_FIELDS.contains(&field.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "package_json field {field:?} is not supported (expected scripts or engines)"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
settings:
  allow_squash_merge: true
  allow_merge_commit: false
  delete_branch_on_merge: true
  topics: [rust, tooling]
  secret_scanning: true
file_syncs:
  - key: dependabot
    branch: dependabot-yml-sync
    title: "chore: sync dependabot config"
    targets:
      - source: files/dependabot.yml
        target: .github/dependabot.yml
  - key: gitignore
    branch: gitignore-sync
    title: "chore: sync .gitignore"
    processor: gitignore
    targets:
      - source: files/gitignore
        target: .gitignore
ruleset:
  name: main-protection
  target: branch
  enforcement: active
  rules:
    - type: deletion
autolinks:
  - key_prefix: TICKET-
    url_template: https://tickets.example.com/<num>
repositories:
  - repo: octocat/hello-world
  - repo: octocat/spoon-knife
    allow_squash_merge: false
    topics: [rust]
"#;

    #[test]
    fn parses_sample_config() {
        let config: ConfigFile = serde_yaml::from_str(SAMPLE).unwrap();
        validate_config(&config).unwrap();

        assert_eq!(config.repositories.len(), 2);
        assert_eq!(config.file_syncs.len(), 2);
        assert_eq!(config.settings.allow_squash_merge, Some(true));
        assert_eq!(
            config.ruleset.as_ref().unwrap()["name"],
            serde_json::json!("main-protection")
        );
        assert_eq!(config.autolinks.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn override_merging_mirrors_global_names() {
        let config: ConfigFile = serde_yaml::from_str(SAMPLE).unwrap();
        let global = &config.settings;
        let entry = &config.repositories[1];
        let merged = entry.overrides.merged_over(global);

        // Override wins where set, global shows through where not.
        assert_eq!(merged.allow_squash_merge, Some(false));
        assert_eq!(merged.allow_merge_commit, Some(false));
        assert_eq!(merged.delete_branch_on_merge, Some(true));
        assert_eq!(merged.topics, Some(vec!["rust".to_string()]));
        assert_eq!(merged.secret_scanning, Some(true));
        // Globally-unset fields stay unset after merging.
        assert_eq!(merged.allow_rebase_merge, None);
    }

    #[test]
    fn unknown_keys_are_detected() {
        let yaml = r#"
settings:
  allow_squash_merge: true
  alow_rebase_merge: true
repositories:
  - repo: octocat/hello-world
"#;
        let config: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        let known = KnownKeys::standard();
        assert_eq!(
            unknown_keys(&known, &config.settings),
            vec!["alow_rebase_merge".to_string()]
        );
        assert!(unknown_keys(&known, &config.repositories[0].overrides).is_empty());
    }

    #[test]
    fn empty_repositories_is_fatal() {
        let yaml = "repositories: []\n";
        let config: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn unsupported_package_json_field_is_fatal() {
        let yaml = r#"
package_json:
  source: files/package.json
  fields: [dependencies]
  branch: package-json-sync
  title: "chore: sync package.json fields"
repositories:
  - repo: octocat/hello-world
"#;
        let config: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn ruleset_without_name_is_fatal() {
        let yaml = r#"
ruleset:
  target: branch
repositories:
  - repo: octocat/hello-world
"#;
        let config: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn to_desired_carries_tri_states() {
        let config: ConfigFile = serde_yaml::from_str(SAMPLE).unwrap();
        let desired = config.settings.to_desired();
        assert_eq!(desired.merge.allow_squash_merge, Some(true));
        assert_eq!(desired.merge.allow_auto_merge, None);
        assert_eq!(desired.secret_scanning, Some(true));
        assert_eq!(desired.dependabot_alerts, None);
    }
}
