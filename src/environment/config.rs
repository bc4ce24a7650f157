use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::SwcError;

/// One customer environment: where its repositories live, which branches
/// matter, and how its apps are started and built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub bitbucket_project: String,
    #[serde(default, rename = "gitVCS")]
    pub git_vcs: GitVcs,
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub current_branch: String,
    #[serde(default)]
    pub default_branch: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub repositories: RepositoryLists,
    #[serde(default)]
    pub clone_options: CloneOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported: Option<Vec<ExportedRepository>>,
    #[serde(default)]
    pub run: AppCommands,
    #[serde(default)]
    pub install: AppCommands,
    #[serde(default)]
    pub custom: CustomCommands,
    /// Keys this version does not know about, kept so hand edits survive
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GitVcs {
    #[default]
    Bitbucket,
    Github,
}

impl GitVcs {
    pub fn toggled(self) -> Self {
        match self {
            GitVcs::Bitbucket => GitVcs::Github,
            GitVcs::Github => GitVcs::Bitbucket,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GitVcs::Bitbucket => "bitbucket",
            GitVcs::Github => "github",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryLists {
    #[serde(default)]
    pub back_end: Vec<String>,
    #[serde(default)]
    pub front_end: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneOptions {
    #[serde(default)]
    pub back_end: CloneToggle,
    #[serde(default)]
    pub front_end: CloneToggle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloneToggle {
    #[serde(default)]
    pub clone: bool,
}

/// Point-in-time branch of one repository on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedRepository {
    pub name: String,
    pub branch: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppCommands {
    #[serde(default)]
    pub back_end: AppGroup,
    #[serde(default)]
    pub front_end: AppGroup,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppGroup {
    #[serde(default)]
    pub apps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomCommands {
    #[serde(default)]
    pub commands: Vec<CustomCommand>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCommand {
    pub command: String,
    #[serde(default)]
    pub description: String,
    pub alias: String,
}

impl EnvironmentConfig {
    /// Template written to a fresh store
    pub fn base_template() -> Self {
        Self {
            current_branch: super::constants::DEFAULT_BRANCH.to_string(),
            default_branch: super::constants::DEFAULT_BRANCH.to_string(),
            ..Self::default()
        }
    }

    pub fn from_json(contents: &str, origin: &Path) -> Result<Self> {
        let config: Self = serde_json::from_str(contents)
            .map_err(|e| SwcError::invalid_config(origin, e.to_string()))?;
        config.validate(origin)?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")
    }

    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SwcError::ConfigNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_json(&contents, path)
    }

    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let json = self.to_json()?;

        fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Reject documents that parse but cannot be acted on
    pub fn validate(&self, origin: &Path) -> Result<()> {
        for (index, command) in self.custom.commands.iter().enumerate() {
            if command.alias.trim().is_empty() || command.command.trim().is_empty() {
                return Err(SwcError::invalid_config(
                    origin,
                    format!("custom command #{} needs both `command` and `alias`", index + 1),
                )
                .into());
            }
        }

        if let Some(exported) = &self.exported {
            if exported.iter().any(|entry| entry.branch.trim().is_empty()) {
                return Err(
                    SwcError::invalid_config(origin, "exported entry without a branch").into(),
                );
            }
        }

        Ok(())
    }

    /// Root directory of the environment
    pub fn root(&self) -> PathBuf {
        crate::utils::fs::expand_tilde(self.path.trim())
    }

    /// The configured `path`, refusing an empty one rather than letting it
    /// resolve to the working directory
    pub fn root_dir(&self) -> Result<&str> {
        let path = self.path.trim();
        if path.is_empty() {
            return Err(SwcError::PathNotFound {
                path: PathBuf::new(),
            }
            .into());
        }
        Ok(path)
    }

    /// Exported snapshot, empty when the environment was never exported
    pub fn exported(&self) -> &[ExportedRepository] {
        self.exported.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
  "username": "jdoe",
  "bitbucketProject": "acme-platform",
  "gitVCS": "github",
  "customer": "acme",
  "currentBranch": "release/2.0",
  "defaultBranch": "release/standard",
  "path": "/work/acme",
  "repositories": { "backEnd": ["billing"], "frontEnd": ["portal"] },
  "run": { "frontEnd": { "apps": ["portal"], "command": "npm run dev" } },
  "custom": { "commands": [ { "command": "docker ps", "description": "containers", "alias": "dps" } ] },
  "notes": "kept as-is"
}"#;

    #[test]
    fn test_parse_sample() {
        let config = EnvironmentConfig::from_json(SAMPLE, Path::new("sample.json")).unwrap();

        assert_eq!(config.git_vcs, GitVcs::Github);
        assert_eq!(config.bitbucket_project, "acme-platform");
        assert_eq!(config.repositories.back_end, vec!["billing"]);
        assert_eq!(config.run.front_end.command.as_deref(), Some("npm run dev"));
        assert!(config.run.back_end.apps.is_empty());
        assert!(config.exported.is_none());
        assert_eq!(config.extra["notes"], "kept as-is");
    }

    #[test]
    fn test_serialized_keys_are_camel_case() {
        let config = EnvironmentConfig::from_json(SAMPLE, Path::new("sample.json")).unwrap();
        let json = config.to_json().unwrap();

        assert!(json.contains("\"currentBranch\": \"release/2.0\""));
        assert!(json.contains("\"gitVCS\": \"github\""));
        assert!(json.contains("\"backEnd\""));
        assert!(json.contains("\"notes\": \"kept as-is\""));
        assert!(!json.contains("exported"));
        // two-space indentation
        assert!(json.contains("\n  \"username\""));
    }

    #[test]
    fn test_malformed_json_is_invalid_config() {
        let err = EnvironmentConfig::from_json("{ \"path\": 42 }", Path::new("bad.json"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SwcError>(),
            Some(SwcError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_custom_command_without_alias_is_invalid() {
        let json = r#"{ "custom": { "commands": [ { "command": "ls", "description": "", "alias": " " } ] } }"#;
        let err = EnvironmentConfig::from_json(json, Path::new("bad.json")).unwrap_err();
        assert!(err.to_string().contains("custom command #1"));
    }

    #[tokio::test]
    async fn test_missing_file_is_config_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let err = EnvironmentConfig::load_from_file(temp_dir.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SwcError>(),
            Some(SwcError::ConfigNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("nested").join("acme.json");

        let mut config = EnvironmentConfig::base_template();
        config.customer = "acme".to_string();
        config.exported = Some(vec![ExportedRepository {
            name: "billing".to_string(),
            branch: "main".to_string(),
        }]);
        config.save_to_file(&file).await.unwrap();

        let loaded = EnvironmentConfig::load_from_file(&file).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_vcs_toggle() {
        assert_eq!(GitVcs::Bitbucket.toggled(), GitVcs::Github);
        assert_eq!(GitVcs::Github.toggled().as_str(), "bitbucket");
    }
}
