use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use super::config::EnvironmentConfig;
use super::constants::{get_config_dir, BASE_CONFIG_FILE};
use crate::error::SwcError;

/// Directory of JSON config files: the base template plus one file per
/// customer environment.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

/// Outcome of copying an external config into the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported(PathBuf),
    AlreadyPresent(PathBuf),
}

/// Fields of the base config the `gc` command may rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseField {
    Username,
    BitbucketProject,
    Path,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store in `~/SetupWiz-cli/resources`
    pub fn default_location() -> Self {
        Self::new(get_config_dir())
    }

    /// Store at `override_dir` if given, else `~/SetupWiz-cli/resources`
    pub fn resolve(override_dir: Option<PathBuf>) -> Self {
        let dir = override_dir
            .map(crate::utils::fs::expand_tilde)
            .unwrap_or_else(get_config_dir);
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File names are relative to the store; absolute paths pass through.
    pub fn path_of(&self, file_name: &str) -> PathBuf {
        let candidate = Path::new(file_name);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.dir.join(candidate)
        }
    }

    /// Write the base template unless one already exists
    pub async fn ensure_base_config(&self) -> Result<PathBuf> {
        crate::utils::fs::ensure_directory_exists(&self.dir).await?;

        let base = self.path_of(BASE_CONFIG_FILE);
        if !base.exists() {
            info!("Creating base config at {}", base.display());
            EnvironmentConfig::base_template()
                .save_to_file(&base)
                .await?;
        }

        Ok(base)
    }

    pub async fn load(&self, file_name: &str) -> Result<EnvironmentConfig> {
        EnvironmentConfig::load_from_file(self.path_of(file_name)).await
    }

    pub async fn save(&self, file_name: &str, config: &EnvironmentConfig) -> Result<PathBuf> {
        let path = self.path_of(file_name);
        debug!("Updating {}", path.display());
        config.save_to_file(&path).await?;
        Ok(path)
    }

    pub async fn load_base(&self) -> Result<EnvironmentConfig> {
        self.load(BASE_CONFIG_FILE).await
    }

    /// Store file names containing `customer`, sorted
    pub async fn find_configs(&self, customer: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();

        if !self.dir.is_dir() {
            return Ok(names);
        }

        let mut entries = fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("Failed to read store: {}", self.dir.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.contains(customer) {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    /// Overwrite one field of the base config
    pub async fn update_field(&self, field: BaseField, value: &str) -> Result<()> {
        let mut config = self.load_base().await?;

        let slot = match field {
            BaseField::Username => &mut config.username,
            BaseField::BitbucketProject => &mut config.bitbucket_project,
            BaseField::Path => &mut config.path,
        };
        info!("Updating {:?} from '{}' to '{}'", field, slot, value);
        *slot = value.to_string();

        self.save(BASE_CONFIG_FILE, &config).await?;
        Ok(())
    }

    /// Flip the base config between bitbucket and github; returns the new value
    pub async fn toggle_vcs(&self) -> Result<super::config::GitVcs> {
        let mut config = self.load_base().await?;
        config.git_vcs = config.git_vcs.toggled();
        self.save(BASE_CONFIG_FILE, &config).await?;
        Ok(config.git_vcs)
    }

    /// Copy an external config file into the store, never overwriting
    pub async fn import(&self, src: &Path) -> Result<ImportOutcome> {
        if !src.is_file() {
            return Err(SwcError::PathNotFound {
                path: src.to_path_buf(),
            }
            .into());
        }

        let file_name = src
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Cannot import {}", src.display()))?;

        // Refuse to bring in something we could not load later
        let contents = fs::read_to_string(src)
            .await
            .with_context(|| format!("Failed to read {}", src.display()))?;
        EnvironmentConfig::from_json(&contents, src)?;

        crate::utils::fs::ensure_directory_exists(&self.dir).await?;
        let target = self.dir.join(file_name);
        if target.exists() {
            return Ok(ImportOutcome::AlreadyPresent(target));
        }

        fs::copy(src, &target)
            .await
            .with_context(|| format!("Failed to copy {} to {}", src.display(), target.display()))?;

        Ok(ImportOutcome::Imported(target))
    }

    /// Move every stored config into a timestamped backup directory and start
    /// over from a fresh base template. Returns the backup location.
    pub async fn reset(&self) -> Result<Option<PathBuf>> {
        let backup = if self.dir.exists() {
            let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
            let dir_name = self
                .dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "resources".to_string());
            let backup = self.dir.with_file_name(format!("{dir_name}-backup-{stamp}"));

            fs::rename(&self.dir, &backup).await.with_context(|| {
                format!(
                    "Failed to move {} to {}",
                    self.dir.display(),
                    backup.display()
                )
            })?;
            Some(backup)
        } else {
            None
        };

        self.ensure_base_config().await?;
        Ok(backup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::config::GitVcs;
    use tempfile::TempDir;

    fn store() -> (TempDir, ConfigStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = ConfigStore::new(temp_dir.path().join("resources"));
        (temp_dir, store)
    }

    #[tokio::test]
    async fn test_ensure_base_config_keeps_existing() {
        let (_temp, store) = store();
        store.ensure_base_config().await.unwrap();
        store
            .update_field(BaseField::Username, "jdoe")
            .await
            .unwrap();

        store.ensure_base_config().await.unwrap();
        assert_eq!(store.load_base().await.unwrap().username, "jdoe");
    }

    #[tokio::test]
    async fn test_find_configs_filters_by_customer() {
        let (_temp, store) = store();
        store.ensure_base_config().await.unwrap();
        let config = EnvironmentConfig::base_template();
        store
            .save("acme-main-git-config.json", &config)
            .await
            .unwrap();
        store
            .save("globex-main-git-config.json", &config)
            .await
            .unwrap();
        store
            .save("acme-dev-git-config.json", &config)
            .await
            .unwrap();

        let found = store.find_configs("acme").await.unwrap();
        assert_eq!(
            found,
            vec!["acme-dev-git-config.json", "acme-main-git-config.json"]
        );
    }

    #[tokio::test]
    async fn test_toggle_vcs() {
        let (_temp, store) = store();
        store.ensure_base_config().await.unwrap();

        assert_eq!(store.toggle_vcs().await.unwrap(), GitVcs::Github);
        assert_eq!(store.toggle_vcs().await.unwrap(), GitVcs::Bitbucket);
    }

    #[tokio::test]
    async fn test_import_never_overwrites() {
        let (temp, store) = store();
        let src = temp.path().join("acme-main-git-config.json");
        let mut config = EnvironmentConfig::base_template();
        config.customer = "acme".to_string();
        config.save_to_file(&src).await.unwrap();

        let first = store.import(&src).await.unwrap();
        assert!(matches!(first, ImportOutcome::Imported(_)));

        let second = store.import(&src).await.unwrap();
        assert!(matches!(second, ImportOutcome::AlreadyPresent(_)));

        let missing = store.import(&temp.path().join("nope.json")).await;
        assert!(matches!(
            missing.unwrap_err().downcast_ref::<SwcError>(),
            Some(SwcError::PathNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_reset_backs_up_store() {
        let (_temp, store) = store();
        store.ensure_base_config().await.unwrap();
        store
            .save("acme-main-git-config.json", &EnvironmentConfig::base_template())
            .await
            .unwrap();

        let backup = store.reset().await.unwrap().expect("backup created");
        assert!(backup.join("acme-main-git-config.json").exists());
        assert_eq!(store.find_configs("acme").await.unwrap(), Vec::<String>::new());
        assert!(store.path_of(BASE_CONFIG_FILE).exists());
    }
}
