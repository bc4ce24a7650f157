//! Constants for the config store location and file naming

use std::path::PathBuf;

/// Store directory relative to the home directory
pub const CONFIG_DIR_PATH: &str = "SetupWiz-cli/resources";

/// Base template every customer config is derived from
pub const BASE_CONFIG_FILE: &str = "git-config.json";

/// Suffix shared by every config file in the store
pub const CONFIG_FILE_SUFFIX: &str = "-git-config.json";

/// Default branch proposed by the setup wizard
pub const DEFAULT_BRANCH: &str = "release/standard";

/// Get the configuration directory path
pub fn get_config_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(CONFIG_DIR_PATH)
}

/// `<customer>-<branch>-git-config.json`, with path separators in the branch
/// flattened to `-`.
pub fn config_file_name(customer: &str, branch: &str) -> String {
    let branch = branch.replace(['/', '\\'], "-");
    format!("{customer}-{branch}{CONFIG_FILE_SUFFIX}")
}
