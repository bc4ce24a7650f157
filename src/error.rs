use std::path::PathBuf;

/// Domain failures surfaced to the operator.
///
/// Functions return `anyhow::Result`; callers that need to branch on the kind
/// use `err.downcast_ref::<SwcError>()`.
#[derive(Debug, thiserror::Error)]
pub enum SwcError {
    #[error("The directory {path} does not exist")]
    PathNotFound { path: PathBuf },

    #[error("{path} is not a repository")]
    NotARepository { path: PathBuf },

    #[error("No repository found in {path}")]
    NoRepositoriesFound { path: PathBuf },

    #[error("No apps found")]
    NoAppsConfigured,

    #[error("`{command}` failed: {message}")]
    SubprocessFailure { command: String, message: String },

    #[error("No config file found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config file {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    #[error("Command not found: {alias}")]
    CommandNotFound { alias: String },

    #[error("Git is not installed.")]
    GitNotInstalled,
}

impl SwcError {
    pub fn subprocess(command: impl Into<String>, message: impl Into<String>) -> Self {
        SwcError::SubprocessFailure {
            command: command.into(),
            message: message.into(),
        }
    }

    pub fn invalid_config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        SwcError::InvalidConfig {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Recover the domain error kind from an `anyhow` chain, if there is one.
pub fn kind_of(err: &anyhow::Error) -> Option<&SwcError> {
    err.chain().find_map(|cause| cause.downcast_ref::<SwcError>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_kind_survives_context() {
        let err = Err::<(), _>(SwcError::NoAppsConfigured)
            .context("running backend apps")
            .unwrap_err();

        assert!(matches!(kind_of(&err), Some(SwcError::NoAppsConfigured)));
    }

    #[test]
    fn test_messages() {
        let err = SwcError::PathNotFound {
            path: PathBuf::from("/work"),
        };
        assert_eq!(err.to_string(), "The directory /work does not exist");

        let err = SwcError::subprocess("git checkout dev", "exit code 1");
        assert!(err.to_string().contains("git checkout dev"));
    }
}
