use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("file not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("invalid namespace label '{0}': must be non-empty and contain no whitespace")]
    InvalidLabel(String),

    #[error("invalid name '{0}': must be lowercase alphanumeric with hyphens or underscores")]
    InvalidName(String),

    #[error("invalid action path '{0}': expected <package>/<action>")]
    InvalidActionPath(String),

    #[error("invalid dependency {0:?}: must be non-empty and fit on one line")]
    InvalidDependency(String),

    #[error("'{0}' not installed or not on PATH: install doctl and run 'doctl auth init'")]
    CliNotInstalled(String),

    #[error("doctl is not authenticated: run 'doctl auth init' ({0})")]
    NotAuthenticated(String),

    #[error("failed to spawn '{command}': {message}")]
    CommandSpawn { command: String, message: String },

    #[error("command failed: {command} (exit {}): {stderr}", .code.map(|c| c.to_string()).unwrap_or_else(|| "signal".into()))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("command timed out after {seconds}s: {command}")]
    CommandTimedOut { command: String, seconds: u64 },

    #[error("unparsable namespace listing at line {line}: '{content}'")]
    UnparsableListing { line: usize, content: String },

    #[error("failed to validate/create namespace '{label}': {source}")]
    NamespaceResolution {
        label: String,
        #[source]
        source: Box<DeployError>,
    },

    #[error("failed to create project: {0}")]
    Scaffold(String),

    #[error("failed to stage artifact: {0}")]
    Staging(String),

    #[error("deployment failed: {0}")]
    Deployment(String),

    #[error("failed to take lock '{key}': {message}")]
    Lock { key: String, message: String },

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl DeployError {
    /// True for failures detected before any remote state was touched.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            DeployError::ArtifactNotFound(_)
                | DeployError::NotAFile(_)
                | DeployError::InvalidLabel(_)
                | DeployError::InvalidName(_)
                | DeployError::InvalidActionPath(_)
                | DeployError::InvalidDependency(_)
                | DeployError::CliNotInstalled(_)
                | DeployError::NotAuthenticated(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
