use crate::error::{DeployError, Result};
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_REGION: &str = "nyc1";
pub const DEFAULT_PACKAGE: &str = "sample";
pub const DEFAULT_ACTION: &str = "hello";

// ---------------------------------------------------------------------------
// ActionPath
// ---------------------------------------------------------------------------

/// Qualified `package/action` path the platform invokes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActionPath {
    package: String,
    action: String,
}

impl ActionPath {
    pub fn new(package: impl Into<String>, action: impl Into<String>) -> Result<Self> {
        let package = package.into();
        let action = action.into();
        paths::validate_name(&package)?;
        paths::validate_name(&action)?;
        Ok(Self { package, action })
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

impl Default for ActionPath {
    fn default() -> Self {
        Self {
            package: DEFAULT_PACKAGE.to_string(),
            action: DEFAULT_ACTION.to_string(),
        }
    }
}

impl fmt::Display for ActionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.action)
    }
}

impl FromStr for ActionPath {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((package, action)) if !action.contains('/') => Self::new(package, action),
            _ => Err(DeployError::InvalidActionPath(s.to_string())),
        }
    }
}

impl TryFrom<String> for ActionPath {
    type Error = DeployError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ActionPath> for String {
    fn from(p: ActionPath) -> Self {
        p.to_string()
    }
}

// ---------------------------------------------------------------------------
// DeploymentRequest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    pub artifact: PathBuf,
    pub namespace_label: String,
    pub region: String,
    pub dependencies: Vec<String>,
    pub action: ActionPath,
}

impl DeploymentRequest {
    pub fn new(artifact: impl Into<PathBuf>, namespace_label: impl Into<String>) -> Self {
        Self {
            artifact: artifact.into(),
            namespace_label: namespace_label.into(),
            region: DEFAULT_REGION.to_string(),
            dependencies: Vec::new(),
            action: ActionPath::default(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_action(mut self, action: ActionPath) -> Self {
        self.action = action;
        self
    }

    /// Check everything that can be checked without touching the outside world.
    pub fn validate(&self) -> Result<()> {
        validate_artifact(&self.artifact)?;
        paths::validate_label(&self.namespace_label)?;
        paths::validate_name(&self.region)?;
        self.dependencies.iter().try_for_each(|d| validate_dependency(d))
    }
}

/// Each specifier becomes exactly one manifest line.
fn validate_dependency(spec: &str) -> Result<()> {
    if spec.trim().is_empty() || spec.contains(['\n', '\r']) {
        return Err(DeployError::InvalidDependency(spec.to_string()));
    }
    Ok(())
}

fn validate_artifact(path: &Path) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(DeployError::NotAFile(path.to_path_buf())),
        Err(_) => Err(DeployError::ArtifactNotFound(path.to_path_buf())),
    }
}

// ---------------------------------------------------------------------------
// Namespace
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

// ---------------------------------------------------------------------------
// CommandResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandResult {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// Outcome of the URL lookup. The lookup cannot fail; it degrades to
/// `Unavailable` carrying manual-retrieval instructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Endpoint {
    Resolved(String),
    Unavailable(String),
}

impl Endpoint {
    pub fn url(&self) -> Option<&str> {
        match self {
            Endpoint::Resolved(url) => Some(url),
            Endpoint::Unavailable(_) => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Resolved(url) => f.write_str(url),
            Endpoint::Unavailable(hint) => f.write_str(hint),
        }
    }
}

// ---------------------------------------------------------------------------
// DeploymentOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentOutcome {
    pub namespace_label: String,
    pub namespace_id: String,
    pub action: ActionPath,
    pub endpoint: Endpoint,
    pub project_id: String,
    pub log: String,
    pub deployed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// DeployState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployState {
    Validating,
    NamespaceReady,
    Scaffolded,
    Staged,
    Connected,
    Deployed,
    Resolved,
    Done,
    Failed,
}

impl DeployState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployState::Validating => "validating",
            DeployState::NamespaceReady => "namespace_ready",
            DeployState::Scaffolded => "scaffolded",
            DeployState::Staged => "staged",
            DeployState::Connected => "connected",
            DeployState::Deployed => "deployed",
            DeployState::Resolved => "resolved",
            DeployState::Done => "done",
            DeployState::Failed => "failed",
        }
    }
}

impl fmt::Display for DeployState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn action_path_parses_and_displays() {
        let p: ActionPath = "sample/hello".parse().unwrap();
        assert_eq!(p.package(), "sample");
        assert_eq!(p.action(), "hello");
        assert_eq!(p.to_string(), "sample/hello");
        assert_eq!(p, ActionPath::default());
    }

    #[test]
    fn action_path_rejects_bad_shapes() {
        for bad in ["hello", "a/b/c", "/hello", "sample/", "Sample/hello", "../x"] {
            assert!(bad.parse::<ActionPath>().is_err(), "expected invalid: {bad}");
        }
    }

    #[test]
    fn request_defaults() {
        let req = DeploymentRequest::new("./hello.py", "demo");
        assert_eq!(req.region, "nyc1");
        assert!(req.dependencies.is_empty());
        assert_eq!(req.action.to_string(), "sample/hello");
    }

    #[test]
    fn validate_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let req = DeploymentRequest::new(dir.path().join("missing.py"), "demo");
        assert!(matches!(
            req.validate(),
            Err(DeployError::ArtifactNotFound(_))
        ));
    }

    #[test]
    fn validate_directory_artifact() {
        let dir = TempDir::new().unwrap();
        let req = DeploymentRequest::new(dir.path(), "demo");
        assert!(matches!(req.validate(), Err(DeployError::NotAFile(_))));
    }

    #[test]
    fn validate_bad_label() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("hello.py");
        std::fs::write(&artifact, "def main(args): pass").unwrap();
        let req = DeploymentRequest::new(&artifact, "my namespace");
        assert!(matches!(req.validate(), Err(DeployError::InvalidLabel(_))));
    }

    #[test]
    fn validate_rejects_multiline_or_blank_dependencies() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("hello.py");
        std::fs::write(&artifact, "def main(args): pass").unwrap();

        for bad in ["requests\nflask", "", "   ", "numpy\r"] {
            let req = DeploymentRequest::new(&artifact, "demo")
                .with_dependencies(vec!["pyyaml".into(), bad.into()]);
            assert!(
                matches!(req.validate(), Err(DeployError::InvalidDependency(_))),
                "expected invalid: {bad:?}"
            );
        }

        let ok = DeploymentRequest::new(&artifact, "demo")
            .with_dependencies(vec!["requests==2.31.0".into(), "pandas >= 2.0".into()]);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn endpoint_display_and_url() {
        let ok = Endpoint::Resolved("https://faas.example/api/v1/web/fn-1/sample/hello".into());
        assert_eq!(
            ok.url(),
            Some("https://faas.example/api/v1/web/fn-1/sample/hello")
        );
        let missing = Endpoint::Unavailable("use doctl".into());
        assert_eq!(missing.url(), None);
        assert_eq!(missing.to_string(), "use doctl");
    }
}
