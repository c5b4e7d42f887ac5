use crate::error::Result;
use crate::paths;
use crate::types::{ActionPath, DEFAULT_ACTION, DEFAULT_PACKAGE, DEFAULT_REGION};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// CliConfig
// ---------------------------------------------------------------------------

/// How the external deployment CLI is invoked. Credentials stay in the
/// CLI's own context; only the context name is carried here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Passed as `--context <name>` on every invocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Extra environment variables for every invocation.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

fn default_binary() -> String {
    "doctl".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            context: None,
            env: BTreeMap::new(),
            timeout_seconds: None,
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_entrypoint")]
    pub entrypoint: String,
    #[serde(default = "default_manifest")]
    pub manifest: String,
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
    #[serde(default = "default_temp_prefix")]
    pub temp_prefix: String,
    /// Parent for scaffold directories (default: system temp dir).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_root: Option<PathBuf>,
}

fn default_language() -> String {
    "python".to_string()
}

fn default_entrypoint() -> String {
    "__main__.py".to_string()
}

fn default_manifest() -> String {
    "requirements.txt".to_string()
}

fn default_id_prefix() -> String {
    "mcp-func-".to_string()
}

fn default_temp_prefix() -> String {
    "doctl-serverless-".to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            entrypoint: default_entrypoint(),
            manifest: default_manifest(),
            id_prefix: default_id_prefix(),
            temp_prefix: default_temp_prefix(),
            temp_root: None,
        }
    }
}

// ---------------------------------------------------------------------------
// DefaultsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_package")]
    pub package: String,
    #[serde(default = "default_action")]
    pub action: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_package() -> String {
    DEFAULT_PACKAGE.to_string()
}

fn default_action() -> String {
    DEFAULT_ACTION.to_string()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            package: default_package(),
            action: default_action(),
        }
    }
}

// ---------------------------------------------------------------------------
// DeployConfig (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub cli: CliConfig,
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_dir: Option<PathBuf>,
}

fn default_version() -> u32 {
    1
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            cli: CliConfig::default(),
            project: ProjectConfig::default(),
            defaults: DefaultsConfig::default(),
            lock_dir: None,
        }
    }
}

impl DeployConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: DeployConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load `path` if it exists, otherwise fall back to built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    pub fn lock_dir(&self) -> PathBuf {
        self.lock_dir.clone().unwrap_or_else(paths::default_lock_dir)
    }

    /// Action deployed when the caller does not name one.
    pub fn default_action(&self) -> Result<ActionPath> {
        ActionPath::new(&self.defaults.package, &self.defaults.action)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.cli.binary.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "cli.binary is empty".to_string(),
            });
        } else if which::which(&self.cli.binary).is_err() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("cli.binary '{}' not found on PATH", self.cli.binary),
            });
        }

        if self.cli.timeout_seconds == Some(0) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "cli.timeout_seconds is 0; every command would time out".to_string(),
            });
        }

        for (field, value) in [
            ("project.entrypoint", &self.project.entrypoint),
            ("project.manifest", &self.project.manifest),
        ] {
            if value.trim().is_empty() || value.contains('/') || value.contains('\\') {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("{field} must be a plain file name, got '{value}'"),
                });
            }
        }

        for (field, value) in [
            ("defaults.package", &self.defaults.package),
            ("defaults.action", &self.defaults.action),
            ("defaults.region", &self.defaults.region),
        ] {
            if paths::validate_name(value).is_err() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("{field} '{value}' is not a valid name"),
                });
            }
        }

        if let Some(root) = &self.project.temp_root {
            if !root.is_dir() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "project.temp_root '{}' does not exist; scaffolding will fail",
                        root.display()
                    ),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
