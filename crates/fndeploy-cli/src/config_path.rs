use std::path::{Path, PathBuf};

use anyhow::Context;
use fndeploy_core::paths;

/// Resolve the config file location.
///
/// Priority:
/// 1. `--config` flag / `FNDEPLOY_CONFIG` env var (passed in as `explicit`)
/// 2. `~/.config/fndeploy/config.yaml`
///
/// The file does not have to exist; missing config means built-in defaults.
pub fn resolve_config_path(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }
    paths::default_config_path().context("cannot locate default config; pass --config")
}
