pub mod config;
pub mod deploy;
pub mod mcp;
pub mod namespaces;
pub mod url;

use std::path::{Path, PathBuf};

use anyhow::Context;
use fndeploy_core::config::DeployConfig;
use fndeploy_core::types::{ActionPath, DeploymentRequest};

pub fn load_config(path: &Path) -> anyhow::Result<DeployConfig> {
    DeployConfig::load_or_default(path)
        .with_context(|| format!("failed to load config {}", path.display()))
}

/// Build a request, filling region and action from the config defaults.
pub fn build_request(
    config: &DeployConfig,
    artifact: PathBuf,
    namespace_label: &str,
    region: Option<&str>,
    dependencies: Vec<String>,
    action: Option<&str>,
) -> anyhow::Result<DeploymentRequest> {
    let action = parse_action(config, action)?;
    Ok(DeploymentRequest::new(artifact, namespace_label)
        .with_region(region.unwrap_or(&config.defaults.region))
        .with_dependencies(dependencies)
        .with_action(action))
}

pub fn parse_action(config: &DeployConfig, action: Option<&str>) -> anyhow::Result<ActionPath> {
    match action {
        Some(raw) => raw
            .parse::<ActionPath>()
            .with_context(|| format!("invalid action path '{raw}'")),
        None => config
            .default_action()
            .context("config defaults name an invalid action"),
    }
}
