use std::path::Path;

use crate::doctl::Doctl;
use crate::error::{DeployError, Result};

/// Binds the CLI context to a namespace and deploys a project from disk.
pub struct Deployer<'a> {
    doctl: &'a Doctl<'a>,
}

impl<'a> Deployer<'a> {
    pub fn new(doctl: &'a Doctl<'a>) -> Self {
        Self { doctl }
    }

    /// `serverless connect <id>`.
    pub fn connect(&self, namespace_id: &str) -> Result<()> {
        self.doctl
            .connect(namespace_id)
            .map_err(|e| DeployError::Deployment(e.to_string()))?;
        tracing::info!(namespace = %namespace_id, "connected");
        Ok(())
    }

    /// `serverless deploy .` from the project root. Returns the deploy log.
    pub fn push(&self, project_root: &Path) -> Result<String> {
        let log = self
            .doctl
            .deploy(project_root)
            .map_err(|e| DeployError::Deployment(e.to_string()))?;
        tracing::info!(root = %project_root.display(), "deployed");
        Ok(log)
    }

    /// Connect then push.
    pub fn deploy(&self, namespace_id: &str, project_root: &Path) -> Result<String> {
        self.connect(namespace_id)?;
        self.push(project_root)
    }
}
