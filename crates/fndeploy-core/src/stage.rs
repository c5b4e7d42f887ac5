use std::path::{Path, PathBuf};

use crate::config::ProjectConfig;
use crate::error::{DeployError, Result};
use crate::io;
use crate::paths;
use crate::types::ActionPath;

/// Copies the caller's artifact (and optional dependency manifest) into the
/// scaffold at `packages/<package>/<action>/`.
pub struct ArtifactStager<'a> {
    config: &'a ProjectConfig,
}

impl<'a> ArtifactStager<'a> {
    pub fn new(config: &'a ProjectConfig) -> Self {
        Self { config }
    }

    /// Returns the action directory the files were written to.
    pub fn stage(
        &self,
        project_root: &Path,
        artifact: &Path,
        dependencies: &[String],
        action: &ActionPath,
    ) -> Result<PathBuf> {
        let target = paths::action_dir(project_root, action.package(), action.action());
        self.stage_into(&target, artifact, dependencies)
            .map_err(|e| DeployError::Staging(format!("{}: {e}", target.display())))?;
        tracing::debug!(
            target = %target.display(),
            dependencies = dependencies.len(),
            "artifact staged"
        );
        Ok(target)
    }

    fn stage_into(&self, target: &Path, artifact: &Path, dependencies: &[String]) -> Result<()> {
        io::ensure_dir(target)?;
        io::copy_file(artifact, &target.join(&self.config.entrypoint))?;
        if !dependencies.is_empty() {
            io::write_lines(&target.join(&self.config.manifest), dependencies)?;
        }
        Ok(())
    }
}
