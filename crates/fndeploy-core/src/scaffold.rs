//! Ephemeral deployable projects and the guard that removes them.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::ProjectConfig;
use crate::doctl::Doctl;
use crate::error::{DeployError, Result};

// ---------------------------------------------------------------------------
// CleanupGuard
// ---------------------------------------------------------------------------

/// Owns a temporary directory tree and removes it when dropped, whichever
/// way the owning scope is left. Removal errors are logged and swallowed.
#[derive(Debug)]
pub struct CleanupGuard {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl CleanupGuard {
    pub fn new(dir: TempDir) -> Self {
        let path = dir.path().to_path_buf();
        Self {
            dir: Some(dir),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            match dir.close() {
                Ok(()) => tracing::debug!(path = %self.path.display(), "scaffold removed"),
                Err(e) => tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to remove scaffold directory"
                ),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EphemeralProject
// ---------------------------------------------------------------------------

/// A scaffolded project living under a private temp directory. Dropping it
/// removes the whole temp tree.
#[derive(Debug)]
pub struct EphemeralProject {
    id: String,
    root: PathBuf,
    guard: CleanupGuard,
}

impl EphemeralProject {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// `<tmp>/<id>`: the directory deploys run from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The temp directory that will be removed.
    pub fn temp_dir(&self) -> &Path {
        self.guard.path()
    }
}

/// `<prefix><6 hex chars>`, fresh per call.
pub fn generate_project_id(prefix: &str) -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}{}", &hex[..6])
}

// ---------------------------------------------------------------------------
// ProjectScaffolder
// ---------------------------------------------------------------------------

pub struct ProjectScaffolder<'a> {
    doctl: &'a Doctl<'a>,
    config: &'a ProjectConfig,
}

impl<'a> ProjectScaffolder<'a> {
    pub fn new(doctl: &'a Doctl<'a>, config: &'a ProjectConfig) -> Self {
        Self { doctl, config }
    }

    /// Create a temp dir and run `doctl serverless init` inside it. Nothing
    /// is left on disk when this fails.
    pub fn scaffold(&self, project_id: &str) -> Result<EphemeralProject> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&self.config.temp_prefix);
        let tmp = match &self.config.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| DeployError::Scaffold(format!("failed to create temp dir: {e}")))?;

        // From here on the guard removes `tmp` on every early return.
        let guard = CleanupGuard::new(tmp);
        tracing::debug!(path = %guard.path().display(), project_id, "scaffolding");

        self.doctl
            .init(&self.config.language, project_id, guard.path())
            .map_err(|e| DeployError::Scaffold(e.to_string()))?;

        let root = guard.path().join(project_id);
        if !root.is_dir() {
            return Err(DeployError::Scaffold(format!(
                "init did not create {}",
                root.display()
            )));
        }

        Ok(EphemeralProject {
            id: project_id.to_string(),
            root,
            guard,
        })
    }
}
