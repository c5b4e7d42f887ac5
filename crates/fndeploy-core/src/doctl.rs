//! The `doctl` commands the pipeline issues, as argument vectors.

use std::path::Path;

use crate::config::CliConfig;
use crate::error::Result;
use crate::runner::CommandRunner;

/// Column selection for namespace listings; the parser in
/// [`crate::namespace`] depends on this order.
pub const NAMESPACE_FORMAT: &str = "ID,Label";

pub struct Doctl<'a> {
    runner: &'a dyn CommandRunner,
    context: Option<&'a str>,
}

impl<'a> Doctl<'a> {
    pub fn new(runner: &'a dyn CommandRunner, cli: &'a CliConfig) -> Self {
        Self {
            runner,
            context: cli.context.as_deref(),
        }
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner
    }

    fn args(&self, parts: &[&str]) -> Vec<String> {
        let mut args: Vec<String> = parts.iter().map(|s| s.to_string()).collect();
        if let Some(ctx) = self.context {
            args.push("--context".to_string());
            args.push(ctx.to_string());
        }
        args
    }

    pub fn account_get_args(&self) -> Vec<String> {
        self.args(&["account", "get"])
    }

    pub fn serverless_install_args(&self) -> Vec<String> {
        self.args(&["serverless", "install"])
    }

    pub fn list_namespaces_args(&self) -> Vec<String> {
        self.args(&["serverless", "namespaces", "list", "--format", NAMESPACE_FORMAT])
    }

    pub fn create_namespace_args(&self, label: &str, region: &str) -> Vec<String> {
        self.args(&[
            "serverless",
            "namespaces",
            "create",
            "--label",
            label,
            "--region",
            region,
            "--format",
            NAMESPACE_FORMAT,
        ])
    }

    pub fn init_args(&self, language: &str, project_id: &str) -> Vec<String> {
        self.args(&["serverless", "init", "--language", language, project_id])
    }

    pub fn connect_args(&self, namespace_id: &str) -> Vec<String> {
        self.args(&["serverless", "connect", namespace_id])
    }

    pub fn deploy_args(&self) -> Vec<String> {
        self.args(&["serverless", "deploy", "."])
    }

    pub fn function_url_args(&self, action_path: &str) -> Vec<String> {
        self.args(&["serverless", "fn", "get", action_path, "--url"])
    }

    // -----------------------------------------------------------------------
    // Invocations
    // -----------------------------------------------------------------------

    pub fn account_get(&self) -> Result<String> {
        self.runner.run(&self.account_get_args(), None)
    }

    pub fn serverless_install(&self) -> Result<String> {
        self.runner.run(&self.serverless_install_args(), None)
    }

    pub fn list_namespaces(&self) -> Result<String> {
        self.runner.run(&self.list_namespaces_args(), None)
    }

    pub fn create_namespace(&self, label: &str, region: &str) -> Result<String> {
        self.runner
            .run(&self.create_namespace_args(label, region), None)
    }

    pub fn init(&self, language: &str, project_id: &str, cwd: &Path) -> Result<String> {
        self.runner
            .run(&self.init_args(language, project_id), Some(cwd))
    }

    pub fn connect(&self, namespace_id: &str) -> Result<String> {
        self.runner.run(&self.connect_args(namespace_id), None)
    }

    pub fn deploy(&self, project_root: &Path) -> Result<String> {
        self.runner.run(&self.deploy_args(), Some(project_root))
    }

    pub fn function_url(&self, action_path: &str) -> Result<String> {
        self.runner.run(&self.function_url_args(action_path), None)
    }
}
