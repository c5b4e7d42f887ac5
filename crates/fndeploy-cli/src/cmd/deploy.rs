use crate::cmd::{build_request, load_config};
use crate::output::print_json;
use clap::Args;
use fndeploy_core::orchestrator::Orchestrator;
use fndeploy_core::report;
use fndeploy_core::runner::ProcessRunner;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct DeployArgs {
    /// Python source file to deploy as the action's entrypoint
    pub artifact: PathBuf,

    /// Namespace label; created when no namespace matches
    #[arg(long, short = 'n')]
    pub namespace: String,

    /// Region for a newly created namespace (default: config defaults.region)
    #[arg(long)]
    pub region: Option<String>,

    /// Dependency specifier written to requirements.txt (repeatable)
    #[arg(long = "requirement", short = 'r', value_name = "SPEC")]
    pub requirements: Vec<String>,

    /// Target action as package/action (default: config defaults)
    #[arg(long)]
    pub action: Option<String>,
}

pub fn run(config_path: &Path, args: DeployArgs, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let request = build_request(
        &config,
        args.artifact,
        &args.namespace,
        args.region.as_deref(),
        args.requirements,
        args.action.as_deref(),
    )?;

    let runner = ProcessRunner::from_config(&config.cli);
    let result = Orchestrator::new(&config, &runner).deploy(&request);

    if json {
        let outcome = result?;
        print_json(&outcome)?;
        return Ok(());
    }

    println!("{}", report::render(&result));
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.is_precondition() => {
            anyhow::bail!("deployment to '{}' not attempted", request.namespace_label)
        }
        Err(_) => anyhow::bail!("deployment to '{}' failed", request.namespace_label),
    }
}
