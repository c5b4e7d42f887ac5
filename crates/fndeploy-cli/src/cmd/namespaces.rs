use crate::cmd::load_config;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use fndeploy_core::doctl::Doctl;
use fndeploy_core::namespace::NamespaceResolver;
use fndeploy_core::runner::ProcessRunner;
use std::path::Path;

#[derive(Subcommand)]
pub enum NamespacesSubcommand {
    /// List the functions namespaces visible to the current doctl context
    List,
}

pub fn run(config_path: &Path, subcmd: NamespacesSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        NamespacesSubcommand::List => list(config_path, json),
    }
}

fn list(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let runner = ProcessRunner::from_config(&config.cli);
    let doctl = Doctl::new(&runner, &config.cli);
    let namespaces = NamespaceResolver::new(&doctl)
        .list()
        .context("failed to list namespaces")?;

    if json {
        print_json(&namespaces)?;
        return Ok(());
    }

    if namespaces.is_empty() {
        println!("No namespaces.");
        return Ok(());
    }

    let rows = namespaces
        .iter()
        .map(|ns| {
            vec![
                ns.id.clone(),
                ns.label.clone(),
                ns.region.clone().unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(&["ID", "LABEL", "REGION"], rows);
    Ok(())
}
