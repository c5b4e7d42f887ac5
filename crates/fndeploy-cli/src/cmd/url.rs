use crate::cmd::{load_config, parse_action};
use crate::output::print_json;
use fndeploy_core::doctl::Doctl;
use fndeploy_core::endpoint::EndpointResolver;
use fndeploy_core::runner::ProcessRunner;
use std::path::Path;

/// Print the public URL of a deployed action. A failed lookup prints the
/// manual-retrieval hint instead and still succeeds.
pub fn run(config_path: &Path, action: Option<&str>, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let action = parse_action(&config, action)?;
    let runner = ProcessRunner::from_config(&config.cli);
    let doctl = Doctl::new(&runner, &config.cli);
    let endpoint = EndpointResolver::new(&doctl).resolve(&action);

    if json {
        print_json(&serde_json::json!({
            "action": action.to_string(),
            "endpoint": endpoint,
        }))?;
    } else {
        println!("{endpoint}");
    }
    Ok(())
}
