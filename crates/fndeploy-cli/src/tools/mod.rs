use fndeploy_core::config::DeployConfig;
use fndeploy_core::runner::CommandRunner;

pub mod deploy_function;
pub mod get_function_url;
pub mod list_namespaces;

/// What every tool call gets: the loaded config and the runner that
/// reaches doctl.
pub struct ToolContext<'a> {
    pub config: &'a DeployConfig,
    pub runner: &'a dyn CommandRunner,
}

pub trait DeployTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn schema(&self) -> serde_json::Value;
    /// Returns the text shown to the client; `Err` marks the result `isError`.
    fn call(&self, args: serde_json::Value, ctx: &ToolContext<'_>) -> Result<String, String>;
}

pub fn all_tools() -> Vec<Box<dyn DeployTool>> {
    vec![
        Box::new(deploy_function::DeployFunctionTool),
        Box::new(list_namespaces::ListNamespacesTool),
        Box::new(get_function_url::GetFunctionUrlTool),
    ]
}

fn optional_str<'a>(args: &'a serde_json::Value, key: &str) -> Result<Option<&'a str>, String> {
    match args.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_str()
            .map(Some)
            .ok_or_else(|| format!("argument '{key}' must be a string")),
    }
}

fn required_str<'a>(args: &'a serde_json::Value, key: &str) -> Result<&'a str, String> {
    optional_str(args, key)?.ok_or_else(|| format!("missing required argument: {key}"))
}

/// The first of `keys` that carries a value. Later keys are older aliases.
fn aliased(args: &serde_json::Value, keys: &[&'static str]) -> Option<&'static str> {
    keys.iter()
        .copied()
        .find(|key| !matches!(args.get(*key), None | Some(serde_json::Value::Null)))
}
