use super::{optional_str, DeployTool, ToolContext};
use crate::cmd::parse_action;
use fndeploy_core::doctl::Doctl;
use fndeploy_core::endpoint::EndpointResolver;

pub struct GetFunctionUrlTool;

impl DeployTool for GetFunctionUrlTool {
    fn name(&self) -> &str {
        "get_function_url"
    }

    fn description(&self) -> &str {
        "Look up the public URL of a deployed action in the connected namespace"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "description": "Action as package/action (default sample/hello)"
                }
            }
        })
    }

    fn call(&self, args: serde_json::Value, ctx: &ToolContext<'_>) -> Result<String, String> {
        let action = parse_action(ctx.config, optional_str(&args, "action")?)
            .map_err(|e| format!("{e:#}"))?;
        let doctl = Doctl::new(ctx.runner, &ctx.config.cli);
        Ok(EndpointResolver::new(&doctl).resolve(&action).to_string())
    }
}
