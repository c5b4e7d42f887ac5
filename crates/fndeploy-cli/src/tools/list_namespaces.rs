use super::{DeployTool, ToolContext};
use fndeploy_core::doctl::Doctl;
use fndeploy_core::namespace::NamespaceResolver;

pub struct ListNamespacesTool;

impl DeployTool for ListNamespacesTool {
    fn name(&self) -> &str {
        "list_namespaces"
    }

    fn description(&self) -> &str {
        "List the functions namespaces available to the configured doctl context"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    fn call(&self, _args: serde_json::Value, ctx: &ToolContext<'_>) -> Result<String, String> {
        let doctl = Doctl::new(ctx.runner, &ctx.config.cli);
        let namespaces = NamespaceResolver::new(&doctl)
            .list()
            .map_err(|e| e.to_string())?;
        serde_json::to_string_pretty(&namespaces).map_err(|e| e.to_string())
    }
}
