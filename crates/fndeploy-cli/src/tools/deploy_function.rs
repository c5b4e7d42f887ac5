use super::{aliased, optional_str, required_str, DeployTool, ToolContext};
use crate::cmd::build_request;
use fndeploy_core::orchestrator::Orchestrator;
use fndeploy_core::report;
use std::path::PathBuf;

pub struct DeployFunctionTool;

const FILE_KEYS: &[&str] = &["python_file", "file_path"];
const NAMESPACE_KEYS: &[&str] = &["namespace", "namespace_label"];
const REQUIREMENTS_KEYS: &[&str] = &["requirements", "dependencies"];

impl DeployTool for DeployFunctionTool {
    fn name(&self) -> &str {
        "deploy_function"
    }

    fn description(&self) -> &str {
        "Deploy a Python function to DigitalOcean Functions and return its URL"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "python_file": {
                    "type": "string",
                    "description": "Path to the Python file to deploy (alias: file_path)"
                },
                "namespace": {
                    "type": "string",
                    "description": "Label of the functions namespace; created if missing (alias: namespace_label)"
                },
                "region": {
                    "type": "string",
                    "description": "Region for a new namespace (default nyc1)"
                },
                "requirements": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Requirement specifiers, e.g. requests==2.31.0 (alias: dependencies)"
                },
                "action": {
                    "type": "string",
                    "description": "Target as package/action (default sample/hello)"
                }
            },
            "required": ["python_file", "namespace"]
        })
    }

    fn call(&self, args: serde_json::Value, ctx: &ToolContext<'_>) -> Result<String, String> {
        let file_key = aliased(&args, FILE_KEYS).unwrap_or(FILE_KEYS[0]);
        let namespace_key = aliased(&args, NAMESPACE_KEYS).unwrap_or(NAMESPACE_KEYS[0]);
        let file_path = required_str(&args, file_key)?;
        let label = required_str(&args, namespace_key)?;
        let region = optional_str(&args, "region")?;
        let action = optional_str(&args, "action")?;
        let dependencies = dependencies(&args)?;

        let request = build_request(
            ctx.config,
            PathBuf::from(file_path),
            label,
            region,
            dependencies,
            action,
        )
        .map_err(|e| format!("{e:#}"))?;

        let result = Orchestrator::new(ctx.config, ctx.runner).deploy(&request);
        let text = report::render(&result);
        match result {
            Ok(_) => Ok(text),
            Err(_) => Err(text),
        }
    }
}

fn dependencies(args: &serde_json::Value) -> Result<Vec<String>, String> {
    let Some(key) = aliased(args, REQUIREMENTS_KEYS) else {
        return Ok(Vec::new());
    };
    match &args[key] {
        serde_json::Value::Array(items) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| format!("{key} must be strings"))
            })
            .collect(),
        _ => Err(format!("{key} must be an array of strings")),
    }
}
