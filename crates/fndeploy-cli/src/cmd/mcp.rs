use crate::cmd::load_config;
use crate::tools::{self, ToolContext};
use fndeploy_core::runner::ProcessRunner;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, Write};
use std::path::Path;

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 protocol types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ToolContent {
    r#type: &'static str,
    text: String,
}

#[derive(Debug, Serialize)]
struct ToolCallResult {
    content: Vec<ToolContent>,
    #[serde(rename = "isError")]
    is_error: bool,
}

impl JsonRpcResponse {
    fn ok(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError { code, message }),
        }
    }
}

// ---------------------------------------------------------------------------
// Server loop
// ---------------------------------------------------------------------------

pub fn run(config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let runner = ProcessRunner::from_config(&config.cli);
    let ctx = ToolContext {
        config: &config,
        runner: &runner,
    };
    let tools = tools::all_tools();
    tracing::info!(config = %config_path.display(), tools = tools.len(), "mcp server ready");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let raw: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                let resp = JsonRpcResponse::err(None, -32700, format!("parse error: {e}"));
                write_response(&mut stdout.lock(), &resp)?;
                continue;
            }
        };

        // Notifications carry no id and get no response.
        if !raw
            .as_object()
            .map(|o| o.contains_key("id"))
            .unwrap_or(false)
        {
            continue;
        }

        let request: JsonRpcRequest = match serde_json::from_value(raw) {
            Ok(r) => r,
            Err(e) => {
                let resp = JsonRpcResponse::err(None, -32600, format!("invalid request: {e}"));
                write_response(&mut stdout.lock(), &resp)?;
                continue;
            }
        };

        let response = handle_request(&request, &tools, &ctx);
        write_response(&mut stdout.lock(), &response)?;
    }

    Ok(())
}

fn write_response(out: &mut impl Write, resp: &JsonRpcResponse) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, resp)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Request dispatch (pub for unit tests)
// ---------------------------------------------------------------------------

pub fn handle_request(
    req: &JsonRpcRequest,
    tools: &[Box<dyn tools::DeployTool>],
    ctx: &ToolContext<'_>,
) -> JsonRpcResponse {
    match req.method.as_str() {
        "initialize" => JsonRpcResponse::ok(
            req.id.clone(),
            serde_json::json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "fndeploy",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        ),

        "tools/list" => {
            let tool_list: Vec<Value> = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "name": t.name(),
                        "description": t.description(),
                        "inputSchema": t.schema()
                    })
                })
                .collect();
            JsonRpcResponse::ok(req.id.clone(), serde_json::json!({ "tools": tool_list }))
        }

        "tools/call" => {
            let Some(params) = &req.params else {
                return JsonRpcResponse::err(req.id.clone(), -32602, "missing params".to_string());
            };

            let Some(tool_name) = params["name"].as_str() else {
                return JsonRpcResponse::err(
                    req.id.clone(),
                    -32602,
                    "missing tool name in params".to_string(),
                );
            };

            let args = params.get("arguments").cloned().unwrap_or(Value::Null);

            match tools.iter().find(|t| t.name() == tool_name) {
                None => JsonRpcResponse::err(
                    req.id.clone(),
                    -32601,
                    format!("tool not found: {tool_name}"),
                ),
                Some(tool) => {
                    tracing::info!(tool = tool_name, "tool call");
                    let (text, is_error) = match tool.call(args, ctx) {
                        Ok(text) => (text, false),
                        Err(text) => (text, true),
                    };

                    let call_result = ToolCallResult {
                        content: vec![ToolContent {
                            r#type: "text",
                            text,
                        }],
                        is_error,
                    };

                    JsonRpcResponse::ok(
                        req.id.clone(),
                        serde_json::to_value(&call_result)
                            .unwrap_or_else(|e| serde_json::json!({"error": e.to_string()})),
                    )
                }
            }
        }

        other => JsonRpcResponse::err(
            req.id.clone(),
            -32601,
            format!("method not found: {other}"),
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
