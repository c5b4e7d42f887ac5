//! Human-readable reports for the caller boundary. A run renders to exactly
//! one of a success report or a failure message.

use crate::error::{DeployError, Result};
use crate::types::DeploymentOutcome;

pub fn render(result: &Result<DeploymentOutcome>) -> String {
    match result {
        Ok(outcome) => render_success(outcome),
        Err(e) => render_failure(e),
    }
}

pub fn render_success(outcome: &DeploymentOutcome) -> String {
    let mut out = format!(
        "✅ Function deployed successfully!\n\
         \n\
         Deployment Details:\n\
         ------------------\n\
         Namespace: {}\n\
         Function: {}\n\
         Function URL: {}\n\
         \n\
         Deployment Output:\n\
         -----------------\n\
         {}\n",
        outcome.namespace_label, outcome.action, outcome.endpoint, outcome.log
    );
    if let Some(url) = outcome.endpoint.url() {
        out.push_str(&format!(
            "\nTo invoke your function:\n\
             curl -X POST {url} -H \"Content-Type: application/json\" -d '{{\"name\": \"YourName\"}}'\n"
        ));
    }
    out
}

pub fn render_failure(err: &DeployError) -> String {
    match err {
        DeployError::ArtifactNotFound(path) => format!("❌ File not found: {}", path.display()),
        DeployError::CliNotInstalled(_) | DeployError::NotAuthenticated(_) => {
            "❌ Error: doctl not installed or not authenticated. Please install doctl and authenticate with 'doctl auth init'".to_string()
        }
        DeployError::NamespaceResolution { .. } => format!("❌ Error with namespace: {err}"),
        DeployError::Scaffold(_) => format!("❌ Error creating project: {err}"),
        DeployError::Staging(_) | DeployError::Deployment(_) | DeployError::Lock { .. } => {
            format!("❌ Error during deployment: {err}")
        }
        other => format!("❌ Error: {other}"),
    }
}
