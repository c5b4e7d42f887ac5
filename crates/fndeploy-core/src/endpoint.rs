use crate::doctl::Doctl;
use crate::types::{ActionPath, Endpoint};

/// Best-effort lookup of a deployed action's public URL.
pub struct EndpointResolver<'a> {
    doctl: &'a Doctl<'a>,
}

impl<'a> EndpointResolver<'a> {
    pub fn new(doctl: &'a Doctl<'a>) -> Self {
        Self { doctl }
    }

    pub fn resolve(&self, action: &ActionPath) -> Endpoint {
        let path = action.to_string();
        match self.doctl.function_url(&path) {
            Ok(url) if !url.is_empty() => Endpoint::Resolved(url),
            Ok(_) => {
                tracing::warn!(action = %path, "url lookup returned nothing");
                Endpoint::Unavailable(placeholder(&path))
            }
            Err(e) => {
                tracing::warn!(action = %path, error = %e, "url lookup failed");
                Endpoint::Unavailable(placeholder(&path))
            }
        }
    }
}

pub fn placeholder(action_path: &str) -> String {
    format!(
        "URL not available - please use 'doctl serverless fn get {action_path} --url' to get the function URL"
    )
}
