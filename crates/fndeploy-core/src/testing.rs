//! In-memory stand-in for the doctl CLI used by unit tests. Available to
//! dependent crates with the `test-support` feature.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::Result;
use crate::runner::CommandRunner;
use crate::types::{CommandResult, Namespace};

#[derive(Debug, Clone)]
pub struct Call {
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl Call {
    pub fn line(&self) -> String {
        self.args.join(" ")
    }
}

/// Simulates the subset of doctl the pipeline uses. Namespaces live in
/// memory; `init` creates a real project directory in the given cwd.
pub struct FakeDoctl {
    namespaces: Mutex<Vec<Namespace>>,
    calls: Mutex<Vec<Call>>,
    failing: HashSet<&'static str>,
    listing_override: Option<String>,
    create_output: Option<String>,
    url: String,
}

impl Default for FakeDoctl {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDoctl {
    pub fn new() -> Self {
        Self {
            namespaces: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            failing: HashSet::new(),
            listing_override: None,
            create_output: None,
            url: "https://faas-nyc1-2ef2e6cc.doserverless.co/api/v1/web".to_string(),
        }
    }

    pub fn with_namespace(self, id: &str, label: &str) -> Self {
        self.namespaces
            .lock()
            .unwrap()
            .push(Namespace {
                id: id.to_string(),
                label: label.to_string(),
                region: None,
            });
        self
    }

    /// Make the named step fail: `account`, `install`, `list`, `create`,
    /// `init`, `connect`, `deploy`, `url`.
    pub fn failing(mut self, step: &'static str) -> Self {
        self.failing.insert(step);
        self
    }

    pub fn with_listing(mut self, raw: &str) -> Self {
        self.listing_override = Some(raw.to_string());
        self
    }

    /// Replace what `namespaces create` prints (the namespace is still added).
    pub fn with_create_output(mut self, raw: &str) -> Self {
        self.create_output = Some(raw.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_lines(&self) -> Vec<String> {
        self.calls().iter().map(Call::line).collect()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.call_lines()
            .iter()
            .filter(|l| l.starts_with(prefix))
            .count()
    }

    pub fn namespaces(&self) -> Vec<Namespace> {
        self.namespaces.lock().unwrap().clone()
    }

    fn listing(&self) -> String {
        if let Some(raw) = &self.listing_override {
            return raw.clone();
        }
        let mut out = String::from("ID                                      Label\n");
        for ns in self.namespaces.lock().unwrap().iter() {
            out.push_str(&format!("{:<40}{}\n", ns.id, ns.label));
        }
        out
    }

    fn step(&self, args: &[String]) -> &'static str {
        let a: Vec<&str> = args.iter().map(String::as_str).collect();
        match a.as_slice() {
            ["account", "get", ..] => "account",
            ["serverless", "install", ..] => "install",
            ["serverless", "namespaces", "list", ..] => "list",
            ["serverless", "namespaces", "create", ..] => "create",
            ["serverless", "init", ..] => "init",
            ["serverless", "connect", ..] => "connect",
            ["serverless", "deploy", ..] => "deploy",
            ["serverless", "fn", "get", ..] => "url",
            _ => "unknown",
        }
    }
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

impl CommandRunner for FakeDoctl {
    fn program(&self) -> &str {
        "doctl"
    }

    fn exec(&self, args: &[String], cwd: Option<&Path>) -> Result<CommandResult> {
        self.calls.lock().unwrap().push(Call {
            args: args.to_vec(),
            cwd: cwd.map(Path::to_path_buf),
        });

        let step = self.step(args);
        if self.failing.contains(step) {
            return Ok(CommandResult::failed(1, format!("Error: simulated {step} failure")));
        }

        let result = match step {
            "account" => CommandResult::ok("Email  Droplet Limit  Status\nme@example.com  25  active"),
            "install" => CommandResult::ok("Serverless support is already installed"),
            "list" => CommandResult::ok(self.listing()),
            "create" => {
                let label = flag(args, "--label").unwrap_or("unnamed").to_string();
                let region = flag(args, "--region").map(str::to_string);
                let id = format!("fn-{}", uuid::Uuid::new_v4());
                self.namespaces.lock().unwrap().push(Namespace {
                    id: id.clone(),
                    label: label.clone(),
                    region,
                });
                let out = self
                    .create_output
                    .clone()
                    .unwrap_or_else(|| format!("ID    Label\n{id}    {label}\n"));
                CommandResult::ok(out)
            }
            "init" => {
                let name = args.get(4).cloned().unwrap_or_default();
                let dir = cwd.unwrap_or(Path::new(".")).join(&name);
                std::fs::create_dir_all(dir.join("packages/sample/hello"))?;
                std::fs::write(dir.join("project.yml"), "packages:\n  - name: sample\n")?;
                CommandResult::ok(format!("A local sandbox area '{name}' was created for you."))
            }
            "connect" => CommandResult::ok("Connected to functions namespace"),
            "deploy" => CommandResult::ok(
                "Deploying '.'\n  to namespace 'fn-x'\nDeployment status recorded in '.deployed'\n\nDeployed functions:\n  - sample/hello",
            ),
            "url" => {
                let path = args.get(3).cloned().unwrap_or_default();
                CommandResult::ok(format!("{}/{path}", self.url))
            }
            _ => CommandResult::failed(127, "unknown command"),
        };
        Ok(result)
    }
}
