//! End-to-end deployment pipeline.
//!
//! ```text
//! Validating -> NamespaceReady -> Scaffolded -> Staged -> Connected
//!            -> Deployed -> Resolved -> Done
//! ```
//!
//! Any state may fall through to `Failed`. Validation happens before the
//! first external call. From `Scaffolded` on the scaffold is owned by an
//! [`EphemeralProject`](crate::scaffold::EphemeralProject) local to the
//! pipeline, so its directory is gone before `Done` or `Failed` is reported.

use chrono::Utc;

use crate::config::{CliConfig, DeployConfig};
use crate::deployer::Deployer;
use crate::doctl::Doctl;
use crate::endpoint::EndpointResolver;
use crate::error::{DeployError, Result};
use crate::lock::NamespaceLock;
use crate::namespace::NamespaceResolver;
use crate::report;
use crate::runner::CommandRunner;
use crate::scaffold::{generate_project_id, ProjectScaffolder};
use crate::stage::ArtifactStager;
use crate::types::{DeployState, DeploymentOutcome, DeploymentRequest};

pub struct Orchestrator<'a> {
    config: &'a DeployConfig,
    runner: &'a dyn CommandRunner,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a DeployConfig, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    /// Run the pipeline and render the result as a single report.
    pub fn deploy_function(&self, request: &DeploymentRequest) -> String {
        report::render(&self.deploy(request))
    }

    pub fn deploy(&self, request: &DeploymentRequest) -> Result<DeploymentOutcome> {
        self.deploy_observed(request, &mut |_| {})
    }

    /// Like [`deploy`](Self::deploy), reporting every state entered.
    pub fn deploy_observed(
        &self,
        request: &DeploymentRequest,
        observe: &mut dyn FnMut(DeployState),
    ) -> Result<DeploymentOutcome> {
        let mut enter = |state: DeployState| {
            tracing::debug!(state = %state, label = %request.namespace_label, "enter");
            observe(state);
        };

        let result = self.pipeline(request, &mut enter);
        match &result {
            Ok(outcome) => {
                tracing::info!(
                    namespace = %outcome.namespace_id,
                    action = %outcome.action,
                    "deployment done"
                );
                enter(DeployState::Done);
            }
            Err(e) => {
                tracing::warn!(label = %request.namespace_label, error = %e, "deployment failed");
                enter(DeployState::Failed);
            }
        }
        result
    }

    /// `account get` must succeed; `serverless install` is attempted once and
    /// its failure only logged.
    pub fn check_preconditions(&self, doctl: &Doctl<'_>) -> Result<()> {
        match doctl.account_get() {
            Ok(_) => {}
            Err(DeployError::CommandSpawn { .. }) => {
                return Err(DeployError::CliNotInstalled(self.config.cli.binary.clone()));
            }
            Err(DeployError::CommandFailed { stderr, .. }) => {
                return Err(DeployError::NotAuthenticated(stderr));
            }
            Err(e) => return Err(e),
        }
        if let Err(e) = doctl.serverless_install() {
            tracing::warn!(error = %e, "serverless install failed; continuing");
        }
        Ok(())
    }

    fn pipeline(
        &self,
        request: &DeploymentRequest,
        enter: &mut dyn FnMut(DeployState),
    ) -> Result<DeploymentOutcome> {
        enter(DeployState::Validating);
        request.validate()?;

        let doctl = Doctl::new(self.runner, &self.config.cli);
        self.check_preconditions(&doctl)?;

        let lock_dir = self.config.lock_dir();
        let namespace = {
            let _label_lock =
                NamespaceLock::acquire(&lock_dir, &format!("label-{}", request.namespace_label))?;
            NamespaceResolver::new(&doctl).resolve(&request.namespace_label, &request.region)?
        };
        enter(DeployState::NamespaceReady);

        let project_id = generate_project_id(&self.config.project.id_prefix);
        let project = ProjectScaffolder::new(&doctl, &self.config.project).scaffold(&project_id)?;
        tracing::info!(project_id, dir = %project.temp_dir().display(), "scaffolded");
        enter(DeployState::Scaffolded);

        ArtifactStager::new(&self.config.project).stage(
            project.root(),
            &request.artifact,
            &request.dependencies,
            &request.action,
        )?;
        enter(DeployState::Staged);

        // `connect` rebinds the CLI context that `deploy` and `fn get` read,
        // so the three must not interleave with another run on that context.
        let _context_lock = NamespaceLock::acquire(&lock_dir, &context_lock_key(&self.config.cli))?;
        let deployer = Deployer::new(&doctl);
        deployer.connect(&namespace.id)?;
        enter(DeployState::Connected);

        let log = deployer.push(project.root())?;
        enter(DeployState::Deployed);

        let endpoint = EndpointResolver::new(&doctl).resolve(&request.action);
        enter(DeployState::Resolved);

        Ok(DeploymentOutcome {
            namespace_label: request.namespace_label.clone(),
            namespace_id: namespace.id,
            action: request.action.clone(),
            endpoint,
            project_id: project.id().to_string(),
            log,
            deployed_at: Utc::now(),
        })
    }
}

/// Lock key for the doctl context a run connects through.
fn context_lock_key(cli: &CliConfig) -> String {
    format!("ctx-{}", cli.context.as_deref().unwrap_or("default"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDoctl;
    use crate::types::{ActionPath, Endpoint};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        scratch: PathBuf,
        artifact: PathBuf,
        config: DeployConfig,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let scratch = dir.path().join("scratch");
        std::fs::create_dir_all(&scratch).unwrap();
        let artifact = dir.path().join("hello.py");
        std::fs::write(
            &artifact,
            "def main(params):\n    return {\"statusCode\": 200, \"body\": \"hi\"}\n",
        )
        .unwrap();
        let mut config = DeployConfig::default();
        config.project.temp_root = Some(scratch.clone());
        config.lock_dir = Some(dir.path().join("locks"));
        Fixture {
            _dir: dir,
            scratch,
            artifact,
            config,
        }
    }

    fn is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    fn run(fx: &Fixture, fake: &FakeDoctl, req: &DeploymentRequest) -> (Result<DeploymentOutcome>, Vec<DeployState>) {
        let mut states = Vec::new();
        let result = Orchestrator::new(&fx.config, fake).deploy_observed(req, &mut |s| states.push(s));
        (result, states)
    }

    #[test]
    fn end_to_end_creates_namespace_and_cleans_up() {
        let fx = fixture();
        let fake = FakeDoctl::new();
        let req = DeploymentRequest::new(&fx.artifact, "demo");

        let (result, states) = run(&fx, &fake, &req);
        let outcome = result.unwrap();

        assert_eq!(
            states,
            [
                DeployState::Validating,
                DeployState::NamespaceReady,
                DeployState::Scaffolded,
                DeployState::Staged,
                DeployState::Connected,
                DeployState::Deployed,
                DeployState::Resolved,
                DeployState::Done,
            ]
        );
        assert_eq!(outcome.namespace_label, "demo");
        assert_eq!(outcome.namespace_id, fake.namespaces()[0].id);
        assert_eq!(outcome.action.to_string(), "sample/hello");
        assert!(outcome.endpoint.url().unwrap().ends_with("/sample/hello"));
        assert!(outcome.log.contains("Deployed functions"));
        assert!(outcome.project_id.starts_with("mcp-func-"));

        let lines = fake.call_lines();
        assert_eq!(lines[0], "account get");
        assert_eq!(lines[1], "serverless install");
        assert_eq!(lines[2], "serverless namespaces list --format ID,Label");
        assert!(lines[3].starts_with("serverless namespaces create --label demo --region nyc1"));
        assert!(lines[4].starts_with("serverless init --language python mcp-func-"));
        assert_eq!(lines[5], format!("serverless connect {}", outcome.namespace_id));
        assert_eq!(lines[6], "serverless deploy .");
        assert_eq!(lines[7], "serverless fn get sample/hello --url");

        let deploy_cwd = fake.calls()[6].cwd.clone().unwrap();
        assert!(deploy_cwd.starts_with(&fx.scratch));
        assert!(deploy_cwd.ends_with(&outcome.project_id));
        assert!(is_empty(&fx.scratch));
    }

    #[test]
    fn staged_files_exist_during_deploy() {
        use crate::runner::CommandRunner;
        use crate::types::CommandResult;
        use std::sync::Mutex;

        // Wraps the fake and snapshots the action directory at deploy time.
        struct Snooping {
            inner: FakeDoctl,
            seen: Mutex<Option<(bool, Option<String>)>>,
        }

        impl CommandRunner for Snooping {
            fn program(&self) -> &str {
                "doctl"
            }

            fn exec(&self, args: &[String], cwd: Option<&Path>) -> Result<CommandResult> {
                if args.first().map(String::as_str) == Some("serverless")
                    && args.get(1).map(String::as_str) == Some("deploy")
                {
                    let dir = cwd.unwrap().join("packages/sample/hello");
                    *self.seen.lock().unwrap() = Some((
                        dir.join("__main__.py").is_file(),
                        std::fs::read_to_string(dir.join("requirements.txt")).ok(),
                    ));
                }
                self.inner.exec(args, cwd)
            }
        }

        let fx = fixture();
        let runner = Snooping {
            inner: FakeDoctl::new().with_namespace("fn-1", "demo"),
            seen: Mutex::new(None),
        };
        let req = DeploymentRequest::new(&fx.artifact, "demo")
            .with_dependencies(vec!["numpy".into(), "pandas==2.0".into()]);

        Orchestrator::new(&fx.config, &runner).deploy(&req).unwrap();

        let (entrypoint, manifest) = runner.seen.lock().unwrap().clone().unwrap();
        assert!(entrypoint);
        assert_eq!(manifest.as_deref(), Some("numpy\npandas==2.0"));
        assert!(is_empty(&fx.scratch));
    }

    #[test]
    fn missing_artifact_touches_nothing() {
        let fx = fixture();
        let fake = FakeDoctl::new();
        let req = DeploymentRequest::new(fx.scratch.join("nope.py"), "demo");

        let (result, states) = run(&fx, &fake, &req);
        assert!(matches!(result, Err(DeployError::ArtifactNotFound(_))));
        assert_eq!(states, [DeployState::Validating, DeployState::Failed]);
        assert!(fake.calls().is_empty());
        assert!(is_empty(&fx.scratch));
    }

    #[test]
    fn unauthenticated_cli_fails_before_namespace_calls() {
        let fx = fixture();
        let fake = FakeDoctl::new().failing("account");
        let req = DeploymentRequest::new(&fx.artifact, "demo");

        let (result, _) = run(&fx, &fake, &req);
        assert!(matches!(result, Err(DeployError::NotAuthenticated(_))));
        assert_eq!(fake.call_lines(), ["account get"]);
    }

    #[test]
    fn missing_cli_binary_is_reported() {
        let fx = fixture();
        let runner = crate::runner::ProcessRunner::new("fndeploy-definitely-not-installed");
        let req = DeploymentRequest::new(&fx.artifact, "demo");

        let result = Orchestrator::new(&fx.config, &runner).deploy(&req);
        assert!(matches!(result, Err(DeployError::CliNotInstalled(_))));
    }

    #[test]
    fn install_failure_is_not_fatal() {
        let fx = fixture();
        let fake = FakeDoctl::new()
            .with_namespace("fn-1", "demo")
            .failing("install");
        let req = DeploymentRequest::new(&fx.artifact, "demo");

        let (result, states) = run(&fx, &fake, &req);
        assert!(result.is_ok());
        assert_eq!(states.last(), Some(&DeployState::Done));
    }

    #[test]
    fn every_failing_stage_cleans_up() {
        for (step, last_good) in [
            ("list", DeployState::Validating),
            ("create", DeployState::Validating),
            ("init", DeployState::NamespaceReady),
            ("connect", DeployState::Staged),
            ("deploy", DeployState::Connected),
        ] {
            let fx = fixture();
            let fake = FakeDoctl::new().failing(step);
            let req = DeploymentRequest::new(&fx.artifact, "demo");

            let (result, states) = run(&fx, &fake, &req);
            assert!(result.is_err(), "{step} should fail the run");
            assert_eq!(states.last(), Some(&DeployState::Failed), "{step}");
            assert_eq!(states[states.len() - 2], last_good, "{step}");
            assert!(is_empty(&fx.scratch), "{step} left files behind");
        }
    }

    #[test]
    fn staging_failure_cleans_up() {
        use crate::runner::CommandRunner;
        use crate::types::CommandResult;

        // Removes the artifact once the project exists, so staging cannot copy it.
        struct VanishingArtifact {
            inner: FakeDoctl,
            artifact: PathBuf,
        }

        impl CommandRunner for VanishingArtifact {
            fn program(&self) -> &str {
                "doctl"
            }

            fn exec(&self, args: &[String], cwd: Option<&Path>) -> Result<CommandResult> {
                let result = self.inner.exec(args, cwd)?;
                if args.get(1).map(String::as_str) == Some("init") {
                    std::fs::remove_file(&self.artifact)?;
                }
                Ok(result)
            }
        }

        let fx = fixture();
        let runner = VanishingArtifact {
            inner: FakeDoctl::new().with_namespace("fn-1", "demo"),
            artifact: fx.artifact.clone(),
        };
        let req = DeploymentRequest::new(&fx.artifact, "demo");

        let mut states = Vec::new();
        let result =
            Orchestrator::new(&fx.config, &runner).deploy_observed(&req, &mut |s| states.push(s));

        assert!(matches!(result, Err(DeployError::Staging(_))));
        assert_eq!(&states[states.len() - 2..], [DeployState::Scaffolded, DeployState::Failed]);
        assert_eq!(runner.inner.count("serverless connect"), 0);
        assert!(is_empty(&fx.scratch));
    }

    #[test]
    fn concurrent_runs_never_deploy_through_another_runs_connection() {
        use crate::runner::CommandRunner;
        use crate::types::CommandResult;
        use std::collections::HashMap;
        use std::sync::Mutex;
        use std::thread::ThreadId;
        use std::time::Duration;

        // doctl keeps one connected namespace per context; model that and
        // record every deploy that runs against a namespace other than the
        // one its own thread connected to.
        struct SharedContext {
            inner: FakeDoctl,
            connected: Mutex<Option<String>>,
            intended: Mutex<HashMap<ThreadId, String>>,
            crossed: Mutex<Vec<(String, String)>>,
        }

        impl CommandRunner for SharedContext {
            fn program(&self) -> &str {
                "doctl"
            }

            fn exec(&self, args: &[String], cwd: Option<&Path>) -> Result<CommandResult> {
                let me = std::thread::current().id();
                match args.get(1).map(String::as_str) {
                    Some("connect") => {
                        let id = args[2].clone();
                        *self.connected.lock().unwrap() = Some(id.clone());
                        self.intended.lock().unwrap().insert(me, id);
                        std::thread::sleep(Duration::from_millis(30));
                    }
                    Some("deploy") => {
                        std::thread::sleep(Duration::from_millis(10));
                        let actual = self.connected.lock().unwrap().clone().unwrap_or_default();
                        let wanted = self.intended.lock().unwrap().get(&me).cloned().unwrap_or_default();
                        if actual != wanted {
                            self.crossed.lock().unwrap().push((wanted, actual));
                        }
                    }
                    _ => {}
                }
                self.inner.exec(args, cwd)
            }
        }

        let fx = fixture();
        let runner = SharedContext {
            inner: FakeDoctl::new()
                .with_namespace("fn-a", "alpha")
                .with_namespace("fn-b", "beta"),
            connected: Mutex::new(None),
            intended: Mutex::new(HashMap::new()),
            crossed: Mutex::new(Vec::new()),
        };

        std::thread::scope(|scope| {
            for label in ["alpha", "beta", "alpha", "beta"] {
                let fx = &fx;
                let runner = &runner;
                scope.spawn(move || {
                    let req = DeploymentRequest::new(&fx.artifact, label);
                    Orchestrator::new(&fx.config, runner).deploy(&req).unwrap();
                });
            }
        });

        assert_eq!(runner.inner.count("serverless deploy"), 4);
        assert!(
            runner.crossed.lock().unwrap().is_empty(),
            "deploys ran under the wrong namespace: {:?}",
            runner.crossed.lock().unwrap()
        );
        assert!(is_empty(&fx.scratch));
    }

    #[test]
    fn context_lock_key_follows_cli_context() {
        let mut cli = CliConfig::default();
        assert_eq!(context_lock_key(&cli), "ctx-default");
        cli.context = Some("staging".into());
        assert_eq!(context_lock_key(&cli), "ctx-staging");
    }

    #[test]
    fn url_failure_still_reaches_done_with_placeholder() {
        let fx = fixture();
        let fake = FakeDoctl::new()
            .with_namespace("fn-1", "demo")
            .failing("url");
        let req = DeploymentRequest::new(&fx.artifact, "demo");

        let (result, states) = run(&fx, &fake, &req);
        let outcome = result.unwrap();
        assert_eq!(states.last(), Some(&DeployState::Done));
        assert!(matches!(outcome.endpoint, Endpoint::Unavailable(_)));
        assert!(outcome
            .endpoint
            .to_string()
            .contains("doctl serverless fn get sample/hello --url"));
        assert!(is_empty(&fx.scratch));
    }

    #[test]
    fn existing_namespace_is_reused() {
        let fx = fixture();
        let fake = FakeDoctl::new().with_namespace("fn-existing", "demo");
        let req = DeploymentRequest::new(&fx.artifact, "demo");

        let outcome = Orchestrator::new(&fx.config, &fake).deploy(&req).unwrap();
        assert_eq!(outcome.namespace_id, "fn-existing");
        assert_eq!(fake.count("serverless namespaces create"), 0);
        assert_eq!(fake.count("serverless connect fn-existing"), 1);
    }

    #[test]
    fn custom_action_path_is_used_throughout() {
        let fx = fixture();
        let fake = FakeDoctl::new().with_namespace("fn-1", "demo");
        let req = DeploymentRequest::new(&fx.artifact, "demo")
            .with_region("sfo3")
            .with_action(ActionPath::new("billing", "invoice").unwrap());

        let outcome = Orchestrator::new(&fx.config, &fake).deploy(&req).unwrap();
        assert_eq!(outcome.action.to_string(), "billing/invoice");
        assert_eq!(fake.count("serverless fn get billing/invoice --url"), 1);
    }

    #[test]
    fn runs_use_distinct_projects() {
        let fx = fixture();
        let fake = FakeDoctl::new().with_namespace("fn-1", "demo");
        let req = DeploymentRequest::new(&fx.artifact, "demo");
        let orch = Orchestrator::new(&fx.config, &fake);

        let a = orch.deploy(&req).unwrap();
        let b = orch.deploy(&req).unwrap();
        assert_ne!(a.project_id, b.project_id);
        assert!(is_empty(&fx.scratch));
    }

    #[test]
    fn deploy_function_renders_report() {
        let fx = fixture();
        let fake = FakeDoctl::new();
        let orch = Orchestrator::new(&fx.config, &fake);

        let ok = orch.deploy_function(&DeploymentRequest::new(&fx.artifact, "demo"));
        assert!(ok.contains("Function deployed successfully"));
        assert!(ok.contains("Namespace: demo"));
        assert!(ok.contains("Function: sample/hello"));

        let missing = fx.scratch.join("missing.py");
        let err = orch.deploy_function(&DeploymentRequest::new(&missing, "demo"));
        assert!(err.starts_with("❌ File not found:"));
        assert!(!err.contains("deployed successfully"));
    }
}
