pub mod config;
pub mod deployer;
pub mod doctl;
pub mod endpoint;
pub mod error;
pub mod io;
pub mod lock;
pub mod namespace;
pub mod orchestrator;
pub mod paths;
pub mod report;
pub mod runner;
pub mod scaffold;
pub mod stage;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::{DeployError, Result};
