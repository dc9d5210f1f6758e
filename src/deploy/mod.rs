//! Deployment pipeline: session state, orchestration and fatal errors

pub mod error;
pub mod orchestrator;
pub mod session;

pub use error::DeployError;
pub use orchestrator::{DeployOrchestrator, DeployRequest, DeploySummary, ItemFailure};
pub use session::{BuildTarget, DeployStage, DeploymentSession};
