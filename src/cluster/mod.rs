//! Cluster backend abstraction and external command seam

pub mod backend;
pub mod runner;

pub use backend::{resolve_backend, ClusterKind};
pub use runner::{CommandOutput, CommandRunner, RealCommandRunner, ScriptedRunner};
