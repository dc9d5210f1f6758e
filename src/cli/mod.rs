pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, DeployArgs, ManifestArgs, ScanArgs};
pub use output::{OutputFormat, OutputFormatter};
