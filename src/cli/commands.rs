use crate::cluster::backend::ClusterKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Deploy source repositories to local Kubernetes clusters
#[derive(Parser, Debug)]
#[command(
    name = "kdeploy",
    about = "Deploy source repositories to local Kubernetes clusters",
    version,
    author,
    long_about = "kdeploy scans a repository for Dockerfiles, compose files, env files and \
                  schema SQL, synthesizes the Kubernetes manifests those artifacts imply, \
                  builds the images, loads them into a local cluster (kind, minikube or k3d) \
                  and applies the manifests."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Increase verbosity (debug-level logging)"
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Scan, build and deploy a repository to a local cluster",
        long_about = "Runs the full pipeline: artifact scan, manifest synthesis, image build, \
                      image load and manifest apply.\n\n\
                      Examples:\n  \
                      kdeploy deploy\n  \
                      kdeploy deploy /path/to/repo\n  \
                      kdeploy deploy --cluster k3d\n  \
                      kdeploy deploy --name shop --pvc-size 5Gi"
    )]
    Deploy(DeployArgs),

    #[command(
        about = "Scan a repository and report detected artifacts",
        long_about = "Classifies files into deployment-relevant categories and reports the \
                      ports each Dockerfile exposes, without touching any cluster.\n\n\
                      Examples:\n  \
                      kdeploy scan\n  \
                      kdeploy scan /path/to/repo --format json"
    )]
    Scan(ScanArgs),

    #[command(
        about = "Synthesize manifests without deploying",
        long_about = "Runs the scan and synthesis stages and writes the resulting manifest \
                      files, leaving images unbuilt and the cluster untouched.\n\n\
                      Examples:\n  \
                      kdeploy manifests\n  \
                      kdeploy manifests /path/to/repo -o ./out"
    )]
    Manifests(ManifestArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct DeployArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to repository (defaults to current directory)"
    )]
    pub repository_path: Option<PathBuf>,

    #[arg(
        short = 'c',
        long,
        value_enum,
        help = "Target cluster backend (auto-detected from the live cluster when omitted)"
    )]
    pub cluster: Option<ClusterKind>,

    #[arg(
        short = 'n',
        long,
        value_name = "NAME",
        help = "Application name (defaults to the repository directory name)"
    )]
    pub name: Option<String>,

    #[arg(
        long,
        value_name = "QUANTITY",
        help = "Storage request for the generated PersistentVolumeClaim, e.g. 5Gi"
    )]
    pub pvc_size: Option<String>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Env file to use for the ConfigMap when several match"
    )]
    pub env_file: Option<PathBuf>,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        help = "Directory to write manifests into (defaults to <repo>/k8s-manifests)"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        help = "Skip loading built images into the cluster"
    )]
    pub skip_load: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Summary output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ScanArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to repository (defaults to current directory)"
    )]
    pub repository_path: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ManifestArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to repository (defaults to current directory)"
    )]
    pub repository_path: Option<PathBuf>,

    #[arg(
        short = 'n',
        long,
        value_name = "NAME",
        help = "Application name (defaults to the repository directory name)"
    )]
    pub name: Option<String>,

    #[arg(
        long,
        value_name = "QUANTITY",
        help = "Storage request for the generated PersistentVolumeClaim, e.g. 5Gi"
    )]
    pub pvc_size: Option<String>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Env file to use for the ConfigMap when several match"
    )]
    pub env_file: Option<PathBuf>,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        help = "Directory to write manifests into (defaults to <repo>/k8s-manifests)"
    )]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
