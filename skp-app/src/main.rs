use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use skp_config::AppConfig;
use skp_frontend::loader::load_app_config;
use skp_frontend::{FrontendCommand, LoadFlags};

#[derive(Parser)]
#[command(name = "skp")]
#[command(about = "Scene-graph import, inspection and export for SKP documents", long_about = None)]
struct Cli {
    /// Configuration file (defaults to $SKP_CONFIG or ./config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a document and print its scene graph
    Inspect {
        file: PathBuf,

        /// Keep pre-triangulated meshes on surfaces
        #[arg(long)]
        meshes: bool,

        /// Push group materials down to unpainted children
        #[arg(long)]
        inherit_materials: bool,
    },

    /// Save a document under a new path and format version
    Convert {
        source: PathBuf,
        target: PathBuf,

        /// Target version tag, e.g. V2019 (unknown tags use the latest)
        #[arg(long)]
        version: Option<String>,
    },

    /// Write the top-level geometry of a document into a new document
    Export {
        source: PathBuf,
        target: PathBuf,

        /// Target version tag, e.g. V2019 (unknown tags use the latest)
        #[arg(long)]
        version: Option<String>,
    },

    /// Append the top-level geometry of a document to another document
    Append { source: PathBuf, target: PathBuf },
}

impl Commands {
    fn as_frontend(&self) -> FrontendCommand<'_> {
        match self {
            Commands::Inspect {
                file,
                meshes,
                inherit_materials,
            } => FrontendCommand::Inspect {
                path: file,
                flags: LoadFlags {
                    include_meshes: *meshes,
                    inherit_group_materials: *inherit_materials,
                },
            },
            Commands::Convert {
                source,
                target,
                version,
            } => FrontendCommand::Convert {
                source,
                target,
                version: version.as_deref(),
            },
            Commands::Export {
                source,
                target,
                version,
            } => FrontendCommand::Export {
                source,
                target,
                version: version.as_deref(),
            },
            Commands::Append { source, target } => FrontendCommand::Append { source, target },
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!(error = %err, "skp 异常退出");
        eprintln!("错误: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_app_config(cli.config.as_deref()).context("无法加载配置")?;
    init_logging(&config);
    info!("启动 skp 应用");

    skp_frontend::run(&config, cli.command.as_frontend()).context("命令执行失败")
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
