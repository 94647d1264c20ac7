pub mod cli;
pub mod errors;
pub mod loader;

use std::path::Path;

use errors::FrontendError;
use skp_config::AppConfig;
use tracing::info;

pub use loader::LoadFlags;

/// 前端可执行的命令。
#[derive(Debug, Clone)]
pub enum FrontendCommand<'a> {
    Inspect {
        path: &'a Path,
        flags: LoadFlags,
    },
    Convert {
        source: &'a Path,
        target: &'a Path,
        version: Option<&'a str>,
    },
    Export {
        source: &'a Path,
        target: &'a Path,
        version: Option<&'a str>,
    },
    Append {
        source: &'a Path,
        target: &'a Path,
    },
}

/// 在给定配置下执行一条前端命令。
pub fn run(config: &AppConfig, command: FrontendCommand<'_>) -> Result<(), FrontendError> {
    info!(?command, "执行前端命令");
    match command {
        FrontendCommand::Inspect { path, flags } => cli::inspect(config, path, flags),
        FrontendCommand::Convert {
            source,
            target,
            version,
        } => cli::convert(config, source, target, version),
        FrontendCommand::Export {
            source,
            target,
            version,
        } => cli::export(config, source, target, version),
        FrontendCommand::Append { source, target } => cli::append(config, source, target),
    }
}
