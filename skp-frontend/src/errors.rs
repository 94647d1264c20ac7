use thiserror::Error;

use skp_config::ConfigError;
use skp_io::IoError;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("配置加载失败: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] IoError),
}
