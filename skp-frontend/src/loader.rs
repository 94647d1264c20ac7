use std::path::Path;

use tracing::{info, warn};

use skp_config::AppConfig;
use skp_core::model::Model;
use skp_engine::pipeline::LoadOptions;
use skp_io::{FormatVersion, Kernel, ModelIo, ModelLoader};

use crate::errors::FrontendError;

/// 命令行对加载行为的覆盖，只能打开配置中关闭的开关。
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadFlags {
    pub include_meshes: bool,
    pub inherit_group_materials: bool,
}

/// 显式给出的配置文件必须可读；否则按发现规则查找，失败时回退到默认配置。
pub fn load_app_config(explicit: Option<&Path>) -> Result<AppConfig, FrontendError> {
    if let Some(path) = explicit {
        return Ok(AppConfig::from_file(path)?);
    }
    match AppConfig::discover() {
        Ok(cfg) => Ok(cfg),
        Err(err) => {
            warn!(error = %err, "读取配置失败，使用默认配置");
            Ok(AppConfig::default())
        }
    }
}

pub fn load_options(config: &AppConfig, flags: LoadFlags) -> LoadOptions {
    LoadOptions::default()
        .with_meshes(config.load.include_meshes || flags.include_meshes)
        .with_group_material_inheritance(
            config.load.inherit_group_materials || flags.inherit_group_materials,
        )
}

/// 命令行标签优先，其次为配置中的 `save.target_version`，都缺省时取最新版本。
pub fn target_version(config: &AppConfig, tag: Option<&str>) -> FormatVersion {
    tag.or(config.save.target_version.as_deref())
        .map(FormatVersion::from_tag)
        .unwrap_or_default()
}

pub fn load_model<K: Kernel>(
    io: &mut ModelIo<K>,
    path: &Path,
    options: LoadOptions,
) -> Result<Model, FrontendError> {
    let model = io.load(path, options)?;
    info!(
        path = %path.display(),
        components = model.components.len(),
        instances = model.instance_count(),
        "前端加载模型"
    );
    Ok(model)
}
