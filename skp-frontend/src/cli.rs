use std::path::Path;

use tracing::info;

use skp_config::AppConfig;
use skp_core::model::{Definition, Group, Instance, MaterialRef, Model};
use skp_io::{ModelIo, ModelSaver};

use crate::errors::FrontendError;
use crate::loader::{LoadFlags, load_model, load_options, target_version};

/// 加载文档并打印场景图概览。
pub fn inspect(config: &AppConfig, path: &Path, flags: LoadFlags) -> Result<(), FrontendError> {
    let mut io = ModelIo::json();
    let model = load_model(&mut io, path, load_options(config, flags))?;
    for line in overview_lines(path, &model) {
        println!("{line}");
    }
    Ok(())
}

/// 由内核直接另存为目标版本，不经过场景图。
pub fn convert(
    config: &AppConfig,
    source: &Path,
    target: &Path,
    tag: Option<&str>,
) -> Result<(), FrontendError> {
    let version = target_version(config, tag);
    ModelIo::json().save_as(source, version, target)?;
    println!("已另存为 {}（版本 {version}）", target.display());
    Ok(())
}

/// 加载源文档后把顶层几何写入新文档。
pub fn export(
    config: &AppConfig,
    source: &Path,
    target: &Path,
    tag: Option<&str>,
) -> Result<(), FrontendError> {
    let version = target_version(config, tag);
    let mut io = ModelIo::json();
    let model = load_model(&mut io, source, load_options(config, LoadFlags::default()))?;
    io.write_new_document(&model, target, version)?;
    println!(
        "已写出新文档 {}（版本 {version}，面 {}，边 {}，曲线 {}）",
        target.display(),
        model.surfaces.len(),
        model.edges.len(),
        model.curves.len()
    );
    Ok(())
}

/// 加载源文档后把顶层几何追加到已有文档，并原地保存。
pub fn append(config: &AppConfig, source: &Path, target: &Path) -> Result<(), FrontendError> {
    let mut io = ModelIo::json();
    let model = load_model(&mut io, source, load_options(config, LoadFlags::default()))?;
    io.append_to_document(&model, target)?;
    info!(source = %source.display(), target = %target.display(), "追加完成");
    println!("已追加到 {}", target.display());
    Ok(())
}

/// 生成模型概览文本，每个元素一行。
pub fn overview_lines(source: &Path, model: &Model) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(format!("文档：{}", source.display()));
    if model.more_recent_file_version {
        lines.push("格式：新于支持的最高版本，部分数据可能缺失".to_string());
    }

    lines.push(format!("图层 ({})：", model.layers.len()));
    for layer in &model.layers {
        lines.push(format!("  - {} (可见: {})", layer.name, layer.is_visible));
    }

    lines.push(format!("材质 ({})：", model.materials.len()));
    for material in model.materials.iter() {
        let mut line = format!("  - {}", material.name);
        if let Some(color) = material.color {
            line.push_str(&format!(
                ", 颜色=({}, {}, {}, {})",
                color.r, color.g, color.b, color.a
            ));
        }
        if material.use_opacity {
            line.push_str(&format!(", 不透明度={:.2}", material.opacity));
        }
        if let Some(texture) = &material.texture {
            line.push_str(&format!(", 贴图={}", texture.path));
        }
        lines.push(line);
    }

    lines.push(format!(
        "顶层几何：面 {}，边 {}，曲线 {}",
        model.surfaces.len(),
        model.edges.len(),
        model.curves.len()
    ));
    if let Some(bounds) = model.bounds() {
        let (min, max, size) = (bounds.min(), bounds.max(), bounds.size());
        lines.push(format!(
            "包围盒：({:.2}, {:.2}, {:.2}) - ({:.2}, {:.2}, {:.2})，尺寸 {:.2} x {:.2} x {:.2}",
            min.x(),
            min.y(),
            min.z(),
            max.x(),
            max.y(),
            max.z(),
            size.x(),
            size.y(),
            size.z()
        ));
    }

    lines.push(format!("组 ({})：", model.groups.len()));
    for group in &model.groups {
        push_group(model, group, 1, &mut lines);
    }

    let definitions = model.definitions();
    lines.push(format!("定义 ({})：", definitions.len()));
    for definition in &definitions {
        lines.push(format!("  - {}", describe_definition(definition)));
    }

    lines.push(format!(
        "实例：共 {}，未解析 {}",
        model.instance_count(),
        model.dangling_instance_count()
    ));
    for instance in &model.instances {
        lines.push(format!("  - {}", describe_instance(model, instance)));
    }

    if !model.cyclic_references.is_empty() {
        lines.push(format!("循环引用 ({})：", model.cyclic_references.len()));
        for cycle in &model.cyclic_references {
            lines.push(format!("  - {}", cycle.path.join(" -> ")));
        }
    }
    lines
}

fn push_group(model: &Model, group: &Group, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    lines.push(format!(
        "{indent}- {}{} 面={} 实例={}",
        display_name(&group.name),
        material_tag(&group.material),
        group.entities.surfaces.len(),
        group.entities.instances.len()
    ));
    for instance in &group.entities.instances {
        lines.push(format!("{indent}  * {}", describe_instance(model, instance)));
    }
    for nested in &group.entities.groups {
        push_group(model, nested, depth + 1, lines);
    }
}

fn describe_definition(definition: &Definition<'_>) -> String {
    let entities = definition.entities();
    let head = match (definition.guid(), definition.material()) {
        (Some(guid), _) => format!("组件 {} {{{guid}}}", display_name(definition.name())),
        (None, Some(material)) => {
            format!("组 {}{}", display_name(definition.name()), material_tag(material))
        }
        (None, None) => display_name(definition.name()).to_string(),
    };
    format!(
        "{head} 面={} 实例={}",
        entities.surfaces.len(),
        entities.instances.len()
    )
}

fn material_tag(material: &MaterialRef) -> String {
    if material.is_none() {
        String::new()
    } else {
        format!(" [材质={}]", material.name)
    }
}

fn describe_instance(model: &Model, instance: &Instance) -> String {
    match model.parent_of(instance) {
        Some(parent) => format!("{} -> {}", display_name(&instance.name), parent.name),
        None => format!(
            "{} -> 未解析 ({})",
            display_name(&instance.name),
            instance.parent_id
        ),
    }
}

fn display_name(name: &str) -> &str {
    if name.is_empty() { "<未命名>" } else { name }
}

#[cfg(test)]
mod tests {
    use super::*;

    use skp_core::records::{
        ComponentRecord, DocumentRecords, GroupRecord, InstanceRecord, LayerRecord,
        MaterialRecord,
    };
    use skp_engine::pipeline::{LoadOptions, build_model};

    fn overview(model: &Model) -> Vec<String> {
        overview_lines(Path::new("scene.skp.json"), model)
    }

    #[test]
    fn overview_lists_graph_with_parent_names() {
        let mut records = DocumentRecords::default();
        records.layers.push(LayerRecord::new("Layer0"));
        records.materials.push(MaterialRecord::new("Oak"));
        records
            .components
            .push(ComponentRecord::new("guid-chair", "Chair"));

        let mut placed = InstanceRecord::new("guid-chair");
        placed.name = "chair-1".to_string();
        let mut room = GroupRecord::new("Room", "Oak");
        room.entities.instances.push(placed);
        room.entities.groups.push(GroupRecord::new("Closet", ""));
        records.entities.groups.push(room);
        records
            .entities
            .instances
            .push(InstanceRecord::new("guid-missing"));

        let model = build_model(&records, LoadOptions::default());
        let lines = overview(&model);
        assert_eq!(lines[0], "文档：scene.skp.json");
        assert!(lines.contains(&"图层 (1)：".to_string()));
        assert!(lines.contains(&"  - Oak".to_string()));
        assert!(lines.contains(&"  - Room [材质=Oak] 面=0 实例=1".to_string()));
        assert!(lines.contains(&"    * chair-1 -> Chair".to_string()));
        assert!(lines.contains(&"    - Closet 面=0 实例=0".to_string()));
        assert!(lines.contains(&"定义 (3)：".to_string()));
        assert!(lines.contains(&"  - 组 Room [材质=Oak] 面=0 实例=1".to_string()));
        assert!(lines.contains(&"  - 组 Closet 面=0 实例=0".to_string()));
        assert!(lines.contains(&"  - 组件 Chair {guid-chair} 面=0 实例=0".to_string()));
        assert!(lines.contains(&"实例：共 2，未解析 1".to_string()));
        assert!(lines.contains(&"  - <未命名> -> 未解析 (guid-missing)".to_string()));
        assert!(!lines.iter().any(|line| line.starts_with("循环引用")));
    }

    #[test]
    fn overview_reports_cycles_and_newer_format() {
        let mut records = DocumentRecords::default();
        let mut a = ComponentRecord::new("a", "A");
        a.entities.instances.push(InstanceRecord::new("b"));
        let mut b = ComponentRecord::new("b", "B");
        b.entities.instances.push(InstanceRecord::new("a"));
        records.components = vec![a, b];

        let mut model = build_model(&records, LoadOptions::default());
        model.more_recent_file_version = true;
        let lines = overview(&model);
        assert!(lines.iter().any(|line| line.starts_with("格式：新于")));
        assert!(lines.contains(&"循环引用 (1)：".to_string()));
        assert!(lines.contains(&"  - a -> b -> a".to_string()));
    }
}
