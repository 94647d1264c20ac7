//! 内核边界上的扁平记录。
//!
//! 记录只携带内核解码后的字段，跨引用一律以名称或 GUID 字符串表示，
//! 由 `skp-engine` 负责构建成对象图。

use serde::{Deserialize, Serialize};

use crate::geometry::{Color, Point3, Transform, Vector3};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureRecord {
    pub path: String,
    pub width: u32,
    pub height: u32,
    #[serde(default = "TextureRecord::default_scale")]
    pub scale_s: f64,
    #[serde(default = "TextureRecord::default_scale")]
    pub scale_t: f64,
}

impl TextureRecord {
    fn default_scale() -> f64 {
        1.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default = "MaterialRecord::default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub use_opacity: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<TextureRecord>,
}

impl MaterialRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            opacity: Self::default_opacity(),
            use_opacity: false,
            texture: None,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    fn default_opacity() -> f64 {
        1.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    pub name: String,
    #[serde(default = "LayerRecord::default_visible")]
    pub visible: bool,
}

impl LayerRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: true,
        }
    }

    fn default_visible() -> bool {
        true
    }
}

/// 内核预先三角化的网格，仅在请求包含网格时由导入器保留。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshRecord {
    pub vertices: Vec<Point3>,
    #[serde(default)]
    pub normals: Vec<Vector3>,
    pub triangles: Vec<[u32; 3]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceRecord {
    pub outer_loop: Vec<Point3>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inner_loops: Vec<Vec<Point3>>,
    #[serde(default = "Vector3::zero")]
    pub normal: Vector3,
    #[serde(default)]
    pub area: f64,
    /// 空字符串表示“无材质”。
    #[serde(default)]
    pub front_material: String,
    #[serde(default)]
    pub back_material: String,
    #[serde(default)]
    pub layer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshRecord>,
}

impl SurfaceRecord {
    pub fn new(outer_loop: Vec<Point3>) -> Self {
        Self {
            outer_loop,
            inner_loops: Vec::new(),
            normal: Vector3::zero(),
            area: 0.0,
            front_material: String::new(),
            back_material: String::new(),
            layer: String::new(),
            mesh: None,
        }
    }

    pub fn with_materials(mut self, front: impl Into<String>, back: impl Into<String>) -> Self {
        self.front_material = front.into();
        self.back_material = back.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveRecord {
    pub points: Vec<Point3>,
    #[serde(default)]
    pub is_arc: bool,
    #[serde(default)]
    pub layer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub start: Point3,
    pub end: Point3,
    #[serde(default)]
    pub layer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default)]
    pub smooth: bool,
    #[serde(default)]
    pub soft: bool,
}

impl EdgeRecord {
    pub fn new(start: Point3, end: Point3) -> Self {
        Self {
            start,
            end,
            layer: String::new(),
            color: None,
            smooth: false,
            soft: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub guid: String,
    /// 所引用组件定义的 GUID。
    pub parent_id: String,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub layer: String,
    #[serde(default)]
    pub material: String,
}

impl InstanceRecord {
    pub fn new(parent_id: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            guid: String::new(),
            parent_id: parent_id.into(),
            transform: Transform::identity(),
            layer: String::new(),
            material: String::new(),
        }
    }
}

/// 容器（模型根、组、组件定义）直接拥有的实体集合。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitiesRecord {
    #[serde(default)]
    pub surfaces: Vec<SurfaceRecord>,
    #[serde(default)]
    pub curves: Vec<CurveRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
    #[serde(default)]
    pub instances: Vec<InstanceRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub layer: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub entities: EntitiesRecord,
}

impl GroupRecord {
    pub fn new(name: impl Into<String>, material: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            layer: String::new(),
            material: material.into(),
            entities: EntitiesRecord::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub guid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub entities: EntitiesRecord,
}

impl ComponentRecord {
    pub fn new(guid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
            description: String::new(),
            entities: EntitiesRecord::default(),
        }
    }
}

/// 单个文档的完整快照，即内核各 `list_*` 调用结果的集合。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecords {
    #[serde(default)]
    pub format_version: u32,
    #[serde(default)]
    pub materials: Vec<MaterialRecord>,
    #[serde(default)]
    pub layers: Vec<LayerRecord>,
    #[serde(default)]
    pub components: Vec<ComponentRecord>,
    #[serde(default)]
    pub entities: EntitiesRecord,
}
