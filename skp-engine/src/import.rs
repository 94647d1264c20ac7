//! 叶子实体导入：把内核记录转换为不可变值实体，不做任何跨引用解析。

use skp_core::model::{
    Curve, Edge, Instance, Layer, Material, MaterialRef, MaterialTable, Mesh, Surface, Texture,
};
use skp_core::records::{
    CurveRecord, EdgeRecord, InstanceRecord, LayerRecord, MaterialRecord, MeshRecord,
    SurfaceRecord,
};

pub fn import_material(record: &MaterialRecord) -> Material {
    Material {
        name: record.name.clone(),
        color: record.color,
        opacity: record.opacity.clamp(0.0, 1.0),
        use_opacity: record.use_opacity,
        texture: record.texture.as_ref().map(|texture| Texture {
            path: texture.path.clone(),
            width: texture.width,
            height: texture.height,
            scale_s: texture.scale_s,
            scale_t: texture.scale_t,
        }),
    }
}

pub fn import_layers(records: &[LayerRecord]) -> Vec<Layer> {
    records
        .iter()
        .map(|record| Layer {
            name: record.name.clone(),
            is_visible: record.visible,
        })
        .collect()
}

/// 依赖已构建的材质表，面与实例的材质按名称取共享句柄。
#[derive(Debug, Clone, Copy)]
pub struct LeafImporter<'a> {
    materials: &'a MaterialTable,
    include_meshes: bool,
}

impl<'a> LeafImporter<'a> {
    pub fn new(materials: &'a MaterialTable, include_meshes: bool) -> Self {
        Self {
            materials,
            include_meshes,
        }
    }

    pub fn import_surfaces(&self, records: &[SurfaceRecord]) -> Vec<Surface> {
        records.iter().map(|record| self.import_surface(record)).collect()
    }

    pub fn import_surface(&self, record: &SurfaceRecord) -> Surface {
        let mesh = if self.include_meshes {
            record.mesh.as_ref().map(import_mesh)
        } else {
            None
        };
        Surface {
            outer_loop: record.outer_loop.clone(),
            inner_loops: record.inner_loops.clone(),
            normal: record.normal,
            area: record.area,
            front_material: self.materials.resolve(&record.front_material),
            back_material: self.materials.resolve(&record.back_material),
            layer: record.layer.clone(),
            mesh,
        }
    }

    pub fn import_curves(&self, records: &[CurveRecord]) -> Vec<Curve> {
        records
            .iter()
            .map(|record| Curve {
                points: record.points.clone(),
                is_arc: record.is_arc,
                layer: record.layer.clone(),
                color: record.color,
            })
            .collect()
    }

    pub fn import_edges(&self, records: &[EdgeRecord]) -> Vec<Edge> {
        records
            .iter()
            .map(|record| Edge {
                start: record.start,
                end: record.end,
                layer: record.layer.clone(),
                color: record.color,
                smooth: record.smooth,
                soft: record.soft,
            })
            .collect()
    }

    /// 实例的父引用此时保持未解析。
    pub fn import_instances(&self, records: &[InstanceRecord]) -> Vec<Instance> {
        records
            .iter()
            .map(|record| Instance {
                name: record.name.clone(),
                guid: record.guid.clone(),
                parent_id: record.parent_id.clone(),
                transform: record.transform,
                layer: record.layer.clone(),
                material: self.materials.resolve(&record.material),
                parent: None,
            })
            .collect()
    }

    pub fn material(&self, name: &str) -> MaterialRef {
        self.materials.resolve(name)
    }
}

fn import_mesh(record: &MeshRecord) -> Mesh {
    Mesh {
        vertices: record.vertices.clone(),
        normals: record.normals.clone(),
        triangles: record.triangles.clone(),
    }
}
