//! 图展平：把模型顶层的面、边、曲线转换回内核写入接口所需的扁平记录。
//! 只读取顶层集合，组与组件内部的几何不参与。

use skp_core::model::{Curve, Edge, Model, Surface};
use skp_core::records::{CurveRecord, EdgeRecord, SurfaceRecord};

/// 写入内核的几何数组，顺序与模型中的存放顺序一致。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatGeometry {
    pub surfaces: Vec<SurfaceRecord>,
    pub edges: Vec<EdgeRecord>,
    pub curves: Vec<CurveRecord>,
}

pub fn flatten(model: &Model) -> FlatGeometry {
    FlatGeometry {
        surfaces: model.surfaces.iter().map(flatten_surface).collect(),
        edges: model.edges.iter().map(flatten_edge).collect(),
        curves: model.curves.iter().map(flatten_curve).collect(),
    }
}

/// 网格为派生数据，写回时只保留环。
pub fn flatten_surface(surface: &Surface) -> SurfaceRecord {
    SurfaceRecord {
        outer_loop: surface.outer_loop.clone(),
        inner_loops: surface.inner_loops.clone(),
        normal: surface.normal,
        area: surface.area,
        front_material: surface.front_material.name.clone(),
        back_material: surface.back_material.name.clone(),
        layer: surface.layer.clone(),
        mesh: None,
    }
}

pub fn flatten_edge(edge: &Edge) -> EdgeRecord {
    EdgeRecord {
        start: edge.start,
        end: edge.end,
        layer: edge.layer.clone(),
        color: edge.color,
        smooth: edge.smooth,
        soft: edge.soft,
    }
}

pub fn flatten_curve(curve: &Curve) -> CurveRecord {
    CurveRecord {
        points: curve.points.clone(),
        is_arc: curve.is_arc,
        layer: curve.layer.clone(),
        color: curve.color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skp_core::geometry::{Color, Point3, Transform, Vector3};
    use skp_core::model::{Entities, Group, Material, Mesh};

    fn model() -> Model {
        let mut model = Model::new();
        model.materials.insert(Material::named("Concrete"));
        let concrete = model.materials.resolve("Concrete");
        for offset in [0.0, 5.0] {
            model.surfaces.push(Surface {
                outer_loop: vec![
                    Point3::new(offset, 0.0, 0.0),
                    Point3::new(offset + 1.0, 0.0, 0.0),
                    Point3::new(offset + 1.0, 1.0, 0.0),
                ],
                inner_loops: Vec::new(),
                normal: Vector3::new(0.0, 0.0, 1.0),
                area: 0.5,
                front_material: concrete.clone(),
                back_material: model.materials.none_material(),
                layer: "Layer0".to_string(),
                mesh: Some(Mesh::default()),
            });
        }
        model.edges.push(Edge {
            start: Point3::origin(),
            end: Point3::new(0.0, 0.0, 3.0),
            layer: "Layer0".to_string(),
            color: Some(Color::rgb(1, 2, 3)),
            smooth: false,
            soft: true,
        });
        model.curves.push(Curve {
            points: vec![Point3::origin(), Point3::new(1.0, 1.0, 0.0)],
            is_arc: true,
            layer: String::new(),
            color: None,
        });
        model
    }

    #[test]
    fn flatten_preserves_order_and_material_names() {
        let flat = flatten(&model());
        assert_eq!(flat.surfaces.len(), 2);
        assert!((flat.surfaces[0].outer_loop[0].x()).abs() < f64::EPSILON);
        assert!((flat.surfaces[1].outer_loop[0].x() - 5.0).abs() < f64::EPSILON);
        assert_eq!(flat.surfaces[0].front_material, "Concrete");
        assert_eq!(flat.surfaces[0].back_material, "");
        assert!(flat.surfaces.iter().all(|s| s.mesh.is_none()));
        assert_eq!(flat.edges.len(), 1);
        assert!(flat.edges[0].soft);
        assert_eq!(flat.curves.len(), 1);
        assert!(flat.curves[0].is_arc);
    }

    #[test]
    fn nested_geometry_is_not_emitted() {
        let mut nested = model();
        let entities = Entities {
            surfaces: std::mem::take(&mut nested.surfaces),
            edges: std::mem::take(&mut nested.edges),
            ..Entities::default()
        };
        nested.groups.push(Group {
            name: "G".to_string(),
            transform: Transform::identity(),
            layer: String::new(),
            material: nested.materials.none_material(),
            entities,
        });

        let flat = flatten(&nested);
        assert!(flat.surfaces.is_empty());
        assert!(flat.edges.is_empty());
        assert_eq!(flat.curves.len(), 1);
    }
}
