pub mod definitions;
pub mod flatten;
pub mod import;
pub mod inherit;
pub mod resolve;

pub mod pipeline {
    use tracing::{debug, info};

    use skp_core::model::Model;
    use skp_core::records::DocumentRecords;

    use crate::definitions::{DefinitionTableBuilder, build_material_table};
    use crate::import::{LeafImporter, import_layers};
    use crate::inherit::resolve_group_materials;
    use crate::resolve::resolve_instances;

    /// 加载选项：是否保留预三角化网格、是否执行组材质继承。
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct LoadOptions {
        pub include_meshes: bool,
        pub inherit_group_materials: bool,
    }

    impl LoadOptions {
        pub fn with_meshes(mut self, include: bool) -> Self {
            self.include_meshes = include;
            self
        }

        pub fn with_group_material_inheritance(mut self, inherit: bool) -> Self {
            self.inherit_group_materials = inherit;
            self
        }
    }

    /// 由一个文档快照构建完整的场景图。
    ///
    /// 顺序固定：材质表 → 图层 → 顶层组与组件表 → 顶层几何与实例 → 实例解析 →
    /// （可选）组材质继承。版本标记由调用方根据内核的加载状态设置。
    pub fn build_model(records: &DocumentRecords, options: LoadOptions) -> Model {
        let materials = build_material_table(&records.materials);
        let layers = import_layers(&records.layers);

        let (groups, components, top_level) = {
            let importer = LeafImporter::new(&materials, options.include_meshes);
            let builder = DefinitionTableBuilder::new(importer);
            let groups = builder.build_groups(&records.entities.groups);
            let components = builder.build_components(&records.components);
            let top_level = (
                importer.import_surfaces(&records.entities.surfaces),
                importer.import_curves(&records.entities.curves),
                importer.import_edges(&records.entities.edges),
                importer.import_instances(&records.entities.instances),
            );
            (groups, components, top_level)
        };
        let (surfaces, curves, edges, instances) = top_level;

        let mut model = Model {
            surfaces,
            curves,
            edges,
            layers,
            groups,
            instances,
            materials,
            components,
            more_recent_file_version: false,
            cyclic_references: Vec::new(),
        };

        let report = resolve_instances(&mut model);
        if options.inherit_group_materials {
            let replaced = resolve_group_materials(&mut model);
            debug!(replaced, "组材质继承完成");
        }

        info!(
            materials = model.materials.len(),
            layers = model.layers.len(),
            groups = model.groups.len(),
            components = model.components.len(),
            surfaces = model.surfaces.len(),
            resolved = report.resolved,
            dangling = report.dangling,
            cycles = report.cycles.len(),
            "场景图构建完成"
        );
        model
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use skp_core::geometry::{Color, Point3};
        use skp_core::records::{
            ComponentRecord, EdgeRecord, GroupRecord, InstanceRecord, LayerRecord,
            MaterialRecord, SurfaceRecord,
        };

        fn triangle() -> Vec<Point3> {
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
            ]
        }

        fn records() -> DocumentRecords {
            let mut records = DocumentRecords {
                format_version: 2021,
                ..DocumentRecords::default()
            };
            records.materials = vec![
                MaterialRecord::new("Red").with_color(Color::rgb(255, 0, 0)),
                MaterialRecord::new("Blue").with_color(Color::rgb(0, 0, 255)),
                MaterialRecord::new("Red").with_color(Color::rgb(1, 1, 1)),
            ];
            records.layers = vec![LayerRecord::new("Layer0")];

            let mut table = ComponentRecord::new("guid-table", "Table");
            table.entities.instances.push(InstanceRecord::new("guid-leg"));
            let leg = ComponentRecord::new("guid-leg", "Leg");
            records.components = vec![table, leg];

            let mut inner = GroupRecord::new("inner", "");
            inner
                .entities
                .surfaces
                .push(SurfaceRecord::new(triangle()).with_materials("", "Blue"));
            let mut outer = GroupRecord::new("outer", "Red");
            outer.entities.groups.push(inner);
            outer
                .entities
                .instances
                .push(InstanceRecord::new("guid-table"));
            records.entities.groups.push(outer);

            records.entities.surfaces.push(SurfaceRecord::new(triangle()));
            records
                .entities
                .edges
                .push(EdgeRecord::new(Point3::origin(), Point3::new(1.0, 0.0, 0.0)));
            records
                .entities
                .instances
                .push(InstanceRecord::new("guid-nowhere"));
            records
        }

        #[test]
        fn build_model_links_everything() {
            let model = build_model(&records(), LoadOptions::default());

            assert_eq!(model.materials.len(), 2);
            assert_eq!(
                model.materials.get("Red").and_then(|m| m.color),
                Some(Color::rgb(255, 0, 0))
            );
            assert_eq!(model.layers.len(), 1);
            assert_eq!(model.components.len(), 2);
            assert_eq!(model.groups.len(), 1);
            assert_eq!(model.surfaces.len(), 1);
            assert_eq!(model.edges.len(), 1);
            assert!(!model.more_recent_file_version);
            assert!(model.cyclic_references.is_empty());

            let placed = &model.groups[0].entities.instances[0];
            assert_eq!(model.parent_of(placed).map(|c| c.name.as_str()), Some("Table"));
            let table = model.components.by_guid("guid-table").expect("table");
            assert_eq!(
                model
                    .parent_of(&table.entities.instances[0])
                    .map(|c| c.name.as_str()),
                Some("Leg")
            );
            assert!(model.instances[0].parent.is_none());
            assert_eq!(model.dangling_instance_count(), 1);
        }

        #[test]
        fn inheritance_runs_only_on_request() {
            let plain = build_model(&records(), LoadOptions::default());
            let inner = &plain.groups[0].entities.groups[0];
            assert!(inner.material.is_none());
            assert!(inner.entities.surfaces[0].front_material.is_none());

            let options = LoadOptions::default().with_group_material_inheritance(true);
            let inherited = build_model(&records(), options);
            let inner = &inherited.groups[0].entities.groups[0];
            assert_eq!(inner.material.name, "Red");
            assert_eq!(inner.entities.surfaces[0].front_material.name, "Red");
            assert_eq!(inner.entities.surfaces[0].back_material.name, "Blue");
            assert_eq!(inherited.materials.len(), 2);
        }

        #[test]
        fn empty_document_builds_empty_model() {
            let model = build_model(&DocumentRecords::default(), LoadOptions::default());
            assert!(model.is_flat());
            assert!(model.surfaces.is_empty());
            assert!(model.materials.is_empty());
            assert!(model.bounds().is_none());
        }
    }
}
