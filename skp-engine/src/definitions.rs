//! 定义表构建：材质表、组件表与顶层组列表，在任何交叉引用之前完成。

use tracing::debug;

use skp_core::model::{Component, ComponentTable, Entities, Group, MaterialTable};
use skp_core::records::{ComponentRecord, EntitiesRecord, GroupRecord, MaterialRecord};

use crate::import::{LeafImporter, import_material};

/// 构建材质表，同名材质以首次出现者为准。
pub fn build_material_table(records: &[MaterialRecord]) -> MaterialTable {
    let mut table = MaterialTable::new();
    for record in records {
        if !table.insert(import_material(record)) {
            debug!(name = %record.name, "忽略重复材质定义");
        }
    }
    table
}

/// 把嵌套的内核记录转换为组与组件定义，保持原有嵌套结构。
#[derive(Debug, Clone, Copy)]
pub struct DefinitionTableBuilder<'a> {
    importer: LeafImporter<'a>,
}

impl<'a> DefinitionTableBuilder<'a> {
    pub fn new(importer: LeafImporter<'a>) -> Self {
        Self { importer }
    }

    pub fn build_entities(&self, record: &EntitiesRecord) -> Entities {
        Entities {
            surfaces: self.importer.import_surfaces(&record.surfaces),
            curves: self.importer.import_curves(&record.curves),
            edges: self.importer.import_edges(&record.edges),
            groups: self.build_groups(&record.groups),
            instances: self.importer.import_instances(&record.instances),
        }
    }

    pub fn build_groups(&self, records: &[GroupRecord]) -> Vec<Group> {
        records.iter().map(|record| self.build_group(record)).collect()
    }

    pub fn build_group(&self, record: &GroupRecord) -> Group {
        Group {
            name: record.name.clone(),
            transform: record.transform,
            layer: record.layer.clone(),
            material: self.importer.material(&record.material),
            entities: self.build_entities(&record.entities),
        }
    }

    pub fn build_component(&self, record: &ComponentRecord) -> Component {
        Component {
            guid: record.guid.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            entities: self.build_entities(&record.entities),
        }
    }

    /// 按 GUID 建立组件表，重复 GUID 的后续定义被丢弃。
    pub fn build_components(&self, records: &[ComponentRecord]) -> ComponentTable {
        let mut table = ComponentTable::new();
        for record in records {
            if table.insert(self.build_component(record)).is_none() {
                debug!(guid = %record.guid, name = %record.name, "忽略重复组件定义");
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skp_core::geometry::{Color, Point3};
    use skp_core::records::{InstanceRecord, SurfaceRecord};

    #[test]
    fn duplicate_material_names_keep_first_color() {
        let records = vec![
            MaterialRecord::new("Paint").with_color(Color::rgb(200, 10, 10)),
            MaterialRecord::new("Wood"),
            MaterialRecord::new("Paint").with_color(Color::rgb(10, 10, 200)),
        ];
        let table = build_material_table(&records);
        assert_eq!(table.len(), 2);
        let paint = table.get("Paint").expect("paint kept");
        assert_eq!(paint.color, Some(Color::rgb(200, 10, 10)));
        let names: Vec<&str> = table.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Paint", "Wood"]);
    }

    #[test]
    fn nested_groups_are_not_flattened() {
        let materials = build_material_table(&[MaterialRecord::new("Red")]);
        let builder = DefinitionTableBuilder::new(LeafImporter::new(&materials, false));

        let mut inner = GroupRecord::new("inner", "");
        inner
            .entities
            .surfaces
            .push(SurfaceRecord::new(vec![Point3::origin()]));
        let mut outer = GroupRecord::new("outer", "Red");
        outer.entities.groups.push(inner);
        outer.entities.instances.push(InstanceRecord::new("guid-x"));

        let groups = builder.build_groups(&[outer]);
        assert_eq!(groups.len(), 1);
        let outer = &groups[0];
        assert_eq!(outer.material.name, "Red");
        assert_eq!(outer.entities.instances.len(), 1);
        assert!(outer.entities.instances[0].parent.is_none());
        assert_eq!(outer.entities.groups.len(), 1);
        let inner = &outer.entities.groups[0];
        assert!(inner.material.is_none());
        assert_eq!(inner.entities.surfaces.len(), 1);
    }

    #[test]
    fn duplicate_component_guid_keeps_first_definition() {
        let materials = MaterialTable::new();
        let builder = DefinitionTableBuilder::new(LeafImporter::new(&materials, false));
        let records = vec![
            ComponentRecord::new("guid-1", "Door"),
            ComponentRecord::new("guid-2", "Window"),
            ComponentRecord::new("guid-1", "Shadow"),
        ];

        let table = builder.build_components(&records);
        assert_eq!(table.len(), 2);
        assert_eq!(table.by_guid("guid-1").map(|c| c.name.as_str()), Some("Door"));
        let order: Vec<&str> = table.iter().map(|(_, c)| c.name.as_str()).collect();
        assert_eq!(order, vec!["Door", "Window"]);
    }
}
