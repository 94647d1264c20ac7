//! 组材质继承：嵌套组与面上的“无材质”哨兵由最近的祖先组材质替换。
//! 组件定义不参与继承。

use std::sync::Arc;

use skp_core::model::{Group, Model};

/// 对模型的全部顶层组执行继承，返回替换次数。
pub fn resolve_group_materials(model: &mut Model) -> usize {
    inherit_group_materials(&mut model.groups)
}

pub fn inherit_group_materials(groups: &mut [Group]) -> usize {
    groups.iter_mut().map(inherit_into).sum()
}

fn inherit_into(group: &mut Group) -> usize {
    let parent = Arc::clone(&group.material);
    let inherit = !parent.is_none();
    let mut replaced = 0;

    for nested in &mut group.entities.groups {
        if inherit && nested.material.is_none() {
            nested.material = Arc::clone(&parent);
            replaced += 1;
        }
        replaced += inherit_into(nested);
    }

    if inherit {
        for surface in &mut group.entities.surfaces {
            if surface.front_material.is_none() {
                surface.front_material = Arc::clone(&parent);
                replaced += 1;
            }
            if surface.back_material.is_none() {
                surface.back_material = Arc::clone(&parent);
                replaced += 1;
            }
        }
    }

    replaced
}

#[cfg(test)]
mod tests {
    use super::*;
    use skp_core::geometry::{Point3, Transform, Vector3};
    use skp_core::model::{Component, Entities, Material, MaterialRef, MaterialTable, Surface};

    fn materials() -> MaterialTable {
        let mut table = MaterialTable::new();
        table.insert(Material::named("Red"));
        table.insert(Material::named("Blue"));
        table
    }

    fn group(name: &str, material: MaterialRef) -> Group {
        Group {
            name: name.to_string(),
            transform: Transform::identity(),
            layer: String::new(),
            material,
            entities: Entities::default(),
        }
    }

    fn surface(front: MaterialRef, back: MaterialRef) -> Surface {
        Surface {
            outer_loop: vec![Point3::origin()],
            inner_loops: Vec::new(),
            normal: Vector3::new(0.0, 0.0, 1.0),
            area: 0.0,
            front_material: front,
            back_material: back,
            layer: String::new(),
            mesh: None,
        }
    }

    #[test]
    fn nested_group_inherits_only_when_unset() {
        let table = materials();
        let mut g = group("G", table.resolve("Red"));
        g.entities.groups.push(group("H", table.none_material()));
        g.entities.groups.push(group("K", table.resolve("Blue")));
        let mut groups = vec![g];

        let replaced = inherit_group_materials(&mut groups);
        assert_eq!(replaced, 1);
        let nested = &groups[0].entities.groups;
        assert_eq!(nested[0].material.name, "Red");
        assert_eq!(nested[1].material.name, "Blue");
    }

    #[test]
    fn faces_inherit_independently() {
        let table = materials();
        let mut g = group("G", table.resolve("Red"));
        g.entities
            .surfaces
            .push(surface(table.none_material(), table.resolve("Blue")));
        let mut groups = vec![g];

        inherit_group_materials(&mut groups);
        let face = &groups[0].entities.surfaces[0];
        assert_eq!(face.front_material.name, "Red");
        assert_eq!(face.back_material.name, "Blue");
    }

    #[test]
    fn nearest_ancestor_wins_through_several_levels() {
        let table = materials();
        let mut deepest = group("D", table.none_material());
        deepest
            .entities
            .surfaces
            .push(surface(table.none_material(), table.none_material()));
        let mut middle = group("M", table.resolve("Blue"));
        middle.entities.groups.push(deepest);
        let mut relay = group("R", table.none_material());
        relay.entities.groups.push(middle);
        let mut root = group("Root", table.resolve("Red"));
        root.entities.groups.push(relay);
        let mut groups = vec![root];

        inherit_group_materials(&mut groups);
        let relay = &groups[0].entities.groups[0];
        assert_eq!(relay.material.name, "Red");
        let middle = &relay.entities.groups[0];
        assert_eq!(middle.material.name, "Blue");
        let deepest = &middle.entities.groups[0];
        assert_eq!(deepest.material.name, "Blue");
        assert_eq!(deepest.entities.surfaces[0].front_material.name, "Blue");
        assert_eq!(deepest.entities.surfaces[0].back_material.name, "Blue");
    }

    #[test]
    fn materials_table_and_components_are_untouched() {
        let mut model = Model::new();
        model.materials = materials();
        let red = model.materials.resolve("Red");
        let mut g = group("G", Arc::clone(&red));
        g.entities
            .surfaces
            .push(surface(model.materials.none_material(), red.clone()));
        model.groups.push(g);

        let mut entities = Entities::default();
        entities.surfaces.push(surface(
            model.materials.none_material(),
            model.materials.none_material(),
        ));
        model.components.insert(Component {
            guid: "c".to_string(),
            name: "C".to_string(),
            description: String::new(),
            entities,
        });

        let replaced = resolve_group_materials(&mut model);
        assert_eq!(replaced, 1);
        assert_eq!(model.materials.len(), 2);
        assert!(Arc::ptr_eq(&model.groups[0].entities.surfaces[0].front_material, &red));
        let component = model.components.by_guid("c").expect("component");
        assert!(component.entities.surfaces[0].front_material.is_none());
    }

    #[test]
    fn unset_top_level_group_substitutes_nothing() {
        let table = materials();
        let mut g = group("G", table.none_material());
        g.entities.groups.push(group("H", table.none_material()));
        let mut groups = vec![g];

        assert_eq!(inherit_group_materials(&mut groups), 0);
        assert!(groups[0].entities.groups[0].material.is_none());
    }
}
