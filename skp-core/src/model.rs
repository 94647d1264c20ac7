use std::collections::HashMap;
use std::sync::Arc;

use crate::geometry::{Bounds3D, Color, Point3, Transform, Vector3};

/// 材质以共享引用持有：材质表是唯一数据源，面与组只持有句柄。
pub type MaterialRef = Arc<Material>;

#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub scale_s: f64,
    pub scale_t: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub color: Option<Color>,
    pub opacity: f64,
    pub use_opacity: bool,
    pub texture: Option<Texture>,
}

impl Material {
    /// “无材质”哨兵：名称为空，从不以缺失值表示。
    pub fn none() -> Self {
        Self::named("")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            opacity: 1.0,
            use_opacity: false,
            texture: None,
        }
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.name.is_empty()
    }
}

/// 按名称索引的材质表，保持导入顺序，首次出现者优先。
#[derive(Debug, Clone)]
pub struct MaterialTable {
    by_name: HashMap<String, MaterialRef>,
    order: Vec<MaterialRef>,
    none: MaterialRef,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
            order: Vec::new(),
            none: Arc::new(Material::none()),
        }
    }

    /// 插入材质；同名材质已存在时保持原值并返回 `false`。
    pub fn insert(&mut self, material: Material) -> bool {
        if self.by_name.contains_key(&material.name) {
            return false;
        }
        let material = Arc::new(material);
        self.by_name
            .insert(material.name.clone(), Arc::clone(&material));
        self.order.push(material);
        true
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&MaterialRef> {
        self.by_name.get(name)
    }

    /// 按名称取得共享句柄；空名称或未知名称退化为哨兵。
    pub fn resolve(&self, name: &str) -> MaterialRef {
        if name.is_empty() {
            return self.none_material();
        }
        self.by_name
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.none_material())
    }

    #[inline]
    pub fn none_material(&self) -> MaterialRef {
        Arc::clone(&self.none)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &MaterialRef> {
        self.order.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub is_visible: bool,
}

impl Layer {
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_visible: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point3>,
    pub normals: Vec<Vector3>,
    pub triangles: Vec<[u32; 3]>,
}

#[derive(Debug, Clone)]
pub struct Surface {
    pub outer_loop: Vec<Point3>,
    pub inner_loops: Vec<Vec<Point3>>,
    pub normal: Vector3,
    pub area: f64,
    pub front_material: MaterialRef,
    pub back_material: MaterialRef,
    pub layer: String,
    pub mesh: Option<Mesh>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub points: Vec<Point3>,
    pub is_arc: bool,
    pub layer: String,
    pub color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub start: Point3,
    pub end: Point3,
    pub layer: String,
    pub color: Option<Color>,
    pub smooth: bool,
    pub soft: bool,
}

impl Edge {
    #[inline]
    pub fn points(&self) -> [Point3; 2] {
        [self.start, self.end]
    }
}

/// 组件定义在组件表中的位置，作为实例回指的竞技场索引。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId(usize);

impl ComponentId {
    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Instance {
    pub name: String,
    pub guid: String,
    /// 声明的父定义 GUID。
    pub parent_id: String,
    pub transform: Transform,
    pub layer: String,
    pub material: MaterialRef,
    /// 解析后的父定义；未解析或悬空时为 `None`。
    pub parent: Option<ComponentId>,
}

impl Instance {
    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.parent.is_some()
    }
}

/// 容器直接拥有的实体。
#[derive(Debug, Clone, Default)]
pub struct Entities {
    pub surfaces: Vec<Surface>,
    pub curves: Vec<Curve>,
    pub edges: Vec<Edge>,
    pub groups: Vec<Group>,
    pub instances: Vec<Instance>,
}

#[derive(Debug, Clone)]
pub struct Group {
    pub name: String,
    pub transform: Transform,
    pub layer: String,
    pub material: MaterialRef,
    pub entities: Entities,
}

#[derive(Debug, Clone)]
pub struct Component {
    pub guid: String,
    pub name: String,
    pub description: String,
    pub entities: Entities,
}

/// 可复用定义的两种变体。组没有稳定的外部标识，组件以 GUID 作为键。
#[derive(Debug, Clone, Copy)]
pub enum Definition<'a> {
    Group(&'a Group),
    Component(&'a Component),
}

impl<'a> Definition<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Definition::Group(group) => &group.name,
            Definition::Component(component) => &component.name,
        }
    }

    pub fn guid(&self) -> Option<&'a str> {
        match self {
            Definition::Group(_) => None,
            Definition::Component(component) => Some(&component.guid),
        }
    }

    pub fn entities(&self) -> &'a Entities {
        match self {
            Definition::Group(group) => &group.entities,
            Definition::Component(component) => &component.entities,
        }
    }

    /// 仅组参与材质继承。
    pub fn material(&self) -> Option<&'a MaterialRef> {
        match self {
            Definition::Group(group) => Some(&group.material),
            Definition::Component(_) => None,
        }
    }
}

/// 拥有实例与嵌套组的容器能力，解析器对其泛型实现。
pub trait InstanceContainer {
    fn instances(&self) -> &[Instance];
    fn instances_mut(&mut self) -> &mut [Instance];
    fn nested_groups(&self) -> &[Group];
    fn nested_groups_mut(&mut self) -> &mut [Group];
}

impl InstanceContainer for Entities {
    fn instances(&self) -> &[Instance] {
        &self.instances
    }

    fn instances_mut(&mut self) -> &mut [Instance] {
        &mut self.instances
    }

    fn nested_groups(&self) -> &[Group] {
        &self.groups
    }

    fn nested_groups_mut(&mut self) -> &mut [Group] {
        &mut self.groups
    }
}

impl InstanceContainer for Group {
    fn instances(&self) -> &[Instance] {
        &self.entities.instances
    }

    fn instances_mut(&mut self) -> &mut [Instance] {
        &mut self.entities.instances
    }

    fn nested_groups(&self) -> &[Group] {
        &self.entities.groups
    }

    fn nested_groups_mut(&mut self) -> &mut [Group] {
        &mut self.entities.groups
    }
}

impl InstanceContainer for Component {
    fn instances(&self) -> &[Instance] {
        &self.entities.instances
    }

    fn instances_mut(&mut self) -> &mut [Instance] {
        &mut self.entities.instances
    }

    fn nested_groups(&self) -> &[Group] {
        &self.entities.groups
    }

    fn nested_groups_mut(&mut self) -> &mut [Group] {
        &mut self.entities.groups
    }
}

/// GUID 到组件索引的映射。
#[derive(Debug, Clone, Default)]
pub struct ComponentIndex {
    by_guid: HashMap<String, ComponentId>,
}

impl ComponentIndex {
    #[inline]
    pub fn lookup(&self, guid: &str) -> Option<ComponentId> {
        self.by_guid.get(guid).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.by_guid.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_guid.is_empty()
    }
}

/// 组件定义表：按插入顺序存放，按 GUID 去重（首次出现者优先）。
#[derive(Debug, Clone, Default)]
pub struct ComponentTable {
    components: Vec<Component>,
    index: ComponentIndex,
}

impl ComponentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入组件定义；GUID 已存在时丢弃新定义并返回 `None`。
    pub fn insert(&mut self, component: Component) -> Option<ComponentId> {
        if self.index.by_guid.contains_key(&component.guid) {
            return None;
        }
        let id = ComponentId(self.components.len());
        self.index.by_guid.insert(component.guid.clone(), id);
        self.components.push(component);
        Some(id)
    }

    #[inline]
    pub fn get(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.0)
    }

    #[inline]
    pub fn get_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(id.0)
    }

    #[inline]
    pub fn id_of(&self, guid: &str) -> Option<ComponentId> {
        self.index.lookup(guid)
    }

    #[inline]
    pub fn by_guid(&self, guid: &str) -> Option<&Component> {
        self.id_of(guid).and_then(|id| self.get(id))
    }

    #[inline]
    pub fn ids(&self) -> impl Iterator<Item = ComponentId> + use<> {
        (0..self.components.len()).map(ComponentId)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.components
            .iter()
            .enumerate()
            .map(|(idx, component)| (ComponentId(idx), component))
    }

    /// 同时借出只读索引与可变组件切片，供解析器在遍历中查表并回写。
    #[inline]
    pub fn split_mut(&mut self) -> (&ComponentIndex, &mut [Component]) {
        (&self.index, &mut self.components)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// 解析时发现的循环引用，`path` 为从遍历根到重复访问处的 GUID 序列。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclicReference {
    pub path: Vec<String>,
}

impl CyclicReference {
    /// 被重复访问的组件 GUID。
    pub fn revisited(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }
}

/// 场景图的根聚合。
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub surfaces: Vec<Surface>,
    pub curves: Vec<Curve>,
    pub edges: Vec<Edge>,
    pub layers: Vec<Layer>,
    pub groups: Vec<Group>,
    pub instances: Vec<Instance>,
    pub materials: MaterialTable,
    pub components: ComponentTable,
    /// 源文件格式新于当前支持的最高版本。
    pub more_recent_file_version: bool,
    pub cyclic_references: Vec<CyclicReference>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回实例已解析的父组件定义。
    #[inline]
    pub fn parent_of(&self, instance: &Instance) -> Option<&Component> {
        instance.parent.and_then(|id| self.components.get(id))
    }

    /// 按深度优先顺序列出全部定义：顶层组（含嵌套组）在前，组件表在后。
    pub fn definitions(&self) -> Vec<Definition<'_>> {
        let mut out = Vec::new();
        for group in &self.groups {
            collect_groups(group, &mut out);
        }
        for (_, component) in self.components.iter() {
            out.push(Definition::Component(component));
            for group in &component.entities.groups {
                collect_groups(group, &mut out);
            }
        }
        out
    }

    /// 对模型中每个实例（顶层、组内、组件内）调用 `visit`。
    pub fn for_each_instance<'a>(&'a self, mut visit: impl FnMut(&'a Instance)) {
        visit_container(self, &mut visit);
        for (_, component) in self.components.iter() {
            visit_container(component, &mut visit);
        }
    }

    pub fn instance_count(&self) -> usize {
        let mut count = 0;
        self.for_each_instance(|_| count += 1);
        count
    }

    pub fn dangling_instance_count(&self) -> usize {
        let mut count = 0;
        self.for_each_instance(|instance| {
            if !instance.is_resolved() {
                count += 1;
            }
        });
        count
    }

    /// 仅包含顶层几何，没有任何组、组件或实例。
    pub fn is_flat(&self) -> bool {
        self.groups.is_empty() && self.instances.is_empty() && self.components.is_empty()
    }

    /// 顶层几何的包围盒。
    pub fn bounds(&self) -> Option<Bounds3D> {
        let mut bounds = Bounds3D::empty();
        for surface in &self.surfaces {
            for point in &surface.outer_loop {
                bounds.include_point(*point);
            }
        }
        for edge in &self.edges {
            bounds.include_point(edge.start);
            bounds.include_point(edge.end);
        }
        for curve in &self.curves {
            for point in &curve.points {
                bounds.include_point(*point);
            }
        }
        if bounds.is_empty() { None } else { Some(bounds) }
    }
}

impl InstanceContainer for Model {
    fn instances(&self) -> &[Instance] {
        &self.instances
    }

    fn instances_mut(&mut self) -> &mut [Instance] {
        &mut self.instances
    }

    fn nested_groups(&self) -> &[Group] {
        &self.groups
    }

    fn nested_groups_mut(&mut self) -> &mut [Group] {
        &mut self.groups
    }
}

fn collect_groups<'a>(group: &'a Group, out: &mut Vec<Definition<'a>>) {
    out.push(Definition::Group(group));
    for nested in &group.entities.groups {
        collect_groups(nested, out);
    }
}

fn visit_container<'a, C, F>(container: &'a C, visit: &mut F)
where
    C: InstanceContainer + ?Sized,
    F: FnMut(&'a Instance),
{
    for instance in container.instances() {
        visit(instance);
    }
    for group in container.nested_groups() {
        visit_container(group, visit);
    }
}
