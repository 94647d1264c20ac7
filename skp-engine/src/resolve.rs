//! 实例解析：为每个实例回填所属组件定义的索引。
//!
//! 遍历从顶层实例、顶层组以及组件表中每个条目出发，深度优先展开已解析的组件。
//! 每个组件在一次解析中至多展开一次；当前路径上的组件被再次引用时停止下探，
//! 并记录为循环引用。下探使用显式栈，引用链的长度不受线程栈大小限制。

use std::collections::HashSet;

use tracing::{debug, warn};

use skp_core::model::{
    Component, ComponentId, ComponentIndex, CyclicReference, Instance, InstanceContainer, Model,
};

/// 一次解析的统计结果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    pub resolved: usize,
    pub dangling: usize,
    pub cycles: Vec<CyclicReference>,
}

/// 解析模型中所有实例的父引用，并把发现的循环写入 `model.cyclic_references`。
pub fn resolve_instances(model: &mut Model) -> ResolutionReport {
    let roots: Vec<ComponentId> = model.components.ids().collect();
    let (index, components) = model.components.split_mut();
    let mut walker = Walker::new(index);

    let mut found = Vec::new();
    walker.link_instances(&mut model.instances, &mut found);
    for group in &mut model.groups {
        walker.link_container(group, &mut found);
    }
    walker.descend(components, found);
    walker.descend(components, roots);

    let report = walker.report;
    for cycle in &report.cycles {
        warn!(
            revisited = cycle.revisited().unwrap_or_default(),
            path = %cycle.path.join(" -> "),
            "检测到组件定义循环引用"
        );
    }
    debug!(
        resolved = report.resolved,
        dangling = report.dangling,
        cycles = report.cycles.len(),
        "实例解析完成"
    );
    model.cyclic_references = report.cycles.clone();
    report
}

/// 下探栈的一层：正在展开的组件（根层为 `None`）及其尚未访问的子引用。
struct Frame {
    id: Option<ComponentId>,
    pending: std::vec::IntoIter<ComponentId>,
}

struct Walker<'a> {
    index: &'a ComponentIndex,
    path: Vec<ComponentId>,
    on_path: HashSet<ComponentId>,
    expanded: HashSet<ComponentId>,
    report: ResolutionReport,
}

impl<'a> Walker<'a> {
    fn new(index: &'a ComponentIndex) -> Self {
        Self {
            index,
            path: Vec::new(),
            on_path: HashSet::new(),
            expanded: HashSet::new(),
            report: ResolutionReport::default(),
        }
    }

    /// 解析容器（含嵌套组）直接拥有的实例，把命中的组件追加到 `found`。
    fn link_container<C>(&mut self, container: &mut C, found: &mut Vec<ComponentId>)
    where
        C: InstanceContainer + ?Sized,
    {
        self.link_instances(container.instances_mut(), found);
        for group in container.nested_groups_mut() {
            self.link_container(group, found);
        }
    }

    fn link_instances(&mut self, instances: &mut [Instance], found: &mut Vec<ComponentId>) {
        for instance in instances {
            instance.parent = self.index.lookup(&instance.parent_id);
            match instance.parent {
                Some(id) => {
                    self.report.resolved += 1;
                    found.push(id);
                }
                None => {
                    self.report.dangling += 1;
                    debug!(
                        instance = %instance.name,
                        parent_id = %instance.parent_id,
                        "实例引用的定义不存在"
                    );
                }
            }
        }
    }

    fn descend(&mut self, components: &mut [Component], targets: Vec<ComponentId>) {
        let mut stack = vec![Frame {
            id: None,
            pending: targets.into_iter(),
        }];
        while let Some(frame) = stack.last_mut() {
            let Some(id) = frame.pending.next() else {
                let finished = frame.id;
                stack.pop();
                if let Some(done) = finished {
                    self.path.pop();
                    self.on_path.remove(&done);
                }
                continue;
            };

            if self.on_path.contains(&id) {
                let cycle = self.cycle_through(components, id);
                self.report.cycles.push(cycle);
                continue;
            }
            if !self.expanded.insert(id) {
                continue;
            }
            let Some(component) = components.get_mut(id.get()) else {
                continue;
            };

            let mut found = Vec::new();
            self.link_container(component, &mut found);

            self.on_path.insert(id);
            self.path.push(id);
            stack.push(Frame {
                id: Some(id),
                pending: found.into_iter(),
            });
        }
    }

    fn cycle_through(&self, components: &[Component], revisited: ComponentId) -> CyclicReference {
        let start = self
            .path
            .iter()
            .position(|id| *id == revisited)
            .unwrap_or(0);
        let guid_of = |id: &ComponentId| {
            components
                .get(id.get())
                .map(|component| component.guid.clone())
                .unwrap_or_default()
        };
        let mut path: Vec<String> = self.path[start..].iter().map(guid_of).collect();
        path.push(guid_of(&revisited));
        CyclicReference { path }
    }
}
