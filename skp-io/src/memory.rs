use std::collections::HashMap;
use std::path::{Path, PathBuf};

use skp_core::records::{
    ComponentRecord, CurveRecord, DocumentRecords, EdgeRecord, GroupRecord, InstanceRecord,
    LayerRecord, MaterialRecord, SurfaceRecord,
};

use crate::kernel::{
    DocumentHandle, FormatVersion, Kernel, KernelError, LoadStatus, OpenDocuments,
};

/// 会话生命周期计数，用于确认会话守卫在每条退出路径上都释放了资源。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionLog {
    pub initialized: usize,
    pub terminated: usize,
    pub opened: usize,
    pub closed: usize,
}

/// 进程内内核：以路径为键保存文档快照，不访问文件系统。
#[derive(Debug, Default)]
pub struct MemoryKernel {
    stored: HashMap<PathBuf, DocumentRecords>,
    open: OpenDocuments,
    log: SessionLog,
    rejected: Option<&'static str>,
}

impl MemoryKernel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, path: impl Into<PathBuf>, records: DocumentRecords) -> Self {
        self.stored.insert(path.into(), records);
        self
    }

    /// 让指定名称的内核调用失败（如 `"component_definitions"`、`"save_document"`）。
    pub fn rejecting(mut self, operation: &'static str) -> Self {
        self.rejected = Some(operation);
        self
    }

    pub fn document(&self, path: impl AsRef<Path>) -> Option<&DocumentRecords> {
        self.stored.get(path.as_ref())
    }

    #[inline]
    pub fn session_log(&self) -> SessionLog {
        self.log
    }

    #[inline]
    pub fn open_document_count(&self) -> usize {
        self.open.len()
    }

    fn check(&self, operation: &'static str) -> Result<(), KernelError> {
        if self.rejected == Some(operation) {
            Err(KernelError::Rejected(operation.to_string()))
        } else {
            Ok(())
        }
    }

    fn read<T>(
        &self,
        operation: &'static str,
        handle: DocumentHandle,
        select: impl FnOnce(&DocumentRecords) -> T,
    ) -> Result<T, KernelError> {
        self.check(operation)?;
        self.open.get(handle).map(select)
    }
}

impl Kernel for MemoryKernel {
    fn initialize(&mut self) {
        self.log.initialized += 1;
    }

    fn terminate(&mut self) {
        self.log.terminated += 1;
    }

    fn open_document(&mut self, path: &Path) -> Result<(DocumentHandle, LoadStatus), KernelError> {
        self.check("open_document")?;
        let records = self
            .stored
            .get(path)
            .cloned()
            .ok_or_else(|| KernelError::NotFound(path.to_path_buf()))?;
        let status = LoadStatus::for_format_version(records.format_version);
        self.log.opened += 1;
        Ok((self.open.insert(records), status))
    }

    fn create_document(&mut self) -> Result<DocumentHandle, KernelError> {
        self.check("create_document")?;
        self.log.opened += 1;
        Ok(self.open.insert(DocumentRecords {
            format_version: FormatVersion::LATEST.year(),
            ..DocumentRecords::default()
        }))
    }

    fn materials(&self, handle: DocumentHandle) -> Result<Vec<MaterialRecord>, KernelError> {
        self.read("materials", handle, |doc| doc.materials.clone())
    }

    fn layers(&self, handle: DocumentHandle) -> Result<Vec<LayerRecord>, KernelError> {
        self.read("layers", handle, |doc| doc.layers.clone())
    }

    fn groups(&self, handle: DocumentHandle) -> Result<Vec<GroupRecord>, KernelError> {
        self.read("groups", handle, |doc| doc.entities.groups.clone())
    }

    fn component_definitions(
        &self,
        handle: DocumentHandle,
    ) -> Result<Vec<ComponentRecord>, KernelError> {
        self.read("component_definitions", handle, |doc| doc.components.clone())
    }

    fn instances(&self, handle: DocumentHandle) -> Result<Vec<InstanceRecord>, KernelError> {
        self.read("instances", handle, |doc| doc.entities.instances.clone())
    }

    fn surfaces(&self, handle: DocumentHandle) -> Result<Vec<SurfaceRecord>, KernelError> {
        self.read("surfaces", handle, |doc| doc.entities.surfaces.clone())
    }

    fn curves(&self, handle: DocumentHandle) -> Result<Vec<CurveRecord>, KernelError> {
        self.read("curves", handle, |doc| doc.entities.curves.clone())
    }

    fn edges(&self, handle: DocumentHandle) -> Result<Vec<EdgeRecord>, KernelError> {
        self.read("edges", handle, |doc| doc.entities.edges.clone())
    }

    fn append_geometry(
        &mut self,
        handle: DocumentHandle,
        surfaces: &[SurfaceRecord],
        edges: &[EdgeRecord],
        curves: &[CurveRecord],
    ) -> Result<(), KernelError> {
        self.check("append_geometry")?;
        self.open.append(handle, surfaces, edges, curves)
    }

    fn save_document(
        &mut self,
        handle: DocumentHandle,
        path: &Path,
        version: Option<FormatVersion>,
    ) -> Result<(), KernelError> {
        self.check("save_document")?;
        let records = self.open.prepare_save(handle, version)?;
        self.stored.insert(path.to_path_buf(), records);
        Ok(())
    }

    fn close_document(&mut self, handle: DocumentHandle) {
        if self.open.remove(handle).is_some() {
            self.log.closed += 1;
        }
    }
}
