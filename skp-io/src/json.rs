use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use skp_core::records::{
    ComponentRecord, CurveRecord, DocumentRecords, EdgeRecord, GroupRecord, InstanceRecord,
    LayerRecord, MaterialRecord, SurfaceRecord,
};

use crate::kernel::{
    DocumentHandle, FormatVersion, Kernel, KernelError, LoadStatus, OpenDocuments,
};

/// 以 JSON 快照为文档格式的文件内核。
///
/// 文件内容即 [`DocumentRecords`]；`format_version` 为发布年份，
/// 新于支持的最高版本时以 [`LoadStatus::SuccessMoreRecent`] 打开。
#[derive(Debug, Default)]
pub struct JsonKernel {
    open: OpenDocuments,
}

impl JsonKernel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_records(path: &Path) -> Result<DocumentRecords, KernelError> {
        let data = fs::read_to_string(path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                KernelError::NotFound(path.to_path_buf())
            } else {
                KernelError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let parse = |source| KernelError::Parse {
            path: path.to_path_buf(),
            source,
        };
        // 组可以任意深度嵌套，解码时不设递归上限，由 serde_stacker 按需扩栈。
        let mut deserializer = serde_json::Deserializer::from_str(&data);
        deserializer.disable_recursion_limit();
        let records = DocumentRecords::deserialize(serde_stacker::Deserializer::new(
            &mut deserializer,
        ))
        .map_err(parse)?;
        deserializer.end().map_err(parse)?;
        Ok(records)
    }

    pub fn write_records(path: &Path, records: &DocumentRecords) -> Result<(), KernelError> {
        let data = serde_json::to_string_pretty(records).map_err(KernelError::Encode)?;
        fs::write(path, data).map_err(|source| KernelError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Kernel for JsonKernel {
    fn open_document(&mut self, path: &Path) -> Result<(DocumentHandle, LoadStatus), KernelError> {
        let records = Self::read_records(path)?;
        let status = LoadStatus::for_format_version(records.format_version);
        debug!(
            path = %path.display(),
            format_version = records.format_version,
            ?status,
            "打开 JSON 文档"
        );
        Ok((self.open.insert(records), status))
    }

    fn create_document(&mut self) -> Result<DocumentHandle, KernelError> {
        Ok(self.open.insert(DocumentRecords {
            format_version: FormatVersion::LATEST.year(),
            ..DocumentRecords::default()
        }))
    }

    fn materials(&self, handle: DocumentHandle) -> Result<Vec<MaterialRecord>, KernelError> {
        Ok(self.open.get(handle)?.materials.clone())
    }

    fn layers(&self, handle: DocumentHandle) -> Result<Vec<LayerRecord>, KernelError> {
        Ok(self.open.get(handle)?.layers.clone())
    }

    fn groups(&self, handle: DocumentHandle) -> Result<Vec<GroupRecord>, KernelError> {
        Ok(self.open.get(handle)?.entities.groups.clone())
    }

    fn component_definitions(
        &self,
        handle: DocumentHandle,
    ) -> Result<Vec<ComponentRecord>, KernelError> {
        Ok(self.open.get(handle)?.components.clone())
    }

    fn instances(&self, handle: DocumentHandle) -> Result<Vec<InstanceRecord>, KernelError> {
        Ok(self.open.get(handle)?.entities.instances.clone())
    }

    fn surfaces(&self, handle: DocumentHandle) -> Result<Vec<SurfaceRecord>, KernelError> {
        Ok(self.open.get(handle)?.entities.surfaces.clone())
    }

    fn curves(&self, handle: DocumentHandle) -> Result<Vec<CurveRecord>, KernelError> {
        Ok(self.open.get(handle)?.entities.curves.clone())
    }

    fn edges(&self, handle: DocumentHandle) -> Result<Vec<EdgeRecord>, KernelError> {
        Ok(self.open.get(handle)?.entities.edges.clone())
    }

    fn append_geometry(
        &mut self,
        handle: DocumentHandle,
        surfaces: &[SurfaceRecord],
        edges: &[EdgeRecord],
        curves: &[CurveRecord],
    ) -> Result<(), KernelError> {
        self.open.append(handle, surfaces, edges, curves)
    }

    fn save_document(
        &mut self,
        handle: DocumentHandle,
        path: &Path,
        version: Option<FormatVersion>,
    ) -> Result<(), KernelError> {
        let records = self.open.prepare_save(handle, version)?;
        Self::write_records(path, &records)?;
        debug!(
            path = %path.display(),
            format_version = records.format_version,
            "保存 JSON 文档"
        );
        Ok(())
    }

    fn close_document(&mut self, handle: DocumentHandle) {
        self.open.remove(handle);
    }
}
