//! 几何内核边界：内核契约、文档句柄、版本标签与会话守卫。

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::trace;

use skp_core::records::{
    ComponentRecord, CurveRecord, DocumentRecords, EdgeRecord, EntitiesRecord, GroupRecord,
    InstanceRecord, LayerRecord, MaterialRecord, SurfaceRecord,
};
use skp_engine::flatten::FlatGeometry;

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("failed to read document {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write document {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid document {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("document not found: {0:?}")]
    NotFound(PathBuf),
    #[error("unknown document handle {0}")]
    UnknownHandle(u64),
    #[error("no document is open in the kernel session")]
    NoOpenDocument,
    #[error("kernel rejected {0}")]
    Rejected(String),
}

/// 内核分配的文档句柄。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Success,
    /// 文件格式新于内核支持的版本，数据仍尽可能解码。
    SuccessMoreRecent,
}

impl LoadStatus {
    /// 按文档记录的发布年份判定加载状态。
    pub fn for_format_version(year: u32) -> Self {
        if year > FormatVersion::LATEST.year() {
            LoadStatus::SuccessMoreRecent
        } else {
            LoadStatus::Success
        }
    }

    #[inline]
    pub fn is_more_recent(self) -> bool {
        matches!(self, LoadStatus::SuccessMoreRecent)
    }
}

/// 支持写出的文档格式版本，每个发布线一个标签。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormatVersion {
    V2013,
    V2014,
    V2015,
    V2016,
    V2017,
    V2018,
    V2019,
    V2020,
    V2021,
}

impl FormatVersion {
    pub const LATEST: FormatVersion = FormatVersion::V2021;

    pub const ALL: [FormatVersion; 9] = [
        FormatVersion::V2013,
        FormatVersion::V2014,
        FormatVersion::V2015,
        FormatVersion::V2016,
        FormatVersion::V2017,
        FormatVersion::V2018,
        FormatVersion::V2019,
        FormatVersion::V2020,
        FormatVersion::V2021,
    ];

    pub fn year(self) -> u32 {
        match self {
            FormatVersion::V2013 => 2013,
            FormatVersion::V2014 => 2014,
            FormatVersion::V2015 => 2015,
            FormatVersion::V2016 => 2016,
            FormatVersion::V2017 => 2017,
            FormatVersion::V2018 => 2018,
            FormatVersion::V2019 => 2019,
            FormatVersion::V2020 => 2020,
            FormatVersion::V2021 => 2021,
        }
    }

    pub fn from_year(year: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|version| version.year() == year)
    }

    /// 解析 `V2019` / `SU2019` / `2019` 形式的标签；无法识别时回退到最新版本。
    pub fn from_tag(tag: &str) -> Self {
        let trimmed = tag.trim();
        let digits = trimmed
            .strip_prefix(|c: char| c == 'V' || c == 'v')
            .or_else(|| {
                trimmed
                    .get(..2)
                    .filter(|prefix| prefix.eq_ignore_ascii_case("su"))
                    .map(|_| &trimmed[2..])
            })
            .unwrap_or(trimmed);
        digits
            .parse::<u32>()
            .ok()
            .and_then(Self::from_year)
            .unwrap_or(Self::LATEST)
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.year())
    }
}

/// 外部几何内核的契约。实现者只负责扁平记录的读写，不做对象图构建。
pub trait Kernel {
    /// 进程级内核状态初始化，由 [`KernelSession`] 在会话开始时调用。
    fn initialize(&mut self) {}

    fn terminate(&mut self) {}

    fn open_document(&mut self, path: &Path) -> Result<(DocumentHandle, LoadStatus), KernelError>;

    fn create_document(&mut self) -> Result<DocumentHandle, KernelError>;

    fn materials(&self, handle: DocumentHandle) -> Result<Vec<MaterialRecord>, KernelError>;

    fn layers(&self, handle: DocumentHandle) -> Result<Vec<LayerRecord>, KernelError>;

    fn groups(&self, handle: DocumentHandle) -> Result<Vec<GroupRecord>, KernelError>;

    fn component_definitions(
        &self,
        handle: DocumentHandle,
    ) -> Result<Vec<ComponentRecord>, KernelError>;

    fn instances(&self, handle: DocumentHandle) -> Result<Vec<InstanceRecord>, KernelError>;

    fn surfaces(&self, handle: DocumentHandle) -> Result<Vec<SurfaceRecord>, KernelError>;

    fn curves(&self, handle: DocumentHandle) -> Result<Vec<CurveRecord>, KernelError>;

    fn edges(&self, handle: DocumentHandle) -> Result<Vec<EdgeRecord>, KernelError>;

    fn append_geometry(
        &mut self,
        handle: DocumentHandle,
        surfaces: &[SurfaceRecord],
        edges: &[EdgeRecord],
        curves: &[CurveRecord],
    ) -> Result<(), KernelError>;

    /// `version` 为 `None` 时保持文档原有版本。
    fn save_document(
        &mut self,
        handle: DocumentHandle,
        path: &Path,
        version: Option<FormatVersion>,
    ) -> Result<(), KernelError>;

    fn close_document(&mut self, handle: DocumentHandle);
}

/// 内核会话守卫：构造时初始化内核，析构时关闭已打开的文档并终止内核，
/// 包括 `?` 提前返回在内的所有退出路径。
pub struct KernelSession<'k, K: Kernel + ?Sized> {
    kernel: &'k mut K,
    document: Option<DocumentHandle>,
}

impl<'k, K: Kernel + ?Sized> KernelSession<'k, K> {
    pub fn begin(kernel: &'k mut K) -> Self {
        kernel.initialize();
        trace!("内核会话开始");
        Self {
            kernel,
            document: None,
        }
    }

    pub fn open(&mut self, path: &Path) -> Result<LoadStatus, KernelError> {
        self.release_document();
        let (handle, status) = self.kernel.open_document(path)?;
        self.document = Some(handle);
        Ok(status)
    }

    pub fn create(&mut self) -> Result<(), KernelError> {
        self.release_document();
        let handle = self.kernel.create_document()?;
        self.document = Some(handle);
        Ok(())
    }

    #[inline]
    pub fn handle(&self) -> Result<DocumentHandle, KernelError> {
        self.document.ok_or(KernelError::NoOpenDocument)
    }

    /// 读取当前文档的全部扁平记录。
    pub fn snapshot(&self) -> Result<DocumentRecords, KernelError> {
        let handle = self.handle()?;
        let kernel = &*self.kernel;
        Ok(DocumentRecords {
            format_version: 0,
            materials: kernel.materials(handle)?,
            layers: kernel.layers(handle)?,
            components: kernel.component_definitions(handle)?,
            entities: EntitiesRecord {
                surfaces: kernel.surfaces(handle)?,
                curves: kernel.curves(handle)?,
                edges: kernel.edges(handle)?,
                groups: kernel.groups(handle)?,
                instances: kernel.instances(handle)?,
            },
        })
    }

    pub fn append(&mut self, geometry: &FlatGeometry) -> Result<(), KernelError> {
        let handle = self.handle()?;
        self.kernel.append_geometry(
            handle,
            &geometry.surfaces,
            &geometry.edges,
            &geometry.curves,
        )
    }

    pub fn save(&mut self, path: &Path, version: Option<FormatVersion>) -> Result<(), KernelError> {
        let handle = self.handle()?;
        self.kernel.save_document(handle, path, version)
    }

    fn release_document(&mut self) {
        if let Some(handle) = self.document.take() {
            self.kernel.close_document(handle);
        }
    }
}

impl<K: Kernel + ?Sized> Drop for KernelSession<'_, K> {
    fn drop(&mut self) {
        self.release_document();
        self.kernel.terminate();
        trace!("内核会话结束");
    }
}

/// 已打开文档的句柄表，供基于快照的内核实现共用。
#[derive(Debug, Default)]
pub struct OpenDocuments {
    documents: HashMap<DocumentHandle, DocumentRecords>,
    next_handle: u64,
}

impl OpenDocuments {
    pub fn insert(&mut self, records: DocumentRecords) -> DocumentHandle {
        self.next_handle += 1;
        let handle = DocumentHandle(self.next_handle);
        self.documents.insert(handle, records);
        handle
    }

    pub fn get(&self, handle: DocumentHandle) -> Result<&DocumentRecords, KernelError> {
        self.documents
            .get(&handle)
            .ok_or(KernelError::UnknownHandle(handle.get()))
    }

    pub fn get_mut(&mut self, handle: DocumentHandle) -> Result<&mut DocumentRecords, KernelError> {
        self.documents
            .get_mut(&handle)
            .ok_or(KernelError::UnknownHandle(handle.get()))
    }

    pub fn remove(&mut self, handle: DocumentHandle) -> Option<DocumentRecords> {
        self.documents.remove(&handle)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// 把几何追加到文档顶层集合末尾。
    pub fn append(
        &mut self,
        handle: DocumentHandle,
        surfaces: &[SurfaceRecord],
        edges: &[EdgeRecord],
        curves: &[CurveRecord],
    ) -> Result<(), KernelError> {
        let entities = &mut self.get_mut(handle)?.entities;
        entities.surfaces.extend_from_slice(surfaces);
        entities.edges.extend_from_slice(edges);
        entities.curves.extend_from_slice(curves);
        Ok(())
    }

    /// 取出用于写盘的快照，版本为 `None` 时沿用文档原有版本。
    pub fn prepare_save(
        &self,
        handle: DocumentHandle,
        version: Option<FormatVersion>,
    ) -> Result<DocumentRecords, KernelError> {
        let mut records = self.get(handle)?.clone();
        if let Some(version) = version {
            records.format_version = version.year();
        }
        Ok(records)
    }
}
