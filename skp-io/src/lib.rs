pub mod json;
pub mod kernel;
pub mod memory;

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use skp_core::model::Model;
use skp_engine::flatten::flatten;
use skp_engine::pipeline::{LoadOptions, build_model};

pub use json::JsonKernel;
pub use kernel::{
    DocumentHandle, FormatVersion, Kernel, KernelError, KernelSession, LoadStatus,
};
pub use memory::MemoryKernel;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("{operation} failed: {source}")]
    Kernel {
        operation: &'static str,
        #[source]
        source: KernelError,
    },
}

impl IoError {
    fn during(operation: &'static str) -> impl FnOnce(KernelError) -> IoError {
        move |source| IoError::Kernel { operation, source }
    }

    pub fn kernel_error(&self) -> &KernelError {
        match self {
            IoError::Kernel { source, .. } => source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kernel_error(), KernelError::NotFound(_))
    }
}

pub trait ModelLoader {
    fn load(&mut self, path: &Path, options: LoadOptions) -> Result<Model, IoError>;
}

pub trait ModelSaver {
    fn save_as(
        &mut self,
        path: &Path,
        version: FormatVersion,
        new_path: &Path,
    ) -> Result<(), IoError>;

    fn append_to_document(&mut self, model: &Model, path: &Path) -> Result<(), IoError>;

    fn write_new_document(
        &mut self,
        model: &Model,
        path: &Path,
        version: FormatVersion,
    ) -> Result<(), IoError>;
}

/// 面向调用方的模型读写入口。每个操作都在独立的内核会话中完成，
/// 会话在操作返回前释放，失败路径也不例外。
pub struct ModelIo<K: Kernel> {
    kernel: K,
}

impl<K: Kernel> ModelIo<K> {
    pub fn new(kernel: K) -> Self {
        Self { kernel }
    }

    #[inline]
    pub fn kernel(&self) -> &K {
        &self.kernel
    }
}

impl ModelIo<JsonKernel> {
    pub fn json() -> Self {
        Self::new(JsonKernel::new())
    }
}

impl<K: Kernel> ModelLoader for ModelIo<K> {
    fn load(&mut self, path: &Path, options: LoadOptions) -> Result<Model, IoError> {
        let (records, status) = {
            let mut session = KernelSession::begin(&mut self.kernel);
            let status = session.open(path).map_err(IoError::during("open document"))?;
            let records = session
                .snapshot()
                .map_err(IoError::during("read document records"))?;
            (records, status)
        };

        let mut model = build_model(&records, options);
        if status.is_more_recent() {
            warn!(
                path = %path.display(),
                "文档格式新于支持的最高版本，已按可解码的数据加载"
            );
            model.more_recent_file_version = true;
        }
        info!(path = %path.display(), ?options, "模型加载完成");
        Ok(model)
    }
}

impl<K: Kernel> ModelSaver for ModelIo<K> {
    fn save_as(
        &mut self,
        path: &Path,
        version: FormatVersion,
        new_path: &Path,
    ) -> Result<(), IoError> {
        let mut session = KernelSession::begin(&mut self.kernel);
        session.open(path).map_err(IoError::during("open document"))?;
        session
            .save(new_path, Some(version))
            .map_err(IoError::during("save document"))?;
        info!(
            from = %path.display(),
            to = %new_path.display(),
            %version,
            "文档另存完成"
        );
        Ok(())
    }

    fn append_to_document(&mut self, model: &Model, path: &Path) -> Result<(), IoError> {
        let geometry = flatten(model);
        debug!(
            surfaces = geometry.surfaces.len(),
            edges = geometry.edges.len(),
            curves = geometry.curves.len(),
            "展平顶层几何"
        );
        let mut session = KernelSession::begin(&mut self.kernel);
        session.open(path).map_err(IoError::during("open document"))?;
        session
            .append(&geometry)
            .map_err(IoError::during("append geometry"))?;
        session
            .save(path, None)
            .map_err(IoError::during("save document"))?;
        info!(path = %path.display(), "几何已追加到文档");
        Ok(())
    }

    fn write_new_document(
        &mut self,
        model: &Model,
        path: &Path,
        version: FormatVersion,
    ) -> Result<(), IoError> {
        let geometry = flatten(model);
        let mut session = KernelSession::begin(&mut self.kernel);
        session
            .create()
            .map_err(IoError::during("create document"))?;
        session
            .append(&geometry)
            .map_err(IoError::during("append geometry"))?;
        session
            .save(path, Some(version))
            .map_err(IoError::during("save document"))?;
        info!(
            path = %path.display(),
            %version,
            surfaces = geometry.surfaces.len(),
            "新文档写出完成"
        );
        Ok(())
    }
}
