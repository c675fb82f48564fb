use std::path::PathBuf;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;
use super::errors::Result;

/// 上传任务唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 活动任务所处阶段
///
/// 队列空闲时没有活动任务；其余的生命周期终点（完成/失败/取消）
/// 通过传输结果回调传递，不在这里建模。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    /// 准备中（读取源文件并处理图片）
    Preparing,
    /// 上传中
    Uploading,
}

/// 文件内容来源
#[derive(Debug, Clone)]
pub enum FileData {
    /// 磁盘文件
    Path(PathBuf),
    /// 内存中的字节（例如图片预处理之后）
    Bytes(Bytes),
}

/// 待上传的文件引用
#[derive(Debug, Clone)]
pub struct FileSource {
    pub file_name: String,
    pub mime: String,
    pub data: FileData,
}

impl FileSource {
    pub fn from_path(
        file_name: impl Into<String>,
        mime: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            data: FileData::Path(path.into()),
        }
    }

    pub fn from_bytes(
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            data: FileData::Bytes(bytes.into()),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    /// Total size in bytes of the underlying source
    pub async fn len(&self) -> Result<u64> {
        match &self.data {
            FileData::Path(path) => Ok(tokio::fs::metadata(path).await?.len()),
            FileData::Bytes(bytes) => Ok(bytes.len() as u64),
        }
    }

    /// 用处理后的字节替换原始来源
    pub fn replace_bytes(&mut self, bytes: impl Into<Bytes>) {
        self.data = FileData::Bytes(bytes.into());
    }
}

/// 入队的上传请求
///
/// 入队后不可变；出队时所有权转移给活动任务。
#[derive(Debug, Clone)]
pub struct UploadJob {
    /// 目标后端名称（注册表中的键）
    pub backend: String,
    /// 文件引用
    pub file: FileSource,
    /// 上传前是否重新压缩（仅图片）
    pub compress: bool,
}

impl UploadJob {
    pub fn new(backend: impl Into<String>, file: FileSource) -> Self {
        Self {
            backend: backend.into(),
            file,
            compress: false,
        }
    }

    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

/// 队列命令
pub(crate) enum QueueCommand {
    /// 入队，返回等待中的任务数
    Enqueue {
        job: UploadJob,
        reply: oneshot::Sender<Result<usize>>,
    },
    /// 取消当前活动任务（空闲时为无操作）
    Cancel {
        reply: oneshot::Sender<()>,
    },
}

/// 传输任务发回队列的信号
pub(crate) enum TransferSignal {
    Progress {
        id: JobId,
        sent: u64,
        total: u64,
    },
    Done {
        id: JobId,
        outcome: Result<String>,
    },
}

/// 传输过程中的进度上报句柄
///
/// 后端实现对每个读出的数据块调用 [`ProgressSender::send`]，
/// 频率限制由队列侧负责。
#[derive(Clone)]
pub struct ProgressSender {
    pub(crate) id: JobId,
    pub(crate) tx: mpsc::UnboundedSender<TransferSignal>,
}

impl ProgressSender {
    pub fn send(&self, sent: u64, total: u64) {
        let _ = self.tx.send(TransferSignal::Progress {
            id: self.id,
            sent,
            total,
        });
    }
}
