use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use crate::queue::errors::Result;
use crate::queue::types::{FileSource, ProgressSender};

/// 传输后端 - 每个任务创建一个实例
///
/// 取消是协作式的：实现方必须自己观察 `cancel` 并在有限时间内
/// 返回 [`crate::UploadError::Cancelled`]，队列不会强制终止任务。
#[async_trait]
pub trait TransferWorker: Send {
    /// 执行传输，成功时返回结果链接
    async fn run(
        self: Box<Self>,
        file: FileSource,
        progress: ProgressSender,
        cancel: CancellationToken,
    ) -> Result<String>;
}

/// 后端工厂
pub trait TransferWorkerFactory: Send + Sync {
    /// 注册表中使用的后端名称
    fn name(&self) -> &str;

    /// 创建传输实例
    fn create(&self) -> Box<dyn TransferWorker>;
}
