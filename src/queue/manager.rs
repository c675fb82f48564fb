use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use crate::backends::{BackendRegistry, TransferWorkerFactory};
use crate::config::QueueConfig;
use crate::history::{HistoryRecorder, NullRecorder};
use crate::notify::{LogPresenter, NotificationPresenter};
use crate::prepare::{FilePreparer, ImagePreparer};
use super::errors::{Result, UploadError};
use super::types::{QueueCommand, UploadJob};
use super::worker::QueueWorker;

/// 上传队列句柄
///
/// 可以随意克隆；所有克隆共享同一个队列任务。
#[derive(Clone)]
pub struct UploadQueue {
    command_tx: mpsc::Sender<QueueCommand>,
}

/// 队列句柄 + 队列任务
pub struct UploadQueueHandle {
    pub queue: UploadQueue,
    pub worker_handle: JoinHandle<()>,
}

impl UploadQueueHandle {
    /// 关闭队列并等待队列任务退出
    ///
    /// 还在传输中的任务会收到取消信号。调用方持有的其他
    /// [`UploadQueue`] 克隆也要释放，队列任务才会退出。
    pub async fn shutdown(self) -> Result<()> {
        drop(self.queue);
        self.worker_handle
            .await
            .map_err(|err| UploadError::internal(format!("Queue worker panic: {}", err)))
    }
}

impl UploadQueue {
    /// Enqueue an upload job
    ///
    /// Returns the number of pending jobs after admission. If the queue
    /// is idle the job starts immediately.
    pub async fn enqueue(&self, job: UploadJob) -> Result<usize> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(QueueCommand::Enqueue {
                job,
                reply: reply_tx,
            })
            .await
            .map_err(|_| UploadError::QueueShutdown)?;

        reply_rx.await.map_err(|_| UploadError::QueueShutdown)?
    }

    /// Request cancellation of the active transfer
    ///
    /// Advisory: the backend observes the signal and reports a cancelled
    /// outcome. Calling this while idle is a no-op.
    pub async fn cancel(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(QueueCommand::Cancel { reply: reply_tx })
            .await
            .map_err(|_| UploadError::QueueShutdown)?;

        reply_rx.await.map_err(|_| UploadError::QueueShutdown)
    }
}

/// 队列构建器
pub struct UploadQueueBuilder {
    config: QueueConfig,
    registry: BackendRegistry,
    preparer: Option<Arc<dyn FilePreparer>>,
    recorder: Option<Arc<dyn HistoryRecorder>>,
    presenter: Option<Arc<dyn NotificationPresenter>>,
}

impl UploadQueueBuilder {
    pub fn new() -> Self {
        Self {
            config: QueueConfig::default(),
            registry: BackendRegistry::new(),
            preparer: None,
            recorder: None,
            presenter: None,
        }
    }

    pub fn config(mut self, config: QueueConfig) -> Self {
        self.config = config;
        self
    }

    /// 注册一个传输后端
    pub fn register_backend(mut self, factory: Arc<dyn TransferWorkerFactory>) -> Self {
        self.registry.register(factory);
        self
    }

    pub fn preparer(mut self, preparer: Arc<dyn FilePreparer>) -> Self {
        self.preparer = Some(preparer);
        self
    }

    pub fn recorder(mut self, recorder: Arc<dyn HistoryRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn presenter(mut self, presenter: Arc<dyn NotificationPresenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    /// 启动队列任务并返回句柄
    pub fn build(self) -> UploadQueueHandle {
        let (command_tx, command_rx) = mpsc::channel(100);

        tracing::debug!(backends = ?self.registry.names(), "starting upload queue");

        let worker = QueueWorker::new(
            self.config,
            Arc::new(self.registry),
            self.preparer.unwrap_or_else(|| Arc::new(ImagePreparer)),
            self.recorder.unwrap_or_else(|| Arc::new(NullRecorder)),
            self.presenter.unwrap_or_else(|| Arc::new(LogPresenter)),
        );
        let worker_handle = tokio::spawn(worker.run(command_rx));

        UploadQueueHandle {
            queue: UploadQueue { command_tx },
            worker_handle,
        }
    }
}

impl Default for UploadQueueBuilder {
    fn default() -> Self {
        Self::new()
    }
}
