use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use crate::backends::{BackendRegistry, TransferWorkerFactory};
use crate::config::{QueueConfig, UnknownBackendPolicy};
use crate::history::{HistoryDraft, HistoryRecorder};
use crate::notify::{NotificationPresenter, PresenterOptions};
use crate::prepare::{FilePreparer, THUMBNAIL_QUALITY};
use crate::utils::format_duration;
use super::errors::{Result, UploadError};
use super::throttle::ProgressThrottle;
use super::types::{
    FileData,
    FileSource,
    JobId,
    JobPhase,
    ProgressSender,
    QueueCommand,
    TransferSignal,
    UploadJob,
};

/// 出队后的活动任务，终止时销毁
struct ActiveExecution {
    id: JobId,
    phase: JobPhase,
    cancel: CancellationToken,
    throttle: ProgressThrottle,
    started_at: Instant,
    draft: Option<HistoryDraft>,
}

/// 队列核心：FIFO 队列 + 单活动任务的状态机
///
/// 入队命令和传输回调都通过通道汇入 [`QueueWorker::run`] 的
/// 事件循环，队列内容和活动状态只被这一个任务读写。
pub(crate) struct QueueWorker {
    config: QueueConfig,
    registry: Arc<BackendRegistry>,
    preparer: Arc<dyn FilePreparer>,
    recorder: Arc<dyn HistoryRecorder>,
    presenter: Arc<dyn NotificationPresenter>,
    pending: VecDeque<UploadJob>,
    active: Option<ActiveExecution>,
    signal_tx: mpsc::UnboundedSender<TransferSignal>,
    signal_rx: mpsc::UnboundedReceiver<TransferSignal>,
}

impl QueueWorker {
    pub(crate) fn new(
        config: QueueConfig,
        registry: Arc<BackendRegistry>,
        preparer: Arc<dyn FilePreparer>,
        recorder: Arc<dyn HistoryRecorder>,
        presenter: Arc<dyn NotificationPresenter>,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();

        Self {
            config,
            registry,
            preparer,
            recorder,
            presenter,
            pending: VecDeque::new(),
            active: None,
            signal_tx,
            signal_rx,
        }
    }

    pub(crate) async fn run(mut self, mut command_rx: mpsc::Receiver<QueueCommand>) {
        // 主事件循环，命令与传输信号在这里串行处理
        loop {
            tokio::select! {
                command = command_rx.recv() => {
                    match command {
                        Some(command) => self.handle_command(command).await,
                        // 所有队列句柄都已释放
                        None => break,
                    }
                }
                Some(signal) = self.signal_rx.recv() => {
                    self.handle_signal(signal).await;
                }
            }
        }

        if let Some(active) = self.active.take() {
            tracing::info!(id = %active.id, phase = ?active.phase, "queue shutting down, cancelling active transfer");
            active.cancel.cancel();
        }
    }

    async fn handle_command(&mut self, command: QueueCommand) {
        match command {
            QueueCommand::Enqueue { job, reply } => {
                let result = self.enqueue(job).await;
                let _ = reply.send(result);
                self.start_next().await;
            }
            QueueCommand::Cancel { reply } => {
                self.cancel();
                let _ = reply.send(());
            }
        }
    }

    /// 追加到队尾；文件引用无法解析的任务在这里被拒绝
    async fn enqueue(&mut self, job: UploadJob) -> Result<usize> {
        if let FileData::Path(path) = &job.file.data {
            let metadata = tokio::fs::metadata(path).await.map_err(|err| {
                UploadError::admission(format!("unreadable file {}: {}", path.display(), err))
            })?;
            if !metadata.is_file() {
                return Err(UploadError::admission(format!(
                    "not a regular file: {}",
                    path.display()
                )));
            }
        }

        self.pending.push_back(job);
        let depth = self.pending.len();

        // 已有活动任务时告知展示层队列变长了
        if self.active.is_some() {
            self.presenter.set_queue_size(depth).await;
        }

        Ok(depth)
    }

    fn cancel(&self) {
        match &self.active {
            Some(active) => {
                tracing::info!(id = %active.id, phase = ?active.phase, "cancellation requested");
                active.cancel.cancel();
            }
            // 空闲时取消是无操作
            None => {}
        }
    }

    /// 尝试启动队首任务，同一时间最多一个活动任务
    async fn start_next(&mut self) {
        if self.active.is_some() {
            return;
        }

        while let Some(job) = self.pending.pop_front() {
            match self.start_job(job).await {
                Ok(()) => return,
                Err(UploadError::UnknownBackend(name)) => {
                    tracing::warn!(backend = %name, "no backend registered for job, dropping it");
                    if self.config.unknown_backend == UnknownBackendPolicy::Clear {
                        self.presenter
                            .error(&format!("no backend registered with name: {name}"))
                            .await;
                        self.discard_pending();
                        return;
                    }
                }
                Err(err) => {
                    // 预处理失败：回到空闲并继续队列中的下一个任务
                    tracing::warn!(error = %err, "file preparation failed, skipping job");
                }
            }
        }
    }

    async fn start_job(&mut self, job: UploadJob) -> Result<()> {
        let factory = self
            .registry
            .resolve(&job.backend)
            .ok_or_else(|| UploadError::UnknownBackend(job.backend.clone()))?;

        let id = JobId::new();
        let cancel = CancellationToken::new();
        self.active = Some(ActiveExecution {
            id,
            phase: JobPhase::Preparing,
            cancel: cancel.clone(),
            throttle: ProgressThrottle::new(self.config.updates_per_sec),
            started_at: Instant::now(),
            draft: None,
        });

        let UploadJob { mut file, compress, .. } = job;

        // 图片任务：同步读入、生成缩略图、按需重新压缩
        let thumbnail = if file.is_image() {
            match self.prepare_image(&mut file, compress).await {
                Ok(thumbnail) => Some(thumbnail),
                Err(err) => {
                    self.active = None;
                    return Err(err);
                }
            }
        } else {
            None
        };

        let draft = HistoryDraft {
            original_name: file.file_name.clone(),
            mime: file.mime.clone(),
            backend: factory.name().to_string(),
            thumbnail: thumbnail.clone(),
        };

        self.presenter.set_file_name(&file.file_name).await;
        self.presenter.set_thumbnail(thumbnail).await;
        self.presenter
            .begin_foreground(PresenterOptions {
                lights: self.config.notification_light,
                vibrate: self.config.notification_vibrate,
            })
            .await;

        tracing::info!(
            %id,
            backend = %draft.backend,
            file = %draft.original_name,
            "transfer started"
        );

        let worker = factory.create();
        let progress = ProgressSender {
            id,
            tx: self.signal_tx.clone(),
        };
        let signal_tx = self.signal_tx.clone();

        // 传输在自己的任务里执行，结果通过信号通道送回事件循环
        tokio::spawn(async move {
            let outcome = worker.run(file, progress, cancel).await;
            let _ = signal_tx.send(TransferSignal::Done { id, outcome });
        });

        if let Some(active) = self.active.as_mut() {
            active.phase = JobPhase::Uploading;
            active.draft = Some(draft);
        }

        Ok(())
    }

    async fn prepare_image(&self, file: &mut FileSource, compress: bool) -> Result<Bytes> {
        let original = self.preparer.read_all(file).await?;
        let decoded = self.preparer.decode(&original)?;
        let thumbnail = self
            .preparer
            .compress(&self.preparer.thumbnail(&decoded), THUMBNAIL_QUALITY)?;

        if compress {
            let resized = self.preparer.resize_to_fit(
                decoded,
                self.config.resize_width,
                self.config.resize_height,
            );
            let recompressed = self.preparer.compress(&resized, self.config.resize_quality)?;
            tracing::debug!(
                original = original.len(),
                recompressed = recompressed.len(),
                "image recompressed"
            );
            file.replace_bytes(recompressed);
        } else {
            // 源已整体读入内存，直接以字节形式继续
            file.replace_bytes(original);
        }

        Ok(thumbnail)
    }

    async fn handle_signal(&mut self, signal: TransferSignal) {
        match signal {
            TransferSignal::Progress { id, sent, total } => {
                let emit = match self.active.as_mut() {
                    Some(active) if active.id == id => {
                        active.throttle.should_emit(Instant::now())
                    }
                    // 已被取代的任务发来的迟到进度
                    _ => return,
                };

                if emit {
                    self.presenter.progress(sent, total).await;
                }
            }
            TransferSignal::Done { id, outcome } => {
                if !matches!(self.active.as_ref(), Some(active) if active.id == id) {
                    tracing::debug!(%id, "stale transfer outcome ignored");
                    return;
                }
                let Some(active) = self.active.take() else {
                    return;
                };

                match outcome {
                    Ok(link) => self.on_success(active, link).await,
                    Err(UploadError::Cancelled) => self.on_cancelled(active).await,
                    Err(err) => self.on_failure(active, err).await,
                }
            }
        }
    }

    async fn on_success(&mut self, active: ActiveExecution, link: String) {
        tracing::info!(
            id = %active.id,
            elapsed = %format_duration(active.started_at.elapsed()),
            link = %link,
            "upload finished"
        );

        if let Some(draft) = active.draft {
            let entry = draft.complete(link.clone());
            if let Err(err) = self.recorder.add_entry(entry).await {
                tracing::warn!(error = %err, "failed to record history entry");
            }
        }

        self.presenter.success(&link).await;
        self.presenter.end_foreground().await;

        // 成功后继续处理队列
        self.start_next().await;
    }

    async fn on_failure(&mut self, active: ActiveExecution, error: UploadError) {
        tracing::warn!(id = %active.id, error = %error, "upload failed");

        self.presenter.error(&error.to_string()).await;
        self.presenter.end_foreground().await;

        // 失败视为后端或网络问题，放弃整批等待中的任务
        self.discard_pending();
    }

    async fn on_cancelled(&mut self, active: ActiveExecution) {
        tracing::info!(id = %active.id, "upload cancelled");

        self.presenter.cancelled().await;
        self.presenter.end_foreground().await;
        self.discard_pending();
    }

    fn discard_pending(&mut self) {
        if !self.pending.is_empty() {
            tracing::info!(dropped = self.pending.len(), "discarding pending jobs");
            self.pending.clear();
        }
    }
}
