use async_trait::async_trait;
use bytes::Bytes;
use crate::utils::format_bytes;

/// 展示层的外观选项，任务启动时传入
#[derive(Debug, Clone, Copy, Default)]
pub struct PresenterOptions {
    pub lights: bool,
    pub vibrate: bool,
}

/// 上传生命周期的展示能力
///
/// 所有方法都在队列任务上串行调用，实现方不需要加锁，
/// 但应该尽快返回，避免阻塞队列。
#[async_trait]
pub trait NotificationPresenter: Send + Sync {
    /// 传输期间保持前台展示
    async fn begin_foreground(&self, options: PresenterOptions);
    async fn end_foreground(&self);

    async fn set_file_name(&self, name: &str);
    async fn set_thumbnail(&self, thumbnail: Option<Bytes>);
    /// 活动任务之外还有多少任务在等待
    async fn set_queue_size(&self, size: usize);

    async fn progress(&self, sent: u64, total: u64);
    async fn success(&self, link: &str);
    async fn error(&self, message: &str);
    async fn cancelled(&self);
}

/// 把生命周期事件写进日志的默认展示层
#[derive(Debug, Default, Clone)]
pub struct LogPresenter;

#[async_trait]
impl NotificationPresenter for LogPresenter {
    async fn begin_foreground(&self, _options: PresenterOptions) {}

    async fn end_foreground(&self) {}

    async fn set_file_name(&self, name: &str) {
        tracing::info!(file = %name, "upload starting");
    }

    async fn set_thumbnail(&self, _thumbnail: Option<Bytes>) {}

    async fn set_queue_size(&self, size: usize) {
        tracing::info!(pending = size, "queue size changed");
    }

    async fn progress(&self, sent: u64, total: u64) {
        tracing::info!(
            sent = %format_bytes(sent),
            total = %format_bytes(total),
            "upload progress"
        );
    }

    async fn success(&self, link: &str) {
        tracing::info!(link = %link, "upload succeeded");
    }

    async fn error(&self, message: &str) {
        tracing::error!(message = %message, "upload failed");
    }

    async fn cancelled(&self) {
        tracing::info!("upload cancelled");
    }
}
