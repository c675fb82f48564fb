pub mod backends;
pub mod config;
pub mod history;
pub mod notify;
pub mod prepare;
pub mod queue;
pub mod utils;

// 重新导出核心类型
pub use queue::{
    FileData,
    FileSource,
    JobId,
    ProgressSender,
    Result,
    UploadError,
    UploadJob,
    UploadQueue,
    UploadQueueBuilder,
    UploadQueueHandle,
};

pub use backends::{
    BackendRegistry,
    HttpTransfer,
    HttpTransferFactory,
    TransferWorker,
    TransferWorkerFactory,
};

pub use config::{QueueConfig, UnknownBackendPolicy};
pub use history::{HistoryEntry, HistoryRecorder, JsonHistoryRecorder, NullRecorder};
pub use notify::{LogPresenter, NotificationPresenter, PresenterOptions};
pub use prepare::{FilePreparer, ImagePreparer};
