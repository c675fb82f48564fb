mod manager;
mod throttle;
mod worker;
pub mod errors;
pub mod types;

pub use errors::{Result, UploadError};
pub use manager::{UploadQueue, UploadQueueBuilder, UploadQueueHandle};
pub use throttle::ProgressThrottle;
pub use types::{FileData, FileSource, JobId, JobPhase, ProgressSender, UploadJob};
