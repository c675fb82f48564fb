mod http;
mod progress;
mod registry;
mod traits;

pub use http::{HttpTransfer, HttpTransferFactory};
pub use progress::CountingStream;
pub use registry::BackendRegistry;
pub use traits::{TransferWorker, TransferWorkerFactory};
