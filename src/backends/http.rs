use async_trait::async_trait;
use reqwest::{Body, Client};
use reqwest::header::CONTENT_TYPE;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use url::Url;
use super::progress::CountingStream;
use super::traits::{TransferWorker, TransferWorkerFactory};
use crate::queue::errors::{Result, UploadError};
use crate::queue::types::{FileData, FileSource, ProgressSender};

const CHUNK_SIZE: usize = 64 * 1024;

/// 简单 HTTP 上传后端：把文件流式 POST 到固定端点
///
/// 结果链接取响应体，为空时退回 `Location` 头。
pub struct HttpTransferFactory {
    name: String,
    endpoint: Url,
    client: Client,
}

impl HttpTransferFactory {
    pub fn new(name: impl Into<String>, endpoint: Url) -> Self {
        Self {
            name: name.into(),
            endpoint,
            client: Client::new(),
        }
    }
}

impl TransferWorkerFactory for HttpTransferFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn create(&self) -> Box<dyn TransferWorker> {
        Box::new(HttpTransfer {
            endpoint: self.endpoint.clone(),
            client: self.client.clone(),
        })
    }
}

pub struct HttpTransfer {
    endpoint: Url,
    client: Client,
}

#[async_trait]
impl TransferWorker for HttpTransfer {
    async fn run(
        self: Box<Self>,
        file: FileSource,
        progress: ProgressSender,
        cancel: CancellationToken,
    ) -> Result<String> {
        let total = file.len().await?;

        let body = match file.data {
            FileData::Path(path) => {
                let source = File::open(&path).await?;
                let stream = ReaderStream::with_capacity(source, CHUNK_SIZE);
                Body::wrap_stream(CountingStream::new(stream, total, progress))
            }
            FileData::Bytes(bytes) => {
                let stream = futures_util::stream::iter(vec![Ok::<_, std::io::Error>(bytes)]);
                Body::wrap_stream(CountingStream::new(stream, total, progress))
            }
        };

        // 文件名放进查询参数，避免非 ASCII 头部问题
        let mut endpoint = self.endpoint.clone();
        endpoint
            .query_pairs_mut()
            .append_pair("filename", &file.file_name);

        let request = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, file.mime.as_str())
            .body(body);

        let send = async {
            let response = request.send().await?;
            let status = response.status();

            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(UploadError::server(status.as_u16(), message));
            }

            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(String::from);

            let body = response.text().await?;
            let link = match body.trim() {
                "" => location.unwrap_or_else(|| self.endpoint.to_string()),
                text => text.to_string(),
            };

            Ok(link)
        };

        tokio::select! {
            result = send => result,
            _ = cancel.cancelled() => Err(UploadError::Cancelled),
        }
    }
}
