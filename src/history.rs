use std::path::PathBuf;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use crate::queue::errors::Result;

/// 一条上传历史记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub original_name: String,
    pub mime: String,
    pub backend: String,
    /// 编码后的缩略图字节，不参与序列化
    #[serde(skip)]
    pub thumbnail: Option<Bytes>,
    pub link: String,
    pub uploaded_at: DateTime<Utc>,
}

/// 任务启动时构建的历史记录草稿，成功后补上结果链接
#[derive(Debug, Clone)]
pub struct HistoryDraft {
    pub original_name: String,
    pub mime: String,
    pub backend: String,
    pub thumbnail: Option<Bytes>,
}

impl HistoryDraft {
    pub fn complete(self, link: impl Into<String>) -> HistoryEntry {
        HistoryEntry {
            original_name: self.original_name,
            mime: self.mime,
            backend: self.backend,
            thumbnail: self.thumbnail,
            link: link.into(),
            uploaded_at: Utc::now(),
        }
    }
}

/// 历史记录持久化能力，只在上传成功后调用
#[async_trait]
pub trait HistoryRecorder: Send + Sync {
    async fn add_entry(&self, entry: HistoryEntry) -> Result<()>;
}

/// 丢弃所有记录
#[derive(Debug, Default, Clone)]
pub struct NullRecorder;

#[async_trait]
impl HistoryRecorder for NullRecorder {
    async fn add_entry(&self, _entry: HistoryEntry) -> Result<()> {
        Ok(())
    }
}

/// 以 JSON Lines 追加到文件的记录器
pub struct JsonHistoryRecorder {
    path: PathBuf,
}

impl JsonHistoryRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl HistoryRecorder for JsonHistoryRecorder {
    async fn add_entry(&self, entry: HistoryEntry) -> Result<()> {
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}
