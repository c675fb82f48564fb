use serde::{Deserialize, Serialize};
use crate::queue::errors::Result;

/// 未注册后端的处理策略
///
/// 历史行为是静默丢掉该任务，这里做成显式可配置的策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownBackendPolicy {
    /// 丢弃该任务，继续处理队列中的下一个
    #[default]
    Skip,
    /// 丢弃该任务并清空整个队列，向展示层报告错误
    Clear,
}

/// 队列配置
///
/// 在每次任务启动时读取，见 [`crate::UploadQueueBuilder`]。
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    /// 每秒最多转发给展示层的进度更新次数
    pub updates_per_sec: u32,
    /// 图片重新压缩的最大宽度
    pub resize_width: u32,
    /// 图片重新压缩的最大高度
    pub resize_height: u32,
    /// 重新编码的 JPEG 质量（0-100）
    pub resize_quality: u8,
    /// 通知指示灯
    pub notification_light: bool,
    /// 通知振动
    pub notification_vibrate: bool,
    /// 未注册后端的处理策略
    pub unknown_backend: UnknownBackendPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            updates_per_sec: 5,
            resize_width: 1000,
            resize_height: 1000,
            resize_quality: 70,
            notification_light: false,
            notification_vibrate: false,
            unknown_backend: UnknownBackendPolicy::default(),
        }
    }
}

impl QueueConfig {
    /// Parse a configuration from a TOML document
    pub fn from_toml(document: &str) -> Result<Self> {
        Ok(toml::from_str(document)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_preferences() {
        let config = QueueConfig::default();
        assert_eq!(config.updates_per_sec, 5);
        assert_eq!(config.resize_width, 1000);
        assert_eq!(config.resize_height, 1000);
        assert_eq!(config.resize_quality, 70);
        assert_eq!(config.unknown_backend, UnknownBackendPolicy::Skip);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config = QueueConfig::from_toml(
            r#"
            updates_per_sec = 10
            unknown_backend = "clear"
            "#,
        )
        .unwrap();

        assert_eq!(config.updates_per_sec, 10);
        assert_eq!(config.unknown_backend, UnknownBackendPolicy::Clear);
        assert_eq!(config.resize_quality, 70);
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(QueueConfig::from_toml("updates_per_sec = \"lots\"").is_err());
    }
}
