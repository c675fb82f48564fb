use std::time::{Duration, Instant};

/// 进度转发的频率限制
///
/// 传输后端可能以任意粒度上报进度，转发给展示层的频率由
/// 配置的每秒更新次数决定。每个活动任务持有自己的实例。
pub struct ProgressThrottle {
    interval: Duration,
    last_emit: Option<Instant>,
}

impl ProgressThrottle {
    pub fn new(updates_per_sec: u32) -> Self {
        let updates_per_sec = updates_per_sec.max(1);
        Self {
            interval: Duration::from_millis(1000 / updates_per_sec as u64),
            last_emit: None,
        }
    }

    /// 判断本次进度是否应该转发
    ///
    /// 任务的第一次进度永远转发，保证很短的传输也至少显示一次。
    pub fn should_emit(&mut self, now: Instant) -> bool {
        match self.last_emit {
            Some(last) if now.duration_since(last) <= self.interval => false,
            _ => {
                self.last_emit = Some(now);
                true
            }
        }
    }
}
