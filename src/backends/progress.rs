use std::pin::Pin;
use std::task::{Context, Poll};
use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;
use crate::queue::types::ProgressSender;

pin_project! {
    /// 包装请求体流，按读出的数据块上报进度
    ///
    /// 上报频率不在这里限制，队列侧按配置做节流。
    pub struct CountingStream<S> {
        #[pin]
        inner: S,
        sent: u64,
        total: u64,
        progress: ProgressSender,
    }
}

impl<S> CountingStream<S> {
    pub fn new(inner: S, total: u64, progress: ProgressSender) -> Self {
        Self {
            inner,
            sent: 0,
            total,
            progress,
        }
    }
}

impl<S> Stream for CountingStream<S>
where
    S: Stream<Item = std::io::Result<Bytes>>,
{
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        match this.inner.poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                if !chunk.is_empty() {
                    *this.sent += chunk.len() as u64;
                    this.progress.send(*this.sent, *this.total);
                }

                Poll::Ready(Some(Ok(chunk)))
            }
            other => other,
        }
    }
}
