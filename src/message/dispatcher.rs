//! Dispatch scheduler - throttled, detached batch sending / 发送调度器
//!
//! A reply of N batches never blocks the request-handling task: the whole
//! sequence runs on a detached tokio task. First batch goes out immediately,
//! every later batch waits out the computed delay first. Sending is
//! best-effort: a failed batch is logged and the rest are still attempted.
//! There is no cancellation: shutdown may abandon in-flight sends.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::SendError;
use crate::limiter::{DelayPolicy, RateLimiter};

/// Outbound send primitive collaborator / 外部发送原语
///
/// The core never interprets transport errors beyond logging and moving on.
#[async_trait]
pub trait OutboundChannel: Send + Sync {
    async fn send(&self, text: &str, channel_id: &str) -> Result<(), SendError>;
}

/// Throttled batch dispatcher / 限速批量发送器
pub struct Dispatcher {
    channel: Arc<dyn OutboundChannel>,
    limiter: Arc<RateLimiter>,
    delay: Arc<DelayPolicy>,
}

impl Dispatcher {
    pub fn new(
        channel: Arc<dyn OutboundChannel>,
        limiter: Arc<RateLimiter>,
        delay: Arc<DelayPolicy>,
    ) -> Self {
        Self {
            channel,
            limiter,
            delay,
        }
    }

    /// Send batches to one channel on a detached task / 在后台任务中依次发送
    ///
    /// Quota is recorded only after a batch actually went out, so a reply
    /// that dies in transport never charges the requester. The returned
    /// handle is join-able for tests; production callers drop it
    /// (fire-and-forget).
    pub fn dispatch(
        &self,
        batches: Vec<String>,
        requester_id: &str,
        channel_id: &str,
    ) -> tokio::task::JoinHandle<()> {
        let channel = self.channel.clone();
        let limiter = self.limiter.clone();
        let delay = self.delay.clone();
        let requester_id = requester_id.to_string();
        let channel_id = channel_id.to_string();

        tokio::spawn(async move {
            for (i, batch) in batches.iter().enumerate() {
                if i > 0 {
                    // 第一条消息立即发送，后续消息有延迟
                    let wait = delay.compute_delay(&channel_id, i + 1).await;
                    tokio::time::sleep(Duration::from_secs_f64(wait)).await;
                }

                match channel.send(batch, &channel_id).await {
                    Ok(()) => {
                        limiter.record(&requester_id, &channel_id);
                        tracing::debug!("第 {} 批消息已发送到 {}", i + 1, channel_id);
                    }
                    Err(e) => {
                        // best-effort: keep going / 尽力发送，失败不中断
                        tracing::warn!("第 {} 批消息发送失败: {}", i + 1, e);
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DelayConfig, RateLimitConfig};
    use parking_lot::Mutex;

    /// Test double recording sends, optionally failing one index
    /// / 测试用通道：记录发送内容，可指定某一批失败
    struct RecordingChannel {
        sent: Mutex<Vec<String>>,
        fail_index: Option<usize>,
    }

    #[async_trait]
    impl OutboundChannel for RecordingChannel {
        async fn send(&self, text: &str, channel_id: &str) -> Result<(), SendError> {
            let mut sent = self.sent.lock();
            if self.fail_index == Some(sent.len()) {
                sent.push(String::new());
                return Err(SendError::new(channel_id, "transport down"));
            }
            sent.push(text.to_string());
            Ok(())
        }
    }

    fn instant_delay() -> Arc<DelayPolicy> {
        Arc::new(DelayPolicy::new(
            DelayConfig {
                base_delay: 0.0,
                jitter_max: 0.0,
                per_extra_message: 0.0,
                ..Default::default()
            },
            None,
        ))
    }

    fn batches(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("批次 {}", i + 1)).collect()
    }

    #[tokio::test]
    async fn sends_all_batches_in_order() {
        let channel = Arc::new(RecordingChannel {
            sent: Mutex::new(Vec::new()),
            fail_index: None,
        });
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig::default()));
        let dispatcher = Dispatcher::new(channel.clone(), limiter, instant_delay());

        dispatcher
            .dispatch(batches(3), "user-a", "chan-1")
            .await
            .unwrap();

        let sent = channel.sent.lock();
        assert_eq!(*sent, vec!["批次 1", "批次 2", "批次 3"]);
    }

    #[tokio::test]
    async fn failed_batch_does_not_abort_the_rest() {
        let channel = Arc::new(RecordingChannel {
            sent: Mutex::new(Vec::new()),
            fail_index: Some(1),
        });
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig::default()));
        let dispatcher = Dispatcher::new(channel.clone(), limiter.clone(), instant_delay());

        dispatcher
            .dispatch(batches(3), "user-a", "chan-1")
            .await
            .unwrap();

        let attempts = channel.sent.lock().len();
        assert_eq!(attempts, 3);
        // only 2 successful sends were recorded: the third check still passes
        // the requester gate (cap 3) / 只记录了2次，第3次配额仍可用
        assert!(limiter.check("user-a", "chan-1").is_admitted());
    }

    #[tokio::test]
    async fn every_successful_send_is_recorded() {
        let channel = Arc::new(RecordingChannel {
            sent: Mutex::new(Vec::new()),
            fail_index: None,
        });
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig::default()));
        let dispatcher = Dispatcher::new(channel, limiter.clone(), instant_delay());

        dispatcher
            .dispatch(batches(3), "user-a", "chan-1")
            .await
            .unwrap();

        // requester cap (3/min) is now exhausted / 用户配额已被3次发送耗尽
        assert!(!limiter.check("user-a", "chan-1").is_admitted());
    }

    #[tokio::test]
    async fn empty_batches_send_nothing() {
        let channel = Arc::new(RecordingChannel {
            sent: Mutex::new(Vec::new()),
            fail_index: None,
        });
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig::default()));
        let dispatcher = Dispatcher::new(channel.clone(), limiter, instant_delay());

        dispatcher.dispatch(Vec::new(), "user-a", "chan-1").await.unwrap();
        assert!(channel.sent.lock().is_empty());
    }
}
