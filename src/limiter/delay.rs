//! Send delay computation / 发送延迟计算
//!
//! Not a gate: a floating-point seconds value the dispatcher sleeps between
//! batches of one reply. Base + uniform jitter + member-count escalation
//! (busier channels get slower replies) + a fixed per-extra-message term.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::DelayConfig;

/// Channel metadata collaborator / 会话信息协作方
///
/// `None` means the directory genuinely does not know; the policy then falls
/// back to the configured default member count.
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    async fn member_count(&self, channel_id: &str) -> Option<usize>;
}

#[derive(Debug, Clone, Copy)]
struct CachedCount {
    count: usize,
    fetched_at: DateTime<Utc>,
}

/// Delay policy with a per-channel member-count cache / 延迟策略
pub struct DelayPolicy {
    cfg: DelayConfig,
    directory: Option<Arc<dyn ChannelDirectory>>,
    /// member counts, fresh for `member_cache_ttl_secs` / 成员数缓存
    cache: Mutex<HashMap<String, CachedCount>>,
}

impl DelayPolicy {
    pub fn new(cfg: DelayConfig, directory: Option<Arc<dyn ChannelDirectory>>) -> Self {
        Self {
            cfg,
            directory,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Seconds to wait before sending message number `message_count` of a
    /// reply / 计算第 `message_count` 条消息前的等待秒数
    pub async fn compute_delay(&self, channel_id: &str, message_count: usize) -> f64 {
        let mut delay = self.cfg.base_delay;

        if self.cfg.jitter_max > 0.0 {
            delay += rand::thread_rng().gen_range(0.0..self.cfg.jitter_max);
        }

        let members = self.member_count(channel_id).await;
        if members > self.cfg.member_threshold {
            let over = (members - self.cfg.member_threshold) as f64;
            delay += (over * self.cfg.escalation_per_member).min(self.cfg.escalation_cap);
        }

        if message_count > 1 {
            delay += self.cfg.per_extra_message * (message_count - 1) as f64;
        }

        delay
    }

    async fn member_count(&self, channel_id: &str) -> usize {
        let now = Utc::now();

        {
            let cache = self.cache.lock();
            if let Some(cached) = cache.get(channel_id) {
                if (now - cached.fetched_at).num_seconds() < self.cfg.member_cache_ttl_secs {
                    return cached.count;
                }
            }
        }

        if let Some(directory) = &self.directory {
            if let Some(count) = directory.member_count(channel_id).await {
                self.cache.lock().insert(
                    channel_id.to_string(),
                    CachedCount {
                        count,
                        fetched_at: now,
                    },
                );
                return count;
            }
        }

        // miss: fall back, do not cache / 查不到则回退默认值，不缓存
        self.cfg.default_member_count
    }
}
