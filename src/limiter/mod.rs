//! Admission controller - sliding-window rate limiter / 准入控制模块
//!
//! Three gates, evaluated global → requester → channel; the first failing
//! gate's reason comes back and evaluation stops. Checking NEVER records:
//! recording is a separate explicit call the dispatcher makes only after a
//! reply was actually sent, so a request that dies later in the pipeline does
//! not consume quota. The two-call contract leaves a small race window under
//! extreme concurrency; the limiter is a courtesy throttle, not a hard quota.
//!
//! All scopes live behind ONE mutex: admission decisions are cheap and
//! simplicity beats throughput here.

pub mod delay;

pub use delay::{ChannelDirectory, DelayPolicy};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

use crate::config::RateLimitConfig;

/// Rate-limiting scope / 限流维度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Requester,
    Channel,
}

impl Scope {
    pub fn label(&self) -> &'static str {
        match self {
            Scope::Global => "全局",
            Scope::Requester => "用户",
            Scope::Channel => "会话",
        }
    }
}

/// Gate outcome - a control-flow result, not an error / 准入判定结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Admitted,
    Limited { scope: Scope, reason: String },
}

impl GateDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, GateDecision::Admitted)
    }
}

/// One scope's admitted-event timestamps / 单个维度的已准入事件时间戳
///
/// Ordered, pruned lazily at read time - no background timer.
#[derive(Debug, Default)]
struct RateWindow {
    events: VecDeque<DateTime<Utc>>,
}

impl RateWindow {
    fn prune(&mut self, cutoff: DateTime<Utc>) {
        while let Some(&front) = self.events.front() {
            if front <= cutoff {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }

    fn count_since(&self, cutoff: DateTime<Utc>) -> usize {
        self.events.iter().filter(|&&t| t > cutoff).count()
    }

    fn len(&self) -> usize {
        self.events.len()
    }

    fn record(&mut self, now: DateTime<Utc>) {
        self.events.push_back(now);
    }

    fn last_event(&self) -> Option<DateTime<Utc>> {
        self.events.back().copied()
    }
}

/// Capacity-bounded map of per-identity windows / 有界的按身份限流表
///
/// Identities idle beyond the global hourly window are evicted on mutation;
/// if the map still exceeds capacity the stalest identities go first. Keeps
/// the old unbounded-growth failure mode out without a background sweeper.
struct ScopeMap {
    windows: HashMap<String, RateWindow>,
    capacity: usize,
}

impl ScopeMap {
    fn new(capacity: usize) -> Self {
        Self {
            windows: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    fn count_since(&mut self, id: &str, window: Duration, now: DateTime<Utc>) -> usize {
        match self.windows.get_mut(id) {
            Some(w) => {
                w.prune(now - window);
                w.len()
            }
            None => 0,
        }
    }

    fn record(&mut self, id: &str, now: DateTime<Utc>) {
        self.windows.entry(id.to_string()).or_default().record(now);
    }

    fn evict(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::hours(1);
        self.windows
            .retain(|_, w| w.last_event().map_or(false, |t| t > cutoff));

        if self.windows.len() > self.capacity {
            let mut by_age: Vec<(String, DateTime<Utc>)> = self
                .windows
                .iter()
                .map(|(k, w)| (k.clone(), w.last_event().unwrap_or(cutoff)))
                .collect();
            by_age.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
            for (key, _) in by_age.iter().take(self.windows.len() - self.capacity) {
                self.windows.remove(key);
            }
        }
    }

    fn len(&self) -> usize {
        self.windows.len()
    }
}

struct LimiterInner {
    global: RateWindow,
    requesters: ScopeMap,
    channels: ScopeMap,
}

/// Sliding-window admission controller / 滑动窗口准入控制器
pub struct RateLimiter {
    cfg: RateLimitConfig,
    inner: Mutex<LimiterInner>,
}

impl RateLimiter {
    pub fn new(cfg: RateLimitConfig) -> Self {
        let inner = LimiterInner {
            global: RateWindow::default(),
            requesters: ScopeMap::new(cfg.scope_capacity),
            channels: ScopeMap::new(cfg.scope_capacity),
        };
        Self {
            cfg,
            inner: Mutex::new(inner),
        }
    }

    /// Evaluate all gates WITHOUT consuming quota / 检查准入（不消耗配额）
    pub fn check(&self, requester_id: &str, channel_id: &str) -> GateDecision {
        self.check_at(Utc::now(), requester_id, channel_id)
    }

    /// Commit one admitted event to every scope / 记录一次已发送的回复
    pub fn record(&self, requester_id: &str, channel_id: &str) {
        self.record_at(Utc::now(), requester_id, channel_id);
    }

    fn check_at(&self, now: DateTime<Utc>, requester_id: &str, channel_id: &str) -> GateDecision {
        let mut inner = self.inner.lock();

        // 全局闸门：小时窗 + 分钟窗
        inner.global.prune(now - Duration::hours(1));
        if inner.global.len() >= self.cfg.global_per_hour {
            return GateDecision::Limited {
                scope: Scope::Global,
                reason: "本小时查询次数已达上限，系统繁忙，请稍后再试".to_string(),
            };
        }
        if inner.global.count_since(now - Duration::minutes(1)) >= self.cfg.global_per_minute {
            return GateDecision::Limited {
                scope: Scope::Global,
                reason: "当前查询人数过多，请稍后再试".to_string(),
            };
        }

        // 用户闸门
        if inner.requesters.count_since(requester_id, Duration::minutes(1), now)
            >= self.cfg.requester_per_minute
        {
            return GateDecision::Limited {
                scope: Scope::Requester,
                reason: "您的查询过于频繁，请稍后再试".to_string(),
            };
        }

        // 会话闸门
        if inner.channels.count_since(channel_id, Duration::minutes(1), now)
            >= self.cfg.channel_per_minute
        {
            return GateDecision::Limited {
                scope: Scope::Channel,
                reason: "本群查询过于频繁，请稍后再试".to_string(),
            };
        }

        GateDecision::Admitted
    }

    fn record_at(&self, now: DateTime<Utc>, requester_id: &str, channel_id: &str) {
        let mut inner = self.inner.lock();
        inner.global.record(now);
        inner.requesters.record(requester_id, now);
        inner.channels.record(channel_id, now);
        // eviction piggybacks on the mutation critical section / 淘汰随写入顺带执行
        inner.requesters.evict(now);
        inner.channels.evict(now);
    }

    #[cfg(test)]
    fn tracked_requesters(&self) -> usize {
        self.inner.lock().requesters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(RateLimitConfig::default())
    }

    #[test]
    fn fourth_requester_request_within_minute_is_rejected() {
        let limiter = limiter();
        let t0 = Utc::now();

        for i in 0..3 {
            let t = t0 + Duration::seconds(i);
            assert!(limiter.check_at(t, "user-a", "chan-1").is_admitted());
            limiter.record_at(t, "user-a", "chan-1");
        }

        match limiter.check_at(t0 + Duration::seconds(10), "user-a", "chan-1") {
            GateDecision::Limited { scope, .. } => assert_eq!(scope, Scope::Requester),
            GateDecision::Admitted => panic!("第4次请求应被用户闸门拒绝"),
        }
        // a different requester is unaffected / 其他用户不受影响
        assert!(limiter
            .check_at(t0 + Duration::seconds(10), "user-b", "chan-2")
            .is_admitted());
    }

    #[test]
    fn check_alone_never_moves_a_counter() {
        let limiter = limiter();
        for _ in 0..20 {
            assert!(limiter.check("user-a", "chan-1").is_admitted());
        }
        // still admitted after 20 checks: nothing was recorded / 检查不计数
        assert!(limiter.check("user-a", "chan-1").is_admitted());
    }

    #[test]
    fn requester_window_slides() {
        let limiter = limiter();
        let t0 = Utc::now();
        for i in 0..3 {
            limiter.record_at(t0 + Duration::seconds(i), "user-a", "chan-1");
        }
        assert!(!limiter.check_at(t0 + Duration::seconds(30), "user-a", "chan-1").is_admitted());
        // 61 seconds later the window has slid past all three events
        assert!(limiter.check_at(t0 + Duration::seconds(63), "user-a", "chan-1").is_admitted());
    }

    #[test]
    fn channel_gate_fires_after_five_in_a_minute() {
        let limiter = limiter();
        let t0 = Utc::now();
        for i in 0..5 {
            let requester = format!("user-{}", i);
            let t = t0 + Duration::seconds(i as i64);
            assert!(limiter.check_at(t, &requester, "chan-1").is_admitted());
            limiter.record_at(t, &requester, "chan-1");
        }
        match limiter.check_at(t0 + Duration::seconds(10), "user-x", "chan-1") {
            GateDecision::Limited { scope, .. } => assert_eq!(scope, Scope::Channel),
            GateDecision::Admitted => panic!("第6次请求应被会话闸门拒绝"),
        }
    }

    #[test]
    fn global_minute_gate_precedes_finer_scopes() {
        let limiter = limiter();
        let t0 = Utc::now();
        for i in 0..10 {
            let t = t0 + Duration::seconds(i as i64);
            limiter.record_at(t, &format!("user-{}", i), &format!("chan-{}", i));
        }
        match limiter.check_at(t0 + Duration::seconds(15), "user-new", "chan-new") {
            GateDecision::Limited { scope, .. } => assert_eq!(scope, Scope::Global),
            GateDecision::Admitted => panic!("全局分钟上限应先触发"),
        }
    }

    #[test]
    fn global_hourly_gate() {
        let limiter = RateLimiter::new(RateLimitConfig {
            global_per_minute: 1000,
            ..Default::default()
        });
        let t0 = Utc::now();
        // spread 50 events over the hour so the minute gate stays quiet
        for i in 0..50 {
            let t = t0 + Duration::seconds(i as i64 * 60);
            limiter.record_at(t, &format!("user-{}", i), &format!("chan-{}", i));
        }
        let later = t0 + Duration::seconds(50 * 60);
        match limiter.check_at(later, "user-new", "chan-new") {
            GateDecision::Limited { scope, .. } => assert_eq!(scope, Scope::Global),
            GateDecision::Admitted => panic!("全局小时上限应触发"),
        }
    }

    #[test]
    fn idle_identities_are_evicted() {
        let limiter = limiter();
        let t0 = Utc::now();
        limiter.record_at(t0, "user-old", "chan-1");
        assert_eq!(limiter.tracked_requesters(), 1);
        // two hours later any mutation sweeps the idle identity out
        limiter.record_at(t0 + Duration::hours(2), "user-new", "chan-1");
        assert_eq!(limiter.tracked_requesters(), 1);
    }

    #[test]
    fn scope_map_capacity_is_enforced() {
        let limiter = RateLimiter::new(RateLimitConfig {
            scope_capacity: 3,
            ..Default::default()
        });
        let t0 = Utc::now();
        for i in 0..10 {
            limiter.record_at(t0 + Duration::seconds(i as i64), &format!("user-{}", i), "chan-1");
        }
        assert!(limiter.tracked_requesters() <= 3);
        // the freshest identity survived / 最新的身份保留
        assert_eq!(
            limiter
                .inner
                .lock()
                .requesters
                .count_since("user-9", Duration::minutes(1), t0 + Duration::seconds(10)),
            1
        );
    }
}
