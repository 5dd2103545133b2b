//! Bot handler - the full request pipeline / 机器人处理入口
//!
//! One entry point, `handle`, runs gate → search → format → dispatch and
//! returns nothing: the reply (if any) happens through the outbound channel
//! collaborator on a detached task. Nothing thrown below ever escapes this
//! boundary. Failures are logged and the requester hears silence, except for
//! the explicit reply templates.

use std::sync::Arc;

use crate::catalog::{CatalogSource, CatalogStore};
use crate::config::AppConfig;
use crate::limiter::{ChannelDirectory, DelayPolicy, GateDecision, RateLimiter};
use crate::message::{Dispatcher, MessageFormatter, OutboundChannel};
use crate::search::{SearchEngine, SearchParams};

/// 群消息触发关键词
const GROUP_KEYWORDS: &[&str] = &["搜索", "查找", "找", "有没有", "求", "资源"];

/// The assembled bot / 组装完成的机器人
pub struct Bot {
    store: Arc<CatalogStore>,
    source: Arc<dyn CatalogSource>,
    engine: SearchEngine,
    limiter: Arc<RateLimiter>,
    formatter: MessageFormatter,
    dispatcher: Dispatcher,
}

impl Bot {
    pub fn new(
        config: &AppConfig,
        store: Arc<CatalogStore>,
        source: Arc<dyn CatalogSource>,
        channel: Arc<dyn OutboundChannel>,
        directory: Option<Arc<dyn ChannelDirectory>>,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
        let delay = Arc::new(DelayPolicy::new(config.delay.clone(), directory));
        let engine = SearchEngine::new(store.clone(), SearchParams::from(&config.search));
        let formatter = MessageFormatter::new(
            config.message_format.clone(),
            config.search.max_items_per_message,
        );
        let dispatcher = Dispatcher::new(channel, limiter.clone(), delay);

        Self {
            store,
            source,
            engine,
            limiter,
            formatter,
            dispatcher,
        }
    }

    /// Handle one inbound message, fire-and-forget / 处理一条入站消息
    pub async fn handle(&self, text: &str, requester_id: &str, channel_id: &str, is_group: bool) {
        let content = text.trim();

        // 基本过滤
        if !self.formatter.should_respond(content) {
            return;
        }

        // 群消息需要@机器人或包含关键词才响应
        if is_group && !should_respond_to_group(content) {
            return;
        }

        // 清理查询字符串（去掉@提及）
        let cleaned = content.replace('@', " ");
        let query = cleaned.trim();
        if query.is_empty() {
            return;
        }

        // 准入检查：只检查，不计数，配额在实际发出回复后才消耗
        match self.limiter.check(requester_id, channel_id) {
            GateDecision::Admitted => {}
            GateDecision::Limited { scope, reason } => {
                // policy: say nothing, keep the reason in the log / 静默处理
                tracing::info!(
                    "准入拒绝 [{}] requester={} channel={}: {}",
                    scope.label(),
                    requester_id,
                    channel_id,
                    reason
                );
                return;
            }
        }

        // 处理特殊命令
        if self.handle_special_command(query, requester_id, channel_id) {
            return;
        }

        // 搜索处理
        self.process_search(query, requester_id, channel_id);
    }

    /// 处理特殊命令，命中返回 true
    fn handle_special_command(&self, content: &str, requester_id: &str, channel_id: &str) -> bool {
        let command = content.to_lowercase();

        match command.as_str() {
            "帮助" | "help" | "使用说明" => {
                self.reply_single(self.formatter.format_help(), requester_id, channel_id);
                true
            }
            "统计" | "stats" | "状态" => {
                let message = self.formatter.format_stats(&self.store.stats());
                self.reply_single(message, requester_id, channel_id);
                true
            }
            "重新加载" | "reload" => {
                let message = match self.store.reload(self.source.as_ref()) {
                    Ok(count) => format!("✅ 数据重新加载成功，共 {} 条", count),
                    Err(e) => {
                        // previous snapshot stays in place / 失败时沿用旧快照
                        tracing::error!("数据重新加载失败: {}", e);
                        "❌ 数据重新加载失败".to_string()
                    }
                };
                self.reply_single(message, requester_id, channel_id);
                true
            }
            _ => false,
        }
    }

    /// 处理搜索请求
    fn process_search(&self, query: &str, requester_id: &str, channel_id: &str) {
        let (results, total) = self.engine.search_with_total(query);
        tracing::debug!("查询「{}」命中 {} 条（展示 {} 条）", query, total, results.len());

        let batches = self.formatter.format_results(&results, query, total);
        self.dispatcher.dispatch(batches, requester_id, channel_id);
    }

    fn reply_single(&self, message: String, requester_id: &str, channel_id: &str) {
        self.dispatcher.dispatch(vec![message], requester_id, channel_id);
    }

    /// Greeting used by front-ends on startup / 启动问候语
    pub fn welcome(&self) -> String {
        self.formatter.format_welcome()
    }
}

/// 判断是否应该响应群消息
fn should_respond_to_group(content: &str) -> bool {
    // 检查是否@了机器人
    if content.contains('@') {
        return true;
    }

    // 检查是否包含搜索关键词
    let lower = content.to_lowercase();
    if GROUP_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return true;
    }

    // 明显的搜索请求：够长且含文字（演员名或剧名特征）
    content.chars().count() >= 2
        && content
            .chars()
            .any(|c| c.is_alphabetic() || ('\u{4e00}'..='\u{9fff}').contains(&c))
}
