//! Message formatter - search results to chat batches / 消息格式化器
//!
//! Pure functions over results and config: no I/O, no clock, no lock. The
//! dispatcher decides when batches go out; this module only decides what they
//! say.

use crate::catalog::entry::LinkKind;
use crate::catalog::store::CatalogStats;
use crate::config::MessageFormatConfig;
use crate::search::schema::SearchResult;

/// Known failure categories with user-facing templates / 已知失败类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyError {
    /// 数据库不可用
    NoData,
    /// 搜索功能异常
    SearchFailed,
    /// 查询词无效
    InvalidQuery,
    /// 查询被限流
    RateLimited,
    /// 其他系统错误
    SystemError,
}

/// Search result formatter / 搜索结果格式化器
pub struct MessageFormatter {
    cfg: MessageFormatConfig,
    /// Rendered entries per batch / 每批条目数
    batch_size: usize,
}

impl MessageFormatter {
    pub fn new(cfg: MessageFormatConfig, batch_size: usize) -> Self {
        Self {
            cfg,
            batch_size: batch_size.max(1),
        }
    }

    /// Render results into ordered message batches / 将结果渲染为分批消息
    ///
    /// `total_matched` is the uncapped match count; when the engine already
    /// capped results below it, the first batch carries the truncation
    /// notice. An empty result set produces a single apologetic batch naming
    /// the query.
    pub fn format_results(
        &self,
        results: &[SearchResult],
        query: &str,
        total_matched: usize,
    ) -> Vec<String> {
        if results.is_empty() {
            return vec![self.cfg.no_result.replace("{query}", query)];
        }

        let items: Vec<String> = results.iter().map(|r| self.render_single(r)).collect();

        let total_batches = items.len().div_ceil(self.batch_size);
        let mut batches: Vec<String> = items
            .chunks(self.batch_size)
            .enumerate()
            .map(|(i, chunk)| {
                let body = chunk.join(&self.cfg.separator);
                if total_batches > 1 {
                    // 添加批次信息
                    format!("📺 第{}/{}批结果：\n\n{}", i + 1, total_batches, body)
                } else {
                    body
                }
            })
            .collect();

        if total_matched > results.len() {
            let notice = self
                .cfg
                .too_many_results
                .replace("{count}", &total_matched.to_string())
                .replace("{shown}", &results.len().to_string());
            batches[0] = format!("{}\n\n{}", notice, batches[0]);
        }

        batches
    }

    /// 格式化单条搜索结果
    fn render_single(&self, result: &SearchResult) -> String {
        let entry = &result.entry;

        let cast = if entry.cast.is_empty() {
            "未知".to_string()
        } else {
            entry.cast_display()
        };

        self.cfg
            .single_template
            .replace("{title}", &entry.title)
            .replace("{cast}", &cast)
            .replace("{episodes}", &normalize_episodes(&entry.episodes))
            .replace("{quark_link}", entry.link(LinkKind::Quark).unwrap_or("暂无"))
            .replace("{baidu_link}", entry.link(LinkKind::Baidu).unwrap_or("暂无"))
    }

    /// 格式化错误消息
    pub fn format_error(&self, kind: ReplyError, details: Option<&str>) -> String {
        let base = match kind {
            ReplyError::NoData => "❌ 数据库暂时无法访问，请稍后再试。",
            ReplyError::SearchFailed => "❌ 搜索功能暂时不可用，请稍后再试。",
            ReplyError::InvalidQuery => "❌ 请输入有效的搜索关键词。",
            ReplyError::RateLimited => "⏰ 查询过于频繁，请稍后再试。",
            ReplyError::SystemError => "❌ 系统暂时出现问题，请稍后再试。",
        };

        match details {
            Some(d) if !d.is_empty() => format!("{}\n详情：{}", base, d),
            _ => base.to_string(),
        }
    }

    /// 格式化帮助消息
    pub fn format_help(&self) -> String {
        "🤖 影视资源搜索机器人使用说明：\n\n\
         📝 搜索方式：\n\
         • 直接输入剧名：如「庆余年」\n\
         • 输入演员名字：如「张若昀」\n\
         • 混合搜索：如「张若昀 古装」\n\n\
         🎯 搜索技巧：\n\
         • 支持模糊搜索，不需要完整剧名\n\
         • 支持多个关键词组合搜索\n\
         • 自动识别演员和剧名\n\n\
         ⚠️ 注意事项：\n\
         • 为避免刷屏，每次最多显示10个结果\n\
         • 如有多个结果会分批发送\n\
         • 请合理使用，避免频繁查询\n\n\
         发送「统计」查看资源库规模。"
            .to_string()
    }

    /// 格式化统计信息消息
    pub fn format_stats(&self, stats: &CatalogStats) -> String {
        format!(
            "📊 资源库统计信息：\n\n\
             🎬 总剧集数：{} 部\n\
             🔍 剧名关键词：{} 个\n\
             👥 演员关键词：{} 个\n\n\
             构建版本：{}",
            stats.entry_count,
            stats.title_keywords,
            stats.cast_keywords,
            env!("BUILD_TIME"),
        )
    }

    /// 格式化欢迎消息
    pub fn format_welcome(&self) -> String {
        "🎉 欢迎使用影视资源搜索机器人！\n\n\
         直接发送剧名或演员名即可开始搜索！\n\
         发送「帮助」查看详细使用说明。"
            .to_string()
    }

    /// Whether an inbound message deserves any reply at all
    /// / 判断是否应该响应该消息
    pub fn should_respond(&self, message: &str) -> bool {
        let trimmed = message.trim();

        // 过滤掉太短的消息
        if trimmed.chars().count() < 2 {
            return false;
        }

        // 过滤掉纯数字
        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }

        // 过滤掉常见的无意义消息
        const IGNORE: &[&str] = &["哈哈", "呵呵", "嗯嗯", "好的", "谢谢", "👍", "😄", "😊"];
        let lower = trimmed.to_lowercase();
        !IGNORE.contains(&lower.as_str())
    }
}

/// Episode cell for display / 集数显示归一化
///
/// Numeric-looking values (including float artifacts like "46.0") become the
/// integer; empty cells become 未知; anything else (e.g. "全集") passes through.
fn normalize_episodes(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "未知".to_string();
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => (n as i64).to_string(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::entry::{CatalogEntry, RawRow};
    use crate::search::schema::SearchResult;

    fn formatter() -> MessageFormatter {
        MessageFormatter::new(MessageFormatConfig::default(), 3)
    }

    fn result(title: &str, episodes: &str, actors: &str) -> SearchResult {
        let entry = CatalogEntry::from_row(RawRow {
            media_type: "电视剧".to_string(),
            title: title.to_string(),
            episodes: episodes.to_string(),
            actors: actors.to_string(),
            ..Default::default()
        })
        .unwrap();
        SearchResult {
            entry_id: 0,
            entry,
            score: 1.0,
        }
    }

    #[test]
    fn empty_results_apologize_naming_the_query() {
        let batches = formatter().format_results(&[], "庆余年", 0);
        assert_eq!(batches.len(), 1);
        assert!(batches[0].contains("庆余年"));
        assert!(batches[0].contains("抱歉"));
    }

    #[test]
    fn seven_results_batch_size_three_gives_three_marked_batches() {
        let results: Vec<SearchResult> =
            (0..7).map(|i| result(&format!("剧{}", i), "10", "某人")).collect();
        let batches = formatter().format_results(&results, "剧", 7);

        assert_eq!(batches.len(), 3);
        assert!(batches[0].contains("第1/3批"));
        assert!(batches[1].contains("第2/3批"));
        assert!(batches[2].contains("第3/3批"));
        // every rendered entry is present exactly once / 七条结果全部出现
        let rendered: usize = batches.iter().map(|b| b.matches("🎬《").count()).sum();
        assert_eq!(rendered, 7);
    }

    #[test]
    fn single_batch_carries_no_marker() {
        let results = vec![result("Alpha", "10", "X")];
        let batches = formatter().format_results(&results, "Alpha", 1);
        assert_eq!(batches.len(), 1);
        assert!(!batches[0].contains("批结果"));
    }

    #[test]
    fn capped_results_prefix_first_batch_with_notice() {
        let results: Vec<SearchResult> =
            (0..4).map(|i| result(&format!("剧{}", i), "10", "某人")).collect();
        let batches = formatter().format_results(&results, "剧", 15);
        assert!(batches[0].contains("找到 15 个相关结果"));
        assert!(batches[0].contains("前 4 个"));
        assert!(!batches[1].contains("找到 15 个"));
    }

    #[test]
    fn unparseable_episodes_render_unknown() {
        // "nan" is cleaned to empty at load time / "nan" 在加载时已清洗为空
        let batches = formatter().format_results(&[result("Beta", "nan", "Y,Z")], "Y", 1);
        assert!(batches[0].contains("集数：未知"));
    }

    #[test]
    fn float_episodes_normalize_to_integer() {
        let batches = formatter().format_results(&[result("Alpha", "46.0", "X")], "Alpha", 1);
        assert!(batches[0].contains("集数：46集"));
    }

    #[test]
    fn non_numeric_episodes_pass_through() {
        let batches = formatter().format_results(&[result("Alpha", "全集", "X")], "Alpha", 1);
        assert!(batches[0].contains("集数：全集"));
    }

    #[test]
    fn missing_links_render_placeholder() {
        let batches = formatter().format_results(&[result("Alpha", "10", "X")], "Alpha", 1);
        assert!(batches[0].contains("夸克：暂无"));
        assert!(batches[0].contains("百度：暂无"));
    }

    #[test]
    fn error_templates_cover_all_categories() {
        let f = formatter();
        assert!(f.format_error(ReplyError::RateLimited, None).contains("频繁"));
        assert!(f
            .format_error(ReplyError::SystemError, Some("内部错误"))
            .contains("详情：内部错误"));
        assert!(f.format_error(ReplyError::NoData, None).contains("数据库"));
    }

    #[test]
    fn should_respond_filters_noise() {
        let f = formatter();
        assert!(!f.should_respond(""));
        assert!(!f.should_respond("x"));
        assert!(!f.should_respond("12345"));
        assert!(!f.should_respond("哈哈"));
        assert!(!f.should_respond("谢谢"));
        assert!(f.should_respond("庆余年"));
        assert!(f.should_respond("张若昀 古装"));
    }
}
