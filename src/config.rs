//! Application configuration module / 应用配置模块
//!
//! Manages application configuration loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件
//!
//! Every field carries a serde default, so an empty file (or one missing
//! arbitrary keys) yields the documented defaults instead of failing.

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ConfigError;

/// Global configuration instance / 全局配置实例
static CONFIG: OnceCell<Arc<RwLock<AppConfig>>> = OnceCell::new();

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Catalog data source configuration / 数据源配置
    #[serde(default)]
    pub data_source: DataSourceConfig,
    /// Search configuration / 搜索配置
    #[serde(default)]
    pub search: SearchConfig,
    /// Rate limit configuration / 频率限制配置
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Send delay configuration / 发送延迟配置
    #[serde(default)]
    pub delay: DelayConfig,
    /// Message format configuration / 消息格式配置
    #[serde(default)]
    pub message_format: MessageFormatConfig,
}

/// Catalog data source configuration / 数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// Catalog file path (JSON array of rows) / 目录文件路径
    #[serde(default = "default_catalog_file")]
    pub catalog_file: String,
}

/// Search configuration / 搜索配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Fuzzy similarity threshold, 0-100 / 模糊匹配相似度阈值
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: u32,
    /// Maximum results per query / 单次查询最大结果数
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Rendered entries per outbound message / 单条消息最多条目数
    #[serde(default = "default_max_items_per_message")]
    pub max_items_per_message: usize,
}

/// Rate limit configuration / 频率限制配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Global cap per trailing hour / 全局每小时上限
    #[serde(default = "default_global_per_hour")]
    pub global_per_hour: usize,
    /// Global cap per trailing minute / 全局每分钟上限
    #[serde(default = "default_global_per_minute")]
    pub global_per_minute: usize,
    /// Per-requester cap per trailing minute / 单用户每分钟上限
    #[serde(default = "default_requester_per_minute")]
    pub requester_per_minute: usize,
    /// Per-channel cap per trailing minute / 单会话每分钟上限
    #[serde(default = "default_channel_per_minute")]
    pub channel_per_minute: usize,
    /// Max tracked identities per scope map / 每个维度最多跟踪的身份数
    #[serde(default = "default_scope_capacity")]
    pub scope_capacity: usize,
}

/// Send delay configuration / 发送延迟配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayConfig {
    /// Base delay in seconds / 基础延迟（秒）
    #[serde(default = "default_base_delay")]
    pub base_delay: f64,
    /// Upper bound of the uniform jitter term / 随机抖动上限（秒）
    #[serde(default = "default_jitter_max")]
    pub jitter_max: f64,
    /// Member count above which delay escalates / 延迟升级的成员数阈值
    #[serde(default = "default_member_threshold")]
    pub member_threshold: usize,
    /// Extra seconds per member over the threshold / 每超出一人增加的秒数
    #[serde(default = "default_escalation_per_member")]
    pub escalation_per_member: f64,
    /// Cap on the escalation term / 升级项上限（秒）
    #[serde(default = "default_escalation_cap")]
    pub escalation_cap: f64,
    /// Extra seconds per message beyond the first / 每多一条消息增加的秒数
    #[serde(default = "default_per_extra_message")]
    pub per_extra_message: f64,
    /// Fallback member count when the directory has no answer / 成员数缺省值
    #[serde(default = "default_member_count")]
    pub default_member_count: usize,
    /// Member count cache freshness window in seconds / 成员数缓存有效期（秒）
    #[serde(default = "default_member_cache_ttl")]
    pub member_cache_ttl_secs: i64,
}

/// Message format configuration / 消息格式配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageFormatConfig {
    /// Template for a single rendered entry / 单条结果模板
    #[serde(default = "default_single_template")]
    pub single_template: String,
    /// Separator between entries inside one batch / 条目分隔符
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Notice when results were capped below the match count / 截断提示模板
    #[serde(default = "default_too_many_results")]
    pub too_many_results: String,
    /// Apologetic reply for an empty result / 无结果提示模板
    #[serde(default = "default_no_result")]
    pub no_result: String,
}

fn default_catalog_file() -> String {
    "data/catalog.json".to_string()
}
fn default_similarity_threshold() -> u32 {
    60
}
fn default_max_results() -> usize {
    10
}
fn default_max_items_per_message() -> usize {
    3
}
fn default_global_per_hour() -> usize {
    50
}
fn default_global_per_minute() -> usize {
    10
}
fn default_requester_per_minute() -> usize {
    3
}
fn default_channel_per_minute() -> usize {
    5
}
fn default_scope_capacity() -> usize {
    1024
}
fn default_base_delay() -> f64 {
    2.0
}
fn default_jitter_max() -> f64 {
    1.5
}
fn default_member_threshold() -> usize {
    20
}
fn default_escalation_per_member() -> f64 {
    0.1
}
fn default_escalation_cap() -> f64 {
    5.0
}
fn default_per_extra_message() -> f64 {
    1.5
}
fn default_member_count() -> usize {
    10
}
fn default_member_cache_ttl() -> i64 {
    300
}
fn default_single_template() -> String {
    "🎬《{title}》\n主演：{cast}\n集数：{episodes}集\n夸克：{quark_link}\n百度：{baidu_link}".to_string()
}
fn default_separator() -> String {
    "\n\n".to_string()
}
fn default_too_many_results() -> String {
    "找到 {count} 个相关结果，为避免刷屏，仅显示前 {shown} 个：".to_string()
}
fn default_no_result() -> String {
    "抱歉，没有找到与「{query}」相关的内容。".to_string()
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            catalog_file: default_catalog_file(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            max_results: default_max_results(),
            max_items_per_message: default_max_items_per_message(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_per_hour: default_global_per_hour(),
            global_per_minute: default_global_per_minute(),
            requester_per_minute: default_requester_per_minute(),
            channel_per_minute: default_channel_per_minute(),
            scope_capacity: default_scope_capacity(),
        }
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            base_delay: default_base_delay(),
            jitter_max: default_jitter_max(),
            member_threshold: default_member_threshold(),
            escalation_per_member: default_escalation_per_member(),
            escalation_cap: default_escalation_cap(),
            per_extra_message: default_per_extra_message(),
            default_member_count: default_member_count(),
            member_cache_ttl_secs: default_member_cache_ttl(),
        }
    }
}

impl Default for MessageFormatConfig {
    fn default() -> Self {
        Self {
            single_template: default_single_template(),
            separator: default_separator(),
            too_many_results: default_too_many_results(),
            no_result: default_no_result(),
        }
    }
}

/// Get the config file path / 获取配置文件路径
fn get_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from an explicit path / 从指定路径加载配置
///
/// Unlike [`load_config`], a missing or malformed file here is a hard
/// [`ConfigError`]: the operator named the file, so silence would hide a typo.
pub fn load_config_from(path: &std::path::Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Load configuration from config.json, or create default if not exists
/// / 加载配置文件，不存在则创建默认配置
///
/// A malformed file degrades to full defaults with a warning: every tunable
/// has a documented default and the bot must keep working without any config.
pub fn load_config() -> AppConfig {
    let config_path = get_config_path();

    if config_path.exists() {
        match load_config_from(&config_path) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {:?}", config_path);
                config
            }
            Err(e) => {
                tracing::warn!("配置文件无效，使用默认配置: {}", e);
                AppConfig::default()
            }
        }
    } else {
        // Create default config / 创建默认配置
        let config = AppConfig::default();
        if let Err(e) = save_config(&config) {
            tracing::warn!("无法写入默认配置文件: {}", e);
        } else {
            tracing::info!("Created default configuration at {:?}", config_path);
        }
        config
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    let config_path = get_config_path();
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(&config_path, content)?;
    Ok(())
}

/// Initialize global configuration / 初始化全局配置
pub fn init_config(config: AppConfig) -> Arc<RwLock<AppConfig>> {
    let config_arc = Arc::new(RwLock::new(config));
    let _ = CONFIG.set(config_arc.clone());
    config_arc
}

/// Get global configuration instance / 获取全局配置实例
pub fn get_config() -> Arc<RwLock<AppConfig>> {
    CONFIG
        .get_or_init(|| Arc::new(RwLock::new(AppConfig::default())))
        .clone()
}

/// Get a read-only snapshot of current config / 获取当前配置的只读快照
pub fn config() -> AppConfig {
    get_config().read().clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_yields_all_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.search.similarity_threshold, 60);
        assert_eq!(config.search.max_results, 10);
        assert_eq!(config.search.max_items_per_message, 3);
        assert_eq!(config.rate_limit.global_per_hour, 50);
        assert_eq!(config.rate_limit.global_per_minute, 10);
        assert_eq!(config.rate_limit.requester_per_minute, 3);
        assert_eq!(config.rate_limit.channel_per_minute, 5);
        assert_eq!(config.delay.member_threshold, 20);
        assert_eq!(config.delay.per_extra_message, 1.5);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"search": {"max_results": 5}}"#).unwrap();
        assert_eq!(config.search.max_results, 5);
        // untouched keys fall back / 未写的键回退默认值
        assert_eq!(config.search.similarity_threshold, 60);
        assert_eq!(config.rate_limit.channel_per_minute, 5);
    }

    #[test]
    fn load_config_from_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_config_from(&path).is_err());
    }
}
