//! Message module - reply rendering and throttled dispatch / 消息模块
//!
//! - `formatter`: pure rendering of search results into paginated batches,
//!   plus the fixed reply templates (help, stats, errors) / 结果渲染与固定模板
//! - `dispatcher`: detached, delay-scheduled sending through the outbound
//!   channel collaborator / 延迟调度发送

pub mod dispatcher;
pub mod formatter;

pub use dispatcher::{Dispatcher, OutboundChannel};
pub use formatter::{MessageFormatter, ReplyError};
