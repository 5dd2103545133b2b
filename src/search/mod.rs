//! Search module - catalog indexing and multi-strategy search / 搜索模块
//!
//! Architecture principles / 架构原则：
//! - Search only exposes primitive operations: build index, search, suggest
//! - The bot controls flow (admission, formatting, dispatch), search never
//!   blocks on I/O
//! - Call direction: bot → search (unidirectional) / 调用方向
//!
//! Strategy order / 检索策略顺序：
//! 1. Exact match on full title / cast strings / 精确匹配
//! 2. Fuzzy partial-similarity match (edit distance) / 模糊匹配
//! 3. Tokenized lookup (jieba word segmentation) / 分词检索
//!
//! Plus extraction heuristics (years, episode counts, name-shaped runs) and a
//! synonym table that fan extra sub-queries into the same candidate pool.

pub mod engine;
pub mod index;
pub mod query;
pub mod schema;
pub mod tokenizer;

pub use engine::{SearchEngine, SearchParams};
pub use index::CatalogIndex;
pub use schema::SearchResult;
