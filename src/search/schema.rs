//! Search result schema / 搜索结果定义

use serde::{Deserialize, Serialize};

use crate::catalog::entry::CatalogEntry;

/// One ranked search hit / 一条带相关性分数的命中结果
///
/// Transient: derived per query, no identity beyond the entry it wraps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Entry id within the snapshot the search ran against / 快照内条目编号
    pub entry_id: usize,
    pub entry: CatalogEntry,
    /// Relevance score, 0.0 - 2.0 / 相关性分数
    ///
    /// A heuristic ordering key, not a probability; never compare scores
    /// across differently-shaped queries.
    pub score: f64,
}
