//! Catalog snapshot store / 目录快照存储
//!
//! Holds the current `(entries, index)` pair behind one `Arc`. Reload builds
//! the replacement completely off to the side, then swaps the pointer under a
//! short write lock. Concurrent searches hold their own `Arc` clone and see
//! either the fully-old or the fully-new snapshot, never a partial rebuild.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::catalog::entry::CatalogEntry;
use crate::catalog::source::CatalogSource;
use crate::error::LoadError;
use crate::search::index::CatalogIndex;

/// One immutable catalog generation / 一代不可变目录数据
pub struct CatalogSnapshot {
    pub entries: Vec<CatalogEntry>,
    pub index: CatalogIndex,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    /// The empty snapshot served before the first successful load
    /// / 首次加载成功前使用的空快照
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            index: CatalogIndex::build(&[]),
            loaded_at: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Catalog statistics / 目录统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStats {
    /// 条目总数
    pub entry_count: usize,
    /// 剧名关键词数
    pub title_keywords: usize,
    /// 演员关键词数
    pub cast_keywords: usize,
}

/// Snapshot holder / 快照持有者
pub struct CatalogStore {
    snapshot: RwLock<Arc<CatalogSnapshot>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(CatalogSnapshot::empty())),
        }
    }

    /// Current snapshot handle / 当前快照
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.read().clone()
    }

    /// Rebuild the catalog from the source / 从数据源整体重建目录
    ///
    /// Returns the number of loaded entries. On [`LoadError`] the previous
    /// snapshot stays in place (or the empty one if nothing was ever loaded).
    pub fn reload(&self, source: &dyn CatalogSource) -> Result<usize, LoadError> {
        let rows = source.load_all()?;
        let row_count = rows.len();

        let mut entries = Vec::with_capacity(row_count);
        for (row_idx, row) in rows.into_iter().enumerate() {
            match CatalogEntry::from_row(row) {
                Some(entry) => entries.push(entry),
                // malformed row: drop it, keep the rest / 无效行丢弃，其余保留
                None => tracing::debug!("目录第 {} 行缺少剧名，已跳过", row_idx + 1),
            }
        }

        let index = CatalogIndex::build(&entries);
        let loaded = entries.len();
        let snapshot = Arc::new(CatalogSnapshot {
            entries,
            index,
            loaded_at: Some(Utc::now()),
        });

        // the swap is the only write; everything above ran on the side
        *self.snapshot.write() = snapshot;

        tracing::info!("成功加载 {} 条数据（原始 {} 行）", loaded, row_count);
        Ok(loaded)
    }

    pub fn stats(&self) -> CatalogStats {
        let snapshot = self.snapshot();
        CatalogStats {
            entry_count: snapshot.entries.len(),
            title_keywords: snapshot.index.title_key_count(),
            cast_keywords: snapshot.index.cast_key_count(),
        }
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}
