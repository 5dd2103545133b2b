//! Catalog module - in-memory media catalog / 媒体资源目录模块
//!
//! The catalog is rebuilt in memory from an external source snapshot on every
//! (re)load; there is no persistence layer. Call direction: bot → catalog
//! (unidirectional) / 目录在内存中整体重建，无持久化层
//!
//! - `entry`: row model and conversion rules / 行模型与转换规则
//! - `source`: the external source collaborator contract / 数据源协作方契约
//! - `store`: snapshot holder with atomic swap on reload / 快照持有与原子切换

pub mod entry;
pub mod source;
pub mod store;

pub use entry::{CatalogEntry, LinkKind, RawRow};
pub use source::{CatalogSource, JsonCatalogSource, StaticSource};
pub use store::{CatalogSnapshot, CatalogStats, CatalogStore};
