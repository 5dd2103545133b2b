//! Catalog entry model / 目录条目模型

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resource link kind / 网盘链接类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// 夸克网盘
    Quark,
    /// 百度网盘
    Baidu,
}

impl LinkKind {
    pub fn label(&self) -> &'static str {
        match self {
            LinkKind::Quark => "夸克",
            LinkKind::Baidu => "百度",
        }
    }
}

/// One raw row as delivered by a catalog source / 数据源提供的原始行
///
/// All fields are optional strings; conversion decides what survives.
/// Spreadsheet exports leave "nan" artifacts in empty cells, treated as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRow {
    /// 媒体类型
    #[serde(default)]
    pub media_type: String,
    /// 剧名
    #[serde(default)]
    pub title: String,
    /// 集数
    #[serde(default)]
    pub episodes: String,
    /// 演员名称（单元格原文，多种分隔符）
    #[serde(default)]
    pub actors: String,
    /// 夸克网盘链接
    #[serde(default)]
    pub quark_link: String,
    /// 百度网盘链接
    #[serde(default)]
    pub baidu_link: String,
}

/// One immutable catalog entry / 一条不可变的目录条目
///
/// Identified by its row index within the loaded snapshot; replaced wholesale
/// on reload, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub media_type: String,
    pub title: String,
    /// Raw episode cell; display normalization happens in the formatter
    /// / 集数原文，显示层再做归一化
    pub episodes: String,
    /// Cast members in catalog order / 演员列表（保持目录顺序）
    pub cast: Vec<String>,
    pub links: BTreeMap<LinkKind, String>,
}

impl CatalogEntry {
    /// Build an entry from a raw row; rows without a title are dropped
    /// / 从原始行构造条目，剧名为空的行被丢弃
    pub fn from_row(row: RawRow) -> Option<Self> {
        let title = clean_cell(&row.title)?;

        let cast = split_cast(&row.actors);

        let mut links = BTreeMap::new();
        if let Some(url) = clean_cell(&row.quark_link) {
            links.insert(LinkKind::Quark, url);
        }
        if let Some(url) = clean_cell(&row.baidu_link) {
            links.insert(LinkKind::Baidu, url);
        }

        Some(Self {
            media_type: clean_cell(&row.media_type).unwrap_or_default(),
            title,
            episodes: clean_cell(&row.episodes).unwrap_or_default(),
            cast,
            links,
        })
    }

    pub fn link(&self, kind: LinkKind) -> Option<&str> {
        self.links.get(&kind).map(String::as_str)
    }

    /// Cast rendered as one string / 演员列表拼成一个字符串
    pub fn cast_display(&self) -> String {
        self.cast.join("、")
    }
}

/// Trimmed cell content, with empty and "nan" cells mapped to None
/// / 去除空白后的单元格内容，空值与 "nan" 视为缺失
fn clean_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Split an actor cell on every separator the catalog uses
/// / 按目录中出现的各种分隔符拆分演员单元格（顿号、逗号、空格、全角空格）
pub fn split_cast(actors: &str) -> Vec<String> {
    actors
        .split(['、', ',', '，', ' ', '　'])
        .filter_map(clean_cell)
        .collect()
}
