//! Inverted catalog index / 目录倒排索引
//!
//! Two mappings, title and cast, from token to the set of entry ids carrying
//! it. Keys are the full untokenized strings (title, each cast member) plus
//! jieba tokens of length ≥ 2. The index is a plain value: `build` constructs
//! a fresh one and the store swaps it in, never patching in place, so every
//! bucket only ever references entries of the snapshot it was built for.

use std::collections::{BTreeSet, HashMap};

use crate::catalog::entry::CatalogEntry;
use crate::search::tokenizer::tokenize_indexable;

/// Inverted index over one catalog snapshot / 单代目录数据的倒排索引
pub struct CatalogIndex {
    /// token → entry ids, title side / 剧名索引
    title_index: HashMap<String, BTreeSet<usize>>,
    /// token → entry ids, cast side / 演员索引
    cast_index: HashMap<String, BTreeSet<usize>>,
}

impl CatalogIndex {
    /// Build from entries, O(N·tokens) / 从条目整体构建
    pub fn build(entries: &[CatalogEntry]) -> Self {
        let mut title_index: HashMap<String, BTreeSet<usize>> = HashMap::new();
        let mut cast_index: HashMap<String, BTreeSet<usize>> = HashMap::new();

        for (id, entry) in entries.iter().enumerate() {
            // full title is always a key, regardless of length / 完整剧名必入索引
            title_index
                .entry(entry.title.to_lowercase())
                .or_default()
                .insert(id);
            for token in tokenize_indexable(&entry.title) {
                title_index.entry(token).or_default().insert(id);
            }

            for member in &entry.cast {
                cast_index
                    .entry(member.to_lowercase())
                    .or_default()
                    .insert(id);
                for token in tokenize_indexable(member) {
                    cast_index.entry(token).or_default().insert(id);
                }
            }
        }

        Self {
            title_index,
            cast_index,
        }
    }

    /// Exact lookup of a full term / 完整词项的精确查找
    ///
    /// Union of both sides, ascending entry-id order (deterministic discovery
    /// order for the caller).
    pub fn lookup_exact(&self, term: &str) -> Vec<usize> {
        let mut ids = BTreeSet::new();
        if let Some(bucket) = self.title_index.get(term) {
            ids.extend(bucket.iter().copied());
        }
        if let Some(bucket) = self.cast_index.get(term) {
            ids.extend(bucket.iter().copied());
        }
        ids.into_iter().collect()
    }

    /// Lookup of one produced token / 单个分词结果的查找
    ///
    /// Semantically the same operation as [`lookup_exact`]; kept distinct so
    /// call sites read as what they are.
    pub fn lookup_token(&self, token: &str) -> Vec<usize> {
        self.lookup_exact(token)
    }

    /// Entry ids for a full title, title side only / 按剧名查条目（仅剧名侧）
    pub fn lookup_title(&self, title: &str) -> Vec<usize> {
        self.title_index
            .get(title)
            .map(|bucket| bucket.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Entry ids for a full cast member name / 按演员全名查条目
    pub fn lookup_cast(&self, member: &str) -> Vec<usize> {
        self.cast_index
            .get(member)
            .map(|bucket| bucket.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn title_key_count(&self) -> usize {
        self.title_index.len()
    }

    pub fn cast_key_count(&self) -> usize {
        self.cast_index.len()
    }

    /// Index keys containing the given fragment / 包含给定片段的索引键
    ///
    /// Feeds search suggestions; order follows entry ids of the first hit so
    /// the output is stable across runs.
    pub fn keys_containing(&self, fragment: &str, limit: usize) -> Vec<String> {
        let mut hits: Vec<(&String, usize)> = Vec::new();
        for (key, bucket) in self.title_index.iter().chain(self.cast_index.iter()) {
            if key.contains(fragment) {
                if let Some(&first) = bucket.iter().next() {
                    hits.push((key, first));
                }
            }
        }
        hits.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));

        // a key can live in both indexes / 同一个键可能同时出现在两个索引里
        let mut seen = std::collections::HashSet::new();
        hits.into_iter()
            .filter(|(k, _)| seen.insert(k.as_str()))
            .take(limit)
            .map(|(k, _)| k.clone())
            .collect()
    }
}
