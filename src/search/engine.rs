//! Search engine - multi-strategy in-memory search / 搜索引擎
//!
//! Resolves a free-text query into a ranked, deduplicated result list:
//! exact → fuzzy → token passes per sub-query, extraction heuristics and
//! synonyms fanning extra sub-queries into the same pool, dedup by title
//! (first occurrence wins, so pass order is the implicit priority), then one
//! scoring pass against the preprocessed query. Never fabricates a result:
//! an empty pool is an empty reply, not an error.

use std::collections::HashSet;
use std::sync::Arc;

use crate::catalog::entry::CatalogEntry;
use crate::catalog::store::{CatalogSnapshot, CatalogStore};
use crate::config::SearchConfig;
use crate::search::query::{extract_signals, is_stop_word, preprocess, synonyms};
use crate::search::schema::SearchResult;
use crate::search::tokenizer::tokenize;

/// Engine tunables / 搜索参数
#[derive(Debug, Clone)]
pub struct SearchParams {
    /// Fuzzy admission threshold, 0-100 / 模糊匹配阈值
    pub similarity_threshold: u32,
    /// Result cap / 结果上限
    pub max_results: usize,
}

impl From<&SearchConfig> for SearchParams {
    fn from(cfg: &SearchConfig) -> Self {
        Self {
            similarity_threshold: cfg.similarity_threshold,
            max_results: cfg.max_results,
        }
    }
}

/// Search engine over the catalog store / 目录搜索引擎
pub struct SearchEngine {
    store: Arc<CatalogStore>,
    params: SearchParams,
}

impl SearchEngine {
    pub fn new(store: Arc<CatalogStore>, params: SearchParams) -> Self {
        Self { store, params }
    }

    /// Intelligent search / 智能搜索
    ///
    /// Returns at most `max_results` hits, best first. Ties keep discovery
    /// order (the sort is stable), so repeated runs against the same snapshot
    /// answer identically.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        self.search_with_total(query).0
    }

    /// Search, also reporting the uncapped match count
    /// / 搜索并返回截断前的总命中数（用于"仅显示前 K 个"提示）
    pub fn search_with_total(&self, query: &str) -> (Vec<SearchResult>, usize) {
        let raw = query.trim();
        if raw.is_empty() {
            return (Vec::new(), 0);
        }
        let snapshot = self.store.snapshot();
        if snapshot.is_empty() {
            return (Vec::new(), 0);
        }

        let processed = preprocess(raw);

        // 多策略搜索：主查询 + 提取信息 + 同义词
        let mut sub_queries = vec![processed.clone()];
        sub_queries.extend(extract_signals(&processed));
        sub_queries.extend(synonyms(&processed));

        let mut pool: Vec<usize> = Vec::new();
        let mut seen_ids: HashSet<usize> = HashSet::new();
        for sub_query in &sub_queries {
            for id in self.collect_candidates(&snapshot, sub_query) {
                if seen_ids.insert(id) {
                    pool.push(id);
                }
            }
        }

        // 去重 - 基于剧名，首次出现者胜出
        let mut seen_titles: HashSet<String> = HashSet::new();
        let unique: Vec<usize> = pool
            .into_iter()
            .filter(|&id| seen_titles.insert(snapshot.entries[id].title.to_lowercase()))
            .collect();
        let total = unique.len();

        let mut results: Vec<SearchResult> = unique
            .into_iter()
            .map(|id| SearchResult {
                entry_id: id,
                entry: snapshot.entries[id].clone(),
                score: relevance_score(&snapshot.entries[id], &processed),
            })
            .collect();

        // 按分数降序，stable sort 保证同分保持发现顺序
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(self.params.max_results);
        (results, total)
    }

    /// One sub-query through the three passes / 单个子查询跑三个检索阶段
    ///
    /// Later passes only run while the pool is still below the cap, a
    /// short-circuit optimization, not a correctness requirement.
    fn collect_candidates(&self, snapshot: &CatalogSnapshot, sub_query: &str) -> Vec<usize> {
        let q = sub_query.trim().to_lowercase();
        if q.is_empty() {
            return Vec::new();
        }
        let cap = self.params.max_results;

        let mut ids: Vec<usize> = Vec::new();
        let mut seen: HashSet<usize> = HashSet::new();

        // 1. 精确匹配
        for id in snapshot.index.lookup_exact(&q) {
            if seen.insert(id) {
                ids.push(id);
            }
        }

        // 2. 模糊匹配
        if ids.len() < cap {
            self.fuzzy_pass(snapshot, &q, &mut ids, &mut seen);
        }

        // 3. 分词搜索
        if ids.len() < cap {
            for token in tokenize(&q) {
                if token.chars().count() <= 1 || is_stop_word(&token) {
                    continue;
                }
                for id in snapshot.index.lookup_token(&token) {
                    if seen.insert(id) {
                        ids.push(id);
                    }
                }
            }
        }

        ids
    }

    /// Fuzzy pass over distinct titles and distinct cast members
    /// / 对去重后的剧名与演员名做模糊匹配
    fn fuzzy_pass(
        &self,
        snapshot: &CatalogSnapshot,
        q: &str,
        ids: &mut Vec<usize>,
        seen: &mut HashSet<usize>,
    ) {
        let threshold = f64::from(self.params.similarity_threshold);

        // 在剧名中模糊搜索
        let mut seen_titles: HashSet<String> = HashSet::new();
        for entry in &snapshot.entries {
            let title = entry.title.to_lowercase();
            if !seen_titles.insert(title.clone()) {
                continue;
            }
            if partial_ratio(q, &title) >= threshold {
                for id in snapshot.index.lookup_title(&title) {
                    if seen.insert(id) {
                        ids.push(id);
                    }
                }
            }
        }

        // 在演员名称中模糊搜索
        let mut seen_members: HashSet<String> = HashSet::new();
        for entry in &snapshot.entries {
            for member in &entry.cast {
                let member = member.to_lowercase();
                if !seen_members.insert(member.clone()) {
                    continue;
                }
                if partial_ratio(q, &member) >= threshold {
                    for id in snapshot.index.lookup_cast(&member) {
                        if seen.insert(id) {
                            ids.push(id);
                        }
                    }
                }
            }
        }
    }

    /// Search suggestions for a partial query / 搜索建议
    pub fn suggestions(&self, partial: &str) -> Vec<String> {
        let partial = partial.trim().to_lowercase();
        if partial.chars().count() < 2 {
            return Vec::new();
        }
        self.store.snapshot().index.keys_containing(&partial, 10)
    }

    /// Filter by media type / 按媒体类型搜索
    pub fn search_by_type(&self, media_type: &str) -> Vec<SearchResult> {
        let wanted = media_type.trim().to_lowercase();
        if wanted.is_empty() {
            return Vec::new();
        }
        let snapshot = self.store.snapshot();
        snapshot
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.media_type.to_lowercase().contains(&wanted))
            .map(|(id, e)| SearchResult {
                entry_id: id,
                entry: e.clone(),
                score: 0.0,
            })
            .collect()
    }
}

/// Relevance score against the preprocessed query / 计算相关性分数
///
/// `0.6·titleSim + 0.4·castSim`, `+0.3` raw substring of title, `+0.2` raw
/// substring of cast, `+0.1`/`+0.05` per matched token, capped at 2.0. The
/// exact weights are load-bearing for ordering compatibility with existing
/// catalogs; do not retune them casually.
pub fn relevance_score(entry: &CatalogEntry, query: &str) -> f64 {
    let q = query.to_lowercase();
    let title = entry.title.to_lowercase();
    let cast_str = entry.cast_display().to_lowercase();

    let mut score = 0.0;

    // 剧名匹配分数 (权重: 0.6)
    if !title.is_empty() {
        score += partial_ratio(&q, &title) / 100.0 * 0.6;
    }

    // 演员匹配分数 (权重: 0.4)
    if !cast_str.is_empty() {
        score += partial_ratio(&q, &cast_str) / 100.0 * 0.4;
    }

    // 完全匹配加分
    if title.contains(&q) {
        score += 0.3;
    }
    if cast_str.contains(&q) {
        score += 0.2;
    }

    // 关键词匹配加分
    for word in tokenize(&q) {
        if word.chars().count() > 1 {
            if title.contains(&word) {
                score += 0.1;
            }
            if cast_str.contains(&word) {
                score += 0.05;
            }
        }
    }

    score.min(2.0)
}

/// Partial-string similarity, 0-100 / 部分字符串相似度
///
/// Best normalized edit-distance similarity of the shorter string against
/// every equal-length window of the longer one. 100 means the shorter string
/// appears verbatim (or within edit distance 0) somewhere in the longer.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() || b_chars.is_empty() {
        return 0.0;
    }

    let (short, long) = if a_chars.len() <= b_chars.len() {
        (&a_chars, &b_chars)
    } else {
        (&b_chars, &a_chars)
    };

    let mut best = 0.0f64;
    for window in long.windows(short.len()) {
        let distance = levenshtein_distance(short, window);
        let similarity = 100.0 * (1.0 - distance as f64 / short.len() as f64);
        if similarity > best {
            best = similarity;
        }
        if best >= 100.0 {
            break;
        }
    }
    best
}

/// 计算 Levenshtein 编辑距离
fn levenshtein_distance(s1: &[char], s2: &[char]) -> usize {
    let len1 = s1.len();
    let len2 = s2.len();

    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    let mut matrix = vec![vec![0usize; len2 + 1]; len1 + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=len2 {
        matrix[0][j] = j;
    }

    for i in 1..=len1 {
        for j in 1..=len2 {
            let cost = if s1[i - 1] == s2[j - 1] { 0 } else { 1 };
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[len1][len2]
}
