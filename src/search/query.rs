//! Query preprocessing and signal extraction / 查询预处理与关键信息提取
//!
//! Stop words, the synonym map and the extraction patterns are policy tables,
//! not algorithms: extend the tables, not the ranking code.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::search::tokenizer::tokenize;

/// 常见的无意义词汇
pub const STOP_WORDS: &[&str] = &[
    "的", "了", "是", "在", "有", "和", "与", "或", "电视剧", "电影", "剧集",
];

/// Name-shaped runs containing these are descriptions, not names
/// / 含这些片段的汉字串是描述词，不是人名
const NAME_EXCLUDE: &[&str] = &["电视", "电影", "剧集", "网盘"];

/// Bidirectional genre synonym table / 题材同义词表（双向）
const SYNONYM_MAP: &[(&str, &[&str])] = &[
    ("古装", &["古代", "古风", "宫廷"]),
    ("现代", &["都市", "当代", "现代剧"]),
    ("爱情", &["恋爱", "言情", "浪漫"]),
    ("悬疑", &["推理", "犯罪", "刑侦"]),
    ("喜剧", &["搞笑", "幽默", "轻松"]),
    ("历史", &["古代", "历史剧"]),
    ("战争", &["军事", "抗战"]),
    ("青春", &["校园", "学生"]),
];

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}年?").unwrap());
static EPISODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)集").unwrap());
static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x{4e00}-\x{9fff}]{2,4}").unwrap());

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Preprocess a query / 预处理查询字符串
///
/// Collapses whitespace, drops stop words and single characters, rejoins the
/// survivors with spaces. Falls back to the cleaned raw query when nothing
/// survives; a stop-word-only query is still a query.
pub fn preprocess(query: &str) -> String {
    let collapsed = query.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return collapsed;
    }

    let filtered: Vec<String> = tokenize(&collapsed)
        .into_iter()
        .filter(|w| !is_stop_word(w) && w.chars().count() > 1)
        .collect();

    if filtered.is_empty() {
        collapsed
    } else {
        filtered.join(" ")
    }
}

/// Extract auxiliary search signals / 从查询中提取关键信息
///
/// Years, episode counts and name-shaped 2-4 char Han runs, each re-submitted
/// as its own sub-query by the engine.
pub fn extract_signals(query: &str) -> Vec<String> {
    let mut extracted = Vec::new();

    // 提取年份
    for m in YEAR_RE.find_iter(query) {
        extracted.push(m.as_str().trim_end_matches('年').to_string());
    }

    // 提取集数信息
    for caps in EPISODE_RE.captures_iter(query) {
        extracted.push(format!("{}集", &caps[1]));
    }

    // 提取可能的演员名字（2-4个汉字）
    for m in NAME_RE.find_iter(query) {
        let name = m.as_str();
        if !NAME_EXCLUDE.iter().any(|ex| name.contains(ex)) {
            extracted.push(name.to_string());
        }
    }

    dedup_keep_order(extracted)
}

/// Synonym expansion / 同义词扩展
///
/// Both directions: a key in the query pulls in its values, a value pulls in
/// its key.
pub fn synonyms(query: &str) -> Vec<String> {
    let mut expanded = Vec::new();

    for (key, values) in SYNONYM_MAP {
        if query.contains(key) {
            expanded.extend(values.iter().map(|v| v.to_string()));
        }
        for value in *values {
            if query.contains(value) {
                expanded.push(key.to_string());
            }
        }
    }

    dedup_keep_order(expanded)
}

/// Dedup preserving first occurrence / 去重并保持首次出现顺序
fn dedup_keep_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|i| seen.insert(i.clone())).collect()
}
