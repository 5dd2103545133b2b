//! Chinese tokenizer - uses jieba-rs for Chinese word segmentation / 中文分词器
//!
//! Supports / 支持：
//! - Chinese word segmentation (jieba) / 中文分词
//! - English word segmentation (space-separated + lowercase) / 英文分词
//! - Mixed text processing / 混合文本处理
//!
//! Deterministic and side-effect free; malformed or mixed-script input never
//! fails: jieba passes unknown runs through, worst case the whole input
//! surfaces as a single token.

use jieba_rs::Jieba;
use once_cell::sync::Lazy;

/// Global jieba tokenizer instance / 全局 jieba 分词器实例
static JIEBA: Lazy<Jieba> = Lazy::new(Jieba::new);

/// Tokenize text / 对文本进行分词
///
/// Default cut mode: catalog fields are short names, whole words index better
/// than search-mode fragments / 默认切分模式，目录字段是短名称
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();

    let words = JIEBA.cut(text, true);

    for word in words {
        let word = word.trim();
        if word.is_empty() {
            continue;
        }

        // Convert to lowercase and add / 转小写并添加
        tokens.push(word.to_lowercase());
    }

    tokens
}

/// Tokenize, keeping only tokens long enough to index / 分词并过滤单字
///
/// Single characters are too ambiguous to index or look up.
pub fn tokenize_indexable(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| t.chars().count() > 1)
        .collect()
}

/// Check if text contains Chinese characters / 检测文本是否包含中文字符
pub fn contains_chinese(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c, '\u{4e00}'..='\u{9fff}' | '\u{3400}'..='\u{4dbf}'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_chinese() {
        let tokens = tokenize("庆余年第二季");
        assert!(!tokens.is_empty());
        // jieba 会将其分词为多个词
        assert!(tokens.concat().contains("庆余年") || tokens.iter().any(|t| t.contains('庆')));
    }

    #[test]
    fn test_tokenize_english_lowercases() {
        let tokens = tokenize("Hello World Test");
        assert!(tokens.contains(&"hello".to_string()));
        assert!(tokens.contains(&"world".to_string()));
        assert!(tokens.contains(&"test".to_string()));
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_tokenize_is_deterministic() {
        let a = tokenize("张若昀 古装 电视剧");
        let b = tokenize("张若昀 古装 电视剧");
        assert_eq!(a, b);
    }

    #[test]
    fn test_indexable_drops_single_chars() {
        let tokens = tokenize_indexable("我 爱 流浪地球");
        assert!(tokens.iter().all(|t| t.chars().count() > 1));
    }

    #[test]
    fn test_contains_chinese() {
        assert!(contains_chinese("测试"));
        assert!(contains_chinese("test测试"));
        assert!(!contains_chinese("test"));
    }
}
