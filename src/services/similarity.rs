//! 答案相似度 - 业务能力层
//!
//! 只负责字符串层面的判分能力，不关心流程：
//! - 归一化编辑距离相似度（自动判分的本地快速通道）
//! - 词语差异（解释"哪里错了"的辅助信息）
//! - 低质量答案守卫（省掉没有意义的模型调用）

use std::collections::BTreeSet;

/// 自动判分阈值（固定值，不可配置）
pub const MATCH_THRESHOLD: f64 = 0.75;

/// 低于该字符数的答案直接被拒绝
pub const MIN_ANSWER_CHARS: usize = 5;

/// 整句放弃短语（不区分大小写）
const GIVE_UP_PHRASE: &str = "i don't know";

/// 低质量答案的固定反馈文案
pub const ELABORATION_REQUEST: &str =
    "Please elaborate on your answer — a few words are not enough for useful feedback. \
     Try explaining the idea in your own words.";

/// 两个词集合的差异
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WordDiff {
    /// 参考答案里有、候选答案里没有的词
    pub missing: BTreeSet<String>,
    /// 候选答案里有、参考答案里没有的词
    pub incorrect: BTreeSet<String>,
}

/// 经典 Levenshtein 编辑距离（按字符计）
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // 滚动两行 DP
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// 归一化相似度，取值 [0, 1]
///
/// `1 - levenshtein(lower(trim(a)), lower(trim(b))) / max(len)`，
/// 长度按归一化后的字符数计。
/// 两边同时为空属于未定义输入，必须由调用方拒绝，不应计算。
pub fn normalized_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    debug_assert!(
        !(a.is_empty() && b.is_empty()),
        "两边同时为空属于未定义输入"
    );

    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 0.0;
    }

    1.0 - levenshtein_distance(&a, &b) as f64 / max_len as f64
}

/// 是否足够相似到算作"答对"
///
/// 固定阈值 0.75；两边都为空直接算不匹配。
pub fn is_match(a: &str, b: &str) -> bool {
    if a.trim().is_empty() && b.trim().is_empty() {
        return false;
    }
    normalized_similarity(a, b) > MATCH_THRESHOLD
}

/// 计算候选答案和参考答案的词语差异
///
/// 空白分词，不区分大小写；结果是集合，顺序无意义。
pub fn word_diff(candidate: &str, reference: &str) -> WordDiff {
    let candidate_words: BTreeSet<String> = candidate
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect();
    let reference_words: BTreeSet<String> = reference
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect();

    WordDiff {
        missing: reference_words
            .difference(&candidate_words)
            .cloned()
            .collect(),
        incorrect: candidate_words
            .difference(&reference_words)
            .cloned()
            .collect(),
    }
}

/// 低质量答案守卫
///
/// 少于 5 个字符、或整句就是 "i don't know"（不区分大小写）的答案
/// 在本地拒绝，永远不发给模型。这是成本控制规则，不是正确性规则。
pub fn is_low_effort_answer(answer: &str) -> bool {
    let trimmed = answer.trim();
    trimmed.chars().count() < MIN_ANSWER_CHARS
        || trimmed.to_lowercase() == GIVE_UP_PHRASE
}
