//! 答案缓存 - 业务能力层
//!
//! 以 (问题, 用户答案, 上下文) 的精确字符串拼接作为键，
//! 缓存归一化后的模型响应。不做任何空白/大小写归一：
//! 措辞不同但语义相同的问题永远不会命中缓存，这是明确接受的限制。
//! 容量有界，按最近最少使用淘汰。

use std::collections::{HashMap, VecDeque};

use crate::models::Evaluation;

/// 构造缓存键：三段输入的精确拼接
pub fn cache_key(question: &str, user_answer: Option<&str>, context: Option<&str>) -> String {
    format!(
        "{}{}{}",
        question,
        user_answer.unwrap_or(""),
        context.unwrap_or("")
    )
}

/// 有界 LRU 答案缓存
pub struct AnswerCache {
    capacity: usize,
    map: HashMap<String, Evaluation>,
    /// 访问顺序，队尾最新
    order: VecDeque<String>,
}

impl AnswerCache {
    /// 创建缓存，容量至少为 1
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            map: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// 查询缓存，命中时刷新该键的最近使用位置
    pub fn get(&mut self, key: &str) -> Option<Evaluation> {
        if !self.map.contains_key(key) {
            return None;
        }
        self.touch(key);
        self.map.get(key).cloned()
    }

    /// 写入缓存，必要时淘汰最久未使用的条目
    pub fn put(&mut self, key: String, value: Evaluation) {
        if self.map.contains_key(&key) {
            self.map.insert(key.clone(), value);
            self.touch(&key);
            return;
        }

        if self.map.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }

        self.order.push_back(key.clone());
        self.map.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// 把键移到访问顺序队尾
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(feedback: &str) -> Evaluation {
        Evaluation {
            feedback: feedback.to_string(),
            correct_answer: String::new(),
        }
    }

    #[test]
    fn test_put_and_get() {
        let mut cache = AnswerCache::new(4);
        let key = cache_key("q", Some("a"), Some("ctx"));
        cache.put(key.clone(), eval("ok"));

        assert_eq!(cache.get(&key).unwrap().feedback, "ok");
        assert!(cache.get("other").is_none());
    }

    #[test]
    fn test_exact_string_keys() {
        let mut cache = AnswerCache::new(4);
        cache.put(cache_key("Q?", None, None), eval("hit"));

        // 空白/大小写差异不命中
        assert!(cache.get(&cache_key("q?", None, None)).is_none());
        assert!(cache.get(&cache_key("Q? ", None, None)).is_none());
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = AnswerCache::new(2);
        cache.put("a".to_string(), eval("1"));
        cache.put("b".to_string(), eval("2"));

        // 访问 a，b 变成最久未使用
        assert!(cache.get("a").is_some());
        cache.put("c".to_string(), eval("3"));

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_put_same_key_updates_value() {
        let mut cache = AnswerCache::new(2);
        cache.put("a".to_string(), eval("old"));
        cache.put("a".to_string(), eval("new"));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").unwrap().feedback, "new");
    }
}
