//! 模型网关 - 业务能力层
//!
//! 只负责"调用远程模型"能力，不关心会话流程：
//! - 先查答案缓存，命中直接返回
//! - 组装固定两字段 JSON 约定的提示词
//! - 有界重试 + 指数退避（基础延迟逐次翻倍）
//! - 模型不守约时回退为纯反馈文本（可配置成严格模式）
//! - 归一化结果写回缓存

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::clients::{Content, ModelClient, Part};
use crate::config::Config;
use crate::error::GatewayError;
use crate::models::Evaluation;
use crate::services::answer_cache::{cache_key, AnswerCache};

/// 出题数量（固定请求 5 道）
pub const QUIZ_QUESTION_COUNT: usize = 5;

/// 出题时要求模型使用的行前缀标记
pub const QUESTION_MARKER: &str = "QUESTION:";

/// 评估提示词里的系统指令
///
/// 远程模型并不可信，这里把格式约定写得尽量死；
/// 真不守约时由 [`parse_evaluation`] 兜底。
const EVALUATION_INSTRUCTION: &str = "You are a strict but encouraging study tutor. \
    Respond ONLY with a valid JSON object containing exactly two fields: \
    \"feedback\" (your answer or assessment for the student) and \
    \"correctAnswer\" (the ideal concise answer, or an empty string if none applies). \
    Do not wrap the JSON in markdown fences and do not add any other text.";

/// 模型网关
pub struct ModelGateway {
    client: ModelClient,
    cache: AnswerCache,
    max_attempts: usize,
    retry_base_delay: Duration,
    strict_json: bool,
}

impl ModelGateway {
    /// 创建新的模型网关
    pub fn new(config: &Config) -> crate::error::Result<Self> {
        Ok(Self {
            client: ModelClient::new(config)?,
            cache: AnswerCache::new(config.cache_capacity),
            max_attempts: config.max_attempts.max(1),
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
            strict_json: config.strict_model_json,
        })
    }

    /// 评估一次提问/作答
    ///
    /// # 参数
    /// - `question`: 问题文本
    /// - `user_answer`: 学生答案（纯提问时缺省）
    /// - `context`: 页面上下文（缺省时不发送，不会以空串占位）
    ///
    /// # 返回
    /// 返回归一化的 `{feedback, correctAnswer}` 结果
    pub async fn evaluate(
        &mut self,
        question: &str,
        user_answer: Option<&str>,
        context: Option<&str>,
    ) -> Result<Evaluation, GatewayError> {
        let key = cache_key(question, user_answer, context);
        if let Some(hit) = self.cache.get(&key) {
            debug!("答案缓存命中");
            return Ok(hit);
        }

        let contents = build_evaluation_contents(question, user_answer, context);
        let raw = self.call_with_retry(&contents).await?;
        let evaluation = parse_evaluation(&raw, self.strict_json)?;

        self.cache.put(key, evaluation.clone());
        Ok(evaluation)
    }

    /// 为给定上下文生成一批测验题
    ///
    /// 返回模型的原始文本，题目提取由会话层负责。
    /// 不走答案缓存（键形状是为评估调用设计的）。
    pub async fn generate_questions(&self, context: &str) -> Result<String, GatewayError> {
        let prompt = format!(
            "Based on the text below, write exactly {count} quiz questions that test \
             understanding of the material. Prefix each question with \"{marker}\" on its \
             own line. Do not include answers or any other text.\n\nText:\n\"\"\"{context}\"\"\"",
            count = QUIZ_QUESTION_COUNT,
            marker = QUESTION_MARKER,
            context = context,
        );
        let contents = vec![Content::user(vec![Part::text(prompt)])];
        self.call_with_retry(&contents).await
    }

    /// 带退避的有界重试
    ///
    /// 服务过载和传输失败会重试，基础延迟每次翻倍；
    /// 凭证错误立即浮出；重试耗尽后浮出最后一次的错误。
    async fn call_with_retry(&self, contents: &[Content]) -> Result<String, GatewayError> {
        let mut delay = self.retry_base_delay;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.client.generate(contents).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    warn!(
                        "模型调用失败 (尝试 {}/{}), {} 毫秒后重试: {}",
                        attempt,
                        self.max_attempts,
                        delay.as_millis(),
                        e
                    );
                    sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => {
                    if e.is_retryable() {
                        warn!("模型调用已重试 {} 次仍失败: {}", attempt, e);
                    }
                    return Err(e);
                }
            }
        }
    }

    /// 当前缓存条目数（测试用）
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

/// 组装评估调用的消息内容
///
/// 缺省的字段整个省略，不发送空串。
fn build_evaluation_contents(
    question: &str,
    user_answer: Option<&str>,
    context: Option<&str>,
) -> Vec<Content> {
    let mut parts = vec![Part::text(EVALUATION_INSTRUCTION)];

    if let Some(ctx) = context.filter(|c| !c.is_empty()) {
        parts.push(Part::text(format!("Context:\n{}", ctx)));
    }
    parts.push(Part::text(format!("Question:\n{}", question)));
    if let Some(answer) = user_answer.filter(|a| !a.is_empty()) {
        parts.push(Part::text(format!("Student answer:\n{}", answer)));
    }

    vec![Content::user(parts)]
}

/// 把模型原始输出解析成归一化结果
///
/// 先剥掉可能的 Markdown 代码栅栏再按 JSON 解析；
/// 解析失败时整段原文作为 feedback、correctAnswer 置空——
/// 远程模型不被信任一定守约，这个回退是有意的。
/// 严格模式下解析失败改为报 `MalformedResponse`。
pub fn parse_evaluation(raw: &str, strict: bool) -> Result<Evaluation, GatewayError> {
    let cleaned = strip_code_fences(raw);

    match serde_json::from_str::<Evaluation>(cleaned) {
        Ok(evaluation) => Ok(evaluation),
        Err(e) if strict => {
            warn!("模型输出不是约定的 JSON (严格模式): {}", e);
            Err(GatewayError::MalformedResponse {
                raw: raw.to_string(),
            })
        }
        Err(e) => {
            debug!("模型输出不是约定的 JSON, 回退为纯反馈文本: {}", e);
            Ok(Evaluation {
                feedback: raw.to_string(),
                correct_answer: String::new(),
            })
        }
    }
}

/// 剥掉 Markdown 代码栅栏
fn strip_code_fences(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_contents_omits_absent_fields() {
        let contents = build_evaluation_contents("What is X?", None, None);
        assert_eq!(contents.len(), 1);
        let parts = &contents[0].parts;
        // 只有系统指令和问题
        assert_eq!(parts.len(), 2);
        assert!(parts[1].text.contains("What is X?"));
        assert!(!parts.iter().any(|p| p.text.starts_with("Context:")));
        assert!(!parts.iter().any(|p| p.text.starts_with("Student answer:")));
    }

    #[test]
    fn test_build_contents_full() {
        let contents = build_evaluation_contents("Q?", Some("my answer"), Some("page text"));
        let parts = &contents[0].parts;
        assert_eq!(parts.len(), 4);
        assert!(parts[1].text.contains("page text"));
        assert!(parts[2].text.contains("Q?"));
        assert!(parts[3].text.contains("my answer"));
    }

    #[test]
    fn test_build_contents_empty_string_treated_as_absent() {
        let contents = build_evaluation_contents("Q?", Some(""), Some(""));
        assert_eq!(contents[0].parts.len(), 2);
    }

    #[test]
    fn test_parse_evaluation_well_formed() {
        let raw = r#"{"feedback": "Good.", "correctAnswer": "Paris"}"#;
        let eval = parse_evaluation(raw, false).unwrap();
        assert_eq!(eval.feedback, "Good.");
        assert_eq!(eval.correct_answer, "Paris");
    }

    #[test]
    fn test_parse_evaluation_strips_fences() {
        let raw = "```json\n{\"feedback\": \"ok\", \"correctAnswer\": \"\"}\n```";
        let eval = parse_evaluation(raw, false).unwrap();
        assert_eq!(eval.feedback, "ok");
    }

    #[test]
    fn test_parse_evaluation_missing_correct_answer_defaults_empty() {
        let eval = parse_evaluation(r#"{"feedback": "hm"}"#, false).unwrap();
        assert_eq!(eval.correct_answer, "");
    }

    #[test]
    fn test_parse_evaluation_fallback_on_plain_text() {
        let raw = "The capital of France is Paris.";
        let eval = parse_evaluation(raw, false).unwrap();
        assert_eq!(eval.feedback, raw);
        assert_eq!(eval.correct_answer, "");
    }

    #[test]
    fn test_parse_evaluation_strict_mode_errors() {
        let err = parse_evaluation("not json at all", true).unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse { .. }));
    }
}
