//! 学习会话 - 流程层
//!
//! 每个会话一个状态对象，没有任何进程级全局状态。
//! 会话本身是纯状态机，不做 I/O：每个操作拆成
//! `begin_*`（本地前置检查 + 置忙 + 发凭据）和
//! `complete_*`（校验凭据 + 状态落账）两个迁移，
//! 模型调用发生在两者之间，由编排层驱动；渲染完全留给调用方。
//!
//! ## 并发约定
//!
//! - 单飞：全局互斥的忙标志，忙时 `begin_*` 静默忽略（不排队、不报错）
//! - 不取消：已发出的模型调用总会跑完；每张凭据携带发出时的页面纪元，
//!   翻页后到达的结果在 `complete_*` 里被丢弃，不会污染当前状态

use tracing::{debug, info};

use crate::error::{
    AppError, GatewayError, Result, SessionError, ValidationError,
};
use crate::models::{ChatMessage, Document, Evaluation};
use crate::services::page_text::PageSource;
use crate::services::similarity::{is_match, word_diff, WordDiff, ELABORATION_REQUEST};

/// 提问所需的最少页面文本字符数
pub const MIN_ASK_CONTEXT_CHARS: usize = 10;

/// 出题所需的最少页面文本字符数
pub const MIN_QUIZ_CONTEXT_CHARS: usize = 50;

/// 模型完全不可用时的兜底题目（可用性优先于扎根于文本）
pub const FALLBACK_QUESTIONS: [&str; 5] = [
    "What is the main idea of this page?",
    "List three key terms from this section and define them in your own words.",
    "Summarize this page in two sentences.",
    "What question would you expect an exam to ask about this material?",
    "How does this section relate to the material that came before it?",
];

/// 已打开的文档
struct OpenDocument {
    meta: Document,
    source: PageSource,
}

/// 提问凭据
#[derive(Debug)]
pub struct AskTicket {
    pub question: String,
    pub context: String,
    epoch: u64,
}

/// 作答评估凭据
#[derive(Debug)]
pub struct AnswerTicket {
    pub question: String,
    pub user_answer: String,
    pub context: Option<String>,
    epoch: u64,
}

/// 出题凭据
#[derive(Debug)]
pub struct QuizTicket {
    pub context: String,
    epoch: u64,
}

/// 作答的第一步迁移结果
#[derive(Debug)]
pub enum AnswerStep {
    /// 忙标志已置位，本次调用被静默忽略
    Ignored,
    /// 低质量答案，本地拒绝，不发模型
    Rejected { feedback: &'static str },
    /// 需要走模型评估
    Evaluate(AnswerTicket),
}

/// 提问结果
#[derive(Debug)]
pub enum AskOutcome {
    /// 已回答并写入转录
    Answered { question: String, answer: String },
    /// 页面已切换，过期结果被丢弃
    Stale,
    /// 调用失败，转录保持原样
    Failed(AppError),
}

/// 作答结果
#[derive(Debug)]
pub enum AnswerOutcome {
    /// 与参考答案足够相似
    Correct {
        feedback: String,
        correct_answer: String,
    },
    /// 还需改进；附词语差异帮助解释
    NeedsImprovement {
        feedback: String,
        correct_answer: String,
        diff: Option<WordDiff>,
    },
    /// 页面已切换，过期结果被丢弃
    Stale,
    /// 调用失败
    Failed(AppError),
}

/// 出题结果
#[derive(Debug)]
pub enum QuizOutcome {
    /// 从模型输出里提取的题目
    Generated(Vec<String>),
    /// 模型不可用，使用兜底题目
    Fallback(Vec<String>),
    /// 页面已切换，过期结果被丢弃
    Stale,
    /// 调用失败（含提取不到题目）
    Failed(AppError),
}

/// 学习会话状态机
pub struct StudySession {
    document: Option<OpenDocument>,
    /// 当前页码（1 开始；仅在有文档时有意义）
    current_page: usize,
    /// 页面纪元：打开文档或翻页时递增
    page_epoch: u64,
    /// 单飞忙标志
    busy: bool,
    /// 有序 append-only 对话转录
    transcript: Vec<ChatMessage>,
}

impl StudySession {
    /// 创建空会话
    pub fn new() -> Self {
        Self {
            document: None,
            current_page: 0,
            page_epoch: 0,
            busy: false,
            transcript: Vec::new(),
        }
    }

    // ========== 文档与导航 ==========

    /// 打开文档并定位到第一页
    ///
    /// 转录随新文档重新开始。
    pub fn open_document(&mut self, meta: Document, source: PageSource) {
        info!("📖 打开文档: {} ({} 页)", meta.title, source.page_count());
        self.document = Some(OpenDocument { meta, source });
        self.current_page = 1;
        self.page_epoch += 1;
        self.transcript.clear();
    }

    /// 跳转到指定页
    ///
    /// 导航不受忙标志限制：进行中的模型调用不会被打断，
    /// 它的结果会因纪元不匹配而被丢弃。
    pub fn goto_page(&mut self, page: usize) -> Result<()> {
        let doc = self
            .document
            .as_ref()
            .ok_or(AppError::Document(crate::error::DocumentError::NoDocument))?;

        let page_count = doc.source.page_count();
        if page == 0 || page > page_count {
            return Err(AppError::Document(
                crate::error::DocumentError::PageOutOfRange { page, page_count },
            ));
        }

        self.current_page = page;
        self.page_epoch += 1;
        debug!("翻到第 {}/{} 页", page, page_count);
        Ok(())
    }

    /// 当前页文本；没有文档时为空串
    pub fn current_page_text(&self) -> String {
        match &self.document {
            Some(doc) => doc.source.page_text(self.current_page).unwrap_or_default(),
            None => String::new(),
        }
    }

    /// 当前打开的文档
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref().map(|d| &d.meta)
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_count(&self) -> usize {
        self.document
            .as_ref()
            .map(|d| d.source.page_count())
            .unwrap_or(0)
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// 对话转录（有序，append-only）
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    // ========== 提问 ==========

    /// 发起提问
    ///
    /// # 返回
    /// - `Ok(Some(ticket))`: 前置检查通过，调用方拿凭据去做模型调用
    /// - `Ok(None)`: 忙标志已置位，本次调用被静默忽略
    /// - `Err`: 输入为空或页面文本不足（不发任何网络请求）
    pub fn begin_ask(&mut self, question: &str) -> Result<Option<AskTicket>> {
        if self.busy {
            debug!("已有进行中的模型调用，忽略本次提问");
            return Ok(None);
        }

        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Validation(ValidationError::EmptyInput {
                field: "question",
            }));
        }

        let context = self.current_page_text();
        if context.chars().count() < MIN_ASK_CONTEXT_CHARS {
            return Err(AppError::Session(SessionError::NoContent {
                required: MIN_ASK_CONTEXT_CHARS,
            }));
        }

        self.busy = true;
        Ok(Some(AskTicket {
            question: question.to_string(),
            context,
            epoch: self.page_epoch,
        }))
    }

    /// 提问完成
    ///
    /// 成功时先后追加用户消息和助手消息；
    /// 失败或过期时转录保持原样。
    pub fn complete_ask(
        &mut self,
        ticket: AskTicket,
        result: std::result::Result<Evaluation, GatewayError>,
    ) -> AskOutcome {
        self.busy = false;

        if ticket.epoch != self.page_epoch {
            debug!("提问结果过期（页面已切换），丢弃");
            return AskOutcome::Stale;
        }

        match result {
            Ok(evaluation) => {
                self.transcript.push(ChatMessage::user(&ticket.question));
                self.transcript
                    .push(ChatMessage::assistant(&evaluation.feedback));
                AskOutcome::Answered {
                    question: ticket.question,
                    answer: evaluation.feedback,
                }
            }
            Err(e) => AskOutcome::Failed(AppError::Gateway(e)),
        }
    }

    // ========== 作答评估 ==========

    /// 发起作答评估
    ///
    /// 低质量答案守卫在这里执行：不合格的答案本地拒绝，
    /// 返回固定文案，永远不会产生模型调用。
    pub fn begin_answer(&mut self, question: &str, user_answer: &str) -> Result<AnswerStep> {
        if self.busy {
            debug!("已有进行中的模型调用，忽略本次作答");
            return Ok(AnswerStep::Ignored);
        }

        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Validation(ValidationError::EmptyInput {
                field: "question",
            }));
        }

        if crate::services::similarity::is_low_effort_answer(user_answer) {
            debug!("低质量答案，本地拒绝");
            return Ok(AnswerStep::Rejected {
                feedback: ELABORATION_REQUEST,
            });
        }

        let context = Some(self.current_page_text()).filter(|c| !c.is_empty());

        self.busy = true;
        Ok(AnswerStep::Evaluate(AnswerTicket {
            question: question.to_string(),
            user_answer: user_answer.trim().to_string(),
            context,
            epoch: self.page_epoch,
        }))
    }

    /// 作答评估完成
    ///
    /// 按与参考答案的相似度把结果分成"答对"和"还需改进"。
    pub fn complete_answer(
        &mut self,
        ticket: AnswerTicket,
        result: std::result::Result<Evaluation, GatewayError>,
    ) -> AnswerOutcome {
        self.busy = false;

        if ticket.epoch != self.page_epoch {
            debug!("作答结果过期（页面已切换），丢弃");
            return AnswerOutcome::Stale;
        }

        let evaluation = match result {
            Ok(evaluation) => evaluation,
            Err(e) => return AnswerOutcome::Failed(AppError::Gateway(e)),
        };

        let reference = evaluation.correct_answer.trim();
        if !reference.is_empty() && is_match(&ticket.user_answer, reference) {
            AnswerOutcome::Correct {
                feedback: evaluation.feedback,
                correct_answer: evaluation.correct_answer,
            }
        } else {
            // 参考答案为空时（模型不守约的回退结果）没有可比对象，不给差异
            let diff = if reference.is_empty() {
                None
            } else {
                Some(word_diff(&ticket.user_answer, reference))
            };
            AnswerOutcome::NeedsImprovement {
                feedback: evaluation.feedback,
                correct_answer: evaluation.correct_answer,
                diff,
            }
        }
    }

    // ========== 出题 ==========

    /// 发起出题
    ///
    /// # 返回
    /// - `Ok(Some(ticket))`: 页面文本足够，调用方拿凭据去做模型调用
    /// - `Ok(None)`: 忙标志已置位，本次调用被静默忽略
    /// - `Err`: 页面文本不足（不发任何网络请求）
    pub fn begin_quiz(&mut self) -> Result<Option<QuizTicket>> {
        if self.busy {
            debug!("已有进行中的模型调用，忽略本次出题");
            return Ok(None);
        }

        let context = self.current_page_text();
        let actual = context.chars().count();
        if actual < MIN_QUIZ_CONTEXT_CHARS {
            return Err(AppError::Session(SessionError::InsufficientContent {
                actual,
                required: MIN_QUIZ_CONTEXT_CHARS,
            }));
        }

        self.busy = true;
        Ok(Some(QuizTicket {
            context,
            epoch: self.page_epoch,
        }))
    }

    /// 出题完成
    ///
    /// 服务过载或传输失败时退回固定的兜底题目（可用性优先）；
    /// 模型有输出但提取不到题目才算操作失败。
    pub fn complete_quiz(
        &mut self,
        ticket: QuizTicket,
        result: std::result::Result<String, GatewayError>,
    ) -> QuizOutcome {
        self.busy = false;

        if ticket.epoch != self.page_epoch {
            debug!("出题结果过期（页面已切换），丢弃");
            return QuizOutcome::Stale;
        }

        let raw = match result {
            Ok(raw) => raw,
            Err(e) if e.is_unavailable() => {
                info!("⚠️ 模型不可用，使用兜底题目: {}", e);
                return QuizOutcome::Fallback(
                    FALLBACK_QUESTIONS.iter().map(|q| q.to_string()).collect(),
                );
            }
            Err(e) => return QuizOutcome::Failed(AppError::Gateway(e)),
        };

        match extract_questions(&raw) {
            Ok(questions) if !questions.is_empty() => QuizOutcome::Generated(questions),
            Ok(_) => QuizOutcome::Failed(AppError::Session(SessionError::NoQuestionsExtracted)),
            Err(e) => QuizOutcome::Failed(e),
        }
    }
}

impl Default for StudySession {
    fn default() -> Self {
        Self::new()
    }
}

/// 从模型原始输出里提取题目
///
/// 先找标记前缀的行；一个都没有时退回"包含问号的行"，上限 5 道。
fn extract_questions(raw: &str) -> Result<Vec<String>> {
    let marker = crate::services::gateway::QUESTION_MARKER;
    let limit = crate::services::gateway::QUIZ_QUESTION_COUNT;

    // 容忍模型顺手加的列表符号或编号
    let pattern = format!(r"^\s*(?:[-*]\s*)?(?:\d+[.)]\s*)?{}\s*(.+)$", marker);
    let re = regex::Regex::new(&pattern).map_err(|e| AppError::Other(e.to_string()))?;

    let mut questions: Vec<String> = raw
        .lines()
        .filter_map(|line| {
            re.captures(line)
                .and_then(|cap| cap.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
        .collect();

    if questions.is_empty() {
        questions = raw
            .lines()
            .map(str::trim)
            .filter(|line| line.contains('?'))
            .map(|line| line.to_string())
            .collect();
    }

    questions.truncate(limit);
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn doc_meta() -> Document {
        Document {
            id: "d1".to_string(),
            title: "测试文档".to_string(),
            file_path: String::new(),
            extracted_text: String::new(),
            page_count: 2,
            owner: "u1".to_string(),
            created_at: Utc::now(),
        }
    }

    fn long_page() -> String {
        "Photosynthesis converts light energy into chemical energy inside chloroplasts."
            .to_string()
    }

    fn session_with_pages(pages: Vec<String>) -> StudySession {
        let mut session = StudySession::new();
        session.open_document(doc_meta(), PageSource::from_pages(pages));
        session
    }

    fn eval(feedback: &str, correct: &str) -> Evaluation {
        Evaluation {
            feedback: feedback.to_string(),
            correct_answer: correct.to_string(),
        }
    }

    // ---------- 提问 ----------

    #[test]
    fn test_ask_requires_document() {
        let mut session = StudySession::new();
        let err = session.begin_ask("What is this?").unwrap_err();
        assert!(matches!(
            err,
            AppError::Session(SessionError::NoContent { .. })
        ));
    }

    #[test]
    fn test_ask_requires_page_text() {
        let mut session = session_with_pages(vec!["short".to_string()]);
        let err = session.begin_ask("What is this?").unwrap_err();
        assert!(matches!(
            err,
            AppError::Session(SessionError::NoContent { .. })
        ));
    }

    #[test]
    fn test_ask_rejects_empty_question() {
        let mut session = session_with_pages(vec![long_page()]);
        let err = session.begin_ask("   ").unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::EmptyInput { field: "question" })
        ));
    }

    #[test]
    fn test_ask_appends_transcript_in_order() {
        let mut session = session_with_pages(vec![long_page()]);

        let ticket = session.begin_ask("What is photosynthesis?").unwrap().unwrap();
        assert!(session.is_busy());
        assert_eq!(ticket.context, long_page());

        let outcome = session.complete_ask(ticket, Ok(eval("It converts light.", "")));
        assert!(matches!(outcome, AskOutcome::Answered { .. }));
        assert!(!session.is_busy());

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, crate::models::ChatRole::User);
        assert_eq!(transcript[0].text, "What is photosynthesis?");
        assert_eq!(transcript[1].role, crate::models::ChatRole::Assistant);
        assert_eq!(transcript[1].text, "It converts light.");
    }

    #[test]
    fn test_ask_failure_leaves_transcript_intact() {
        let mut session = session_with_pages(vec![long_page()]);

        let ticket = session.begin_ask("Q?").unwrap().unwrap();
        let outcome = session.complete_ask(
            ticket,
            Err(GatewayError::Overloaded {
                endpoint: "e".to_string(),
                status: 503,
            }),
        );

        assert!(matches!(outcome, AskOutcome::Failed(_)));
        assert!(session.transcript().is_empty());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_single_flight_ignores_second_operation() {
        let mut session = session_with_pages(vec![long_page(), long_page()]);

        let ticket = session.begin_ask("first?").unwrap().unwrap();
        // 忙标志置位期间，三种操作都被静默忽略
        assert!(session.begin_ask("second?").unwrap().is_none());
        assert!(matches!(
            session.begin_answer("q", "long enough answer").unwrap(),
            AnswerStep::Ignored
        ));
        assert!(session.begin_quiz().unwrap().is_none());

        session.complete_ask(ticket, Ok(eval("a", "")));
        // 完成后恢复可用
        assert!(session.begin_ask("third?").unwrap().is_some());
    }

    #[test]
    fn test_stale_ask_result_is_discarded() {
        let mut session = session_with_pages(vec![long_page(), long_page()]);

        let ticket = session.begin_ask("Q?").unwrap().unwrap();
        // 调用在途中翻页（导航不被忙标志阻止）
        session.goto_page(2).unwrap();

        let outcome = session.complete_ask(ticket, Ok(eval("late answer", "")));
        assert!(matches!(outcome, AskOutcome::Stale));
        assert!(session.transcript().is_empty());
        assert!(!session.is_busy());
    }

    // ---------- 作答 ----------

    #[test]
    fn test_short_answer_guard_never_reaches_gateway() {
        let mut session = session_with_pages(vec![long_page()]);

        match session.begin_answer("What is X?", "idk").unwrap() {
            AnswerStep::Rejected { feedback } => assert_eq!(feedback, ELABORATION_REQUEST),
            other => panic!("应该被本地拒绝: {:?}", other),
        }
        // 守卫不占用忙标志
        assert!(!session.is_busy());

        match session.begin_answer("What is X?", "I DON'T KNOW").unwrap() {
            AnswerStep::Rejected { .. } => {}
            other => panic!("应该被本地拒绝: {:?}", other),
        }
    }

    #[test]
    fn test_answer_classified_correct() {
        let mut session = session_with_pages(vec![long_page()]);

        let ticket = match session.begin_answer("Capital of France?", "paris ").unwrap() {
            AnswerStep::Evaluate(ticket) => ticket,
            other => panic!("应该进入评估: {:?}", other),
        };

        let outcome = session.complete_answer(ticket, Ok(eval("Yes!", "Paris")));
        assert!(matches!(outcome, AnswerOutcome::Correct { .. }));
    }

    #[test]
    fn test_answer_classified_needs_improvement_with_diff() {
        let mut session = session_with_pages(vec![long_page()]);

        let ticket = match session.begin_answer("Q?", "the cat sat").unwrap() {
            AnswerStep::Evaluate(ticket) => ticket,
            other => panic!("应该进入评估: {:?}", other),
        };

        let outcome = session.complete_answer(ticket, Ok(eval("Not quite.", "the cat ran")));
        match outcome {
            AnswerOutcome::NeedsImprovement { diff: Some(diff), .. } => {
                assert!(diff.missing.contains("ran"));
                assert!(diff.incorrect.contains("sat"));
            }
            other => panic!("意外的结果: {:?}", other),
        }
    }

    #[test]
    fn test_answer_fallback_evaluation_has_no_diff() {
        let mut session = session_with_pages(vec![long_page()]);

        let ticket = match session.begin_answer("Q?", "some real answer").unwrap() {
            AnswerStep::Evaluate(ticket) => ticket,
            other => panic!("应该进入评估: {:?}", other),
        };

        // 模型不守约时的回退结果：correctAnswer 为空
        let outcome = session.complete_answer(ticket, Ok(eval("free-form feedback", "")));
        match outcome {
            AnswerOutcome::NeedsImprovement { diff: None, .. } => {}
            other => panic!("意外的结果: {:?}", other),
        }
    }

    // ---------- 出题 ----------

    #[test]
    fn test_quiz_requires_enough_context() {
        let mut session = session_with_pages(vec!["way too short".to_string()]);

        let err = session.begin_quiz().unwrap_err();
        match err {
            AppError::Session(SessionError::InsufficientContent { actual, required }) => {
                assert_eq!(required, MIN_QUIZ_CONTEXT_CHARS);
                assert!(actual < required);
            }
            other => panic!("意外的错误: {:?}", other),
        }
    }

    #[test]
    fn test_quiz_extracts_marker_lines() {
        let mut session = session_with_pages(vec![long_page()]);
        let ticket = session.begin_quiz().unwrap().unwrap();

        let raw = "QUESTION: What is photosynthesis?\n\
                   Some filler the model added.\n\
                   2. QUESTION: Where does it happen?\n\
                   - QUESTION: Why does it matter?";
        let outcome = session.complete_quiz(ticket, Ok(raw.to_string()));

        match outcome {
            QuizOutcome::Generated(questions) => {
                assert_eq!(
                    questions,
                    vec![
                        "What is photosynthesis?",
                        "Where does it happen?",
                        "Why does it matter?"
                    ]
                );
            }
            other => panic!("意外的结果: {:?}", other),
        }
    }

    #[test]
    fn test_quiz_falls_back_to_question_mark_lines() {
        let mut session = session_with_pages(vec![long_page()]);
        let ticket = session.begin_quiz().unwrap().unwrap();

        let raw = "Here are some questions.\n\
                   What is light?\n\
                   Not a question line.\n\
                   Where is the chloroplast?\n\
                   One? Two? Three? Four? Five? Six?\n\
                   Is this enough?\n\
                   And another one?\n\
                   Overflow question number seven?";
        let outcome = session.complete_quiz(ticket, Ok(raw.to_string()));

        match outcome {
            QuizOutcome::Generated(questions) => {
                // 问号行兜底提取，上限 5 道
                assert_eq!(questions.len(), 5);
                assert_eq!(questions[0], "What is light?");
            }
            other => panic!("意外的结果: {:?}", other),
        }
    }

    #[test]
    fn test_quiz_no_questions_extracted_is_failure() {
        let mut session = session_with_pages(vec![long_page()]);
        let ticket = session.begin_quiz().unwrap().unwrap();

        let outcome = session.complete_quiz(ticket, Ok("nothing useful here.".to_string()));
        match outcome {
            QuizOutcome::Failed(AppError::Session(SessionError::NoQuestionsExtracted)) => {}
            other => panic!("意外的结果: {:?}", other),
        }
    }

    #[test]
    fn test_quiz_substitutes_fallback_when_unavailable() {
        let mut session = session_with_pages(vec![long_page()]);

        for error in [
            GatewayError::Overloaded {
                endpoint: "e".to_string(),
                status: 503,
            },
            GatewayError::Transport {
                endpoint: "e".to_string(),
                detail: "connection refused".to_string(),
            },
        ] {
            let ticket = session.begin_quiz().unwrap().unwrap();
            match session.complete_quiz(ticket, Err(error)) {
                QuizOutcome::Fallback(questions) => {
                    assert_eq!(questions.len(), 5);
                    assert_eq!(questions[0], FALLBACK_QUESTIONS[0]);
                }
                other => panic!("意外的结果: {:?}", other),
            }
        }
    }

    #[test]
    fn test_quiz_auth_failure_is_surfaced_not_substituted() {
        let mut session = session_with_pages(vec![long_page()]);
        let ticket = session.begin_quiz().unwrap().unwrap();

        let outcome = session.complete_quiz(
            ticket,
            Err(GatewayError::Auth {
                message: "bad key".to_string(),
            }),
        );
        assert!(matches!(outcome, QuizOutcome::Failed(_)));
    }

    // ---------- 导航 ----------

    #[test]
    fn test_goto_page_bounds() {
        let mut session = session_with_pages(vec![long_page(), long_page()]);

        assert!(session.goto_page(2).is_ok());
        assert_eq!(session.current_page(), 2);

        for page in [0, 3] {
            let err = session.goto_page(page).unwrap_err();
            assert!(matches!(
                err,
                AppError::Document(crate::error::DocumentError::PageOutOfRange { .. })
            ));
        }
        // 失败的导航不改变当前页
        assert_eq!(session.current_page(), 2);
    }

    #[test]
    fn test_open_document_resets_transcript() {
        let mut session = session_with_pages(vec![long_page()]);

        let ticket = session.begin_ask("Q?").unwrap().unwrap();
        session.complete_ask(ticket, Ok(eval("a", "")));
        assert_eq!(session.transcript().len(), 2);

        session.open_document(doc_meta(), PageSource::from_pages(vec![long_page()]));
        assert!(session.transcript().is_empty());
        assert_eq!(session.current_page(), 1);
    }
}
