//! 交互式学习应用 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：校验配置、打开存储、创建网关和会话
//! 2. **交互循环**：逐行读取命令并分发
//! 3. **调用驱动**：在 begin_* 和 complete_* 之间执行模型调用
//! 4. **结果渲染**：把会话结果打印给用户（状态机自身不打印）
//! 5. **记录落账**：问答成功后写入问答记录

use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::AppError;
use crate::services::{DocumentService, ModelGateway, QuestionService};
use crate::utils::logging::truncate_text;
use crate::workflow::{AnswerOutcome, AnswerStep, AskOutcome, QuizOutcome, StudySession};

/// 本地单用户模式下的固定用户名
const LOCAL_OWNER: &str = "local";

/// 应用主结构
pub struct App {
    documents: DocumentService,
    questions: QuestionService,
    gateway: ModelGateway,
    session: StudySession,
    /// 最近一次出题的结果（编号供 answer 命令引用）
    pending_quiz: Vec<String>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> anyhow::Result<Self> {
        config.validate()?;

        Ok(Self {
            documents: DocumentService::new(&config)?,
            questions: QuestionService::new(&config)?,
            gateway: ModelGateway::new(&config)?,
            session: StudySession::new(),
            pending_quiz: Vec::new(),
        })
    }

    /// 运行交互循环
    pub async fn run(&mut self) -> anyhow::Result<()> {
        info!("🚀 StudyPal 已启动");
        println!("StudyPal — 输入 help 查看命令");

        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if !self.dispatch(line).await {
                break;
            }
        }

        info!("👋 StudyPal 退出");
        Ok(())
    }

    /// 分发一条命令
    ///
    /// # 返回
    /// 返回 false 表示退出交互循环
    async fn dispatch(&mut self, line: &str) -> bool {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match command {
            "help" => self.cmd_help(),
            "upload" => self.cmd_upload(rest).await,
            "docs" => self.cmd_docs().await,
            "open" => self.cmd_open(rest).await,
            "delete" => self.cmd_delete(rest).await,
            "page" => self.cmd_page(rest),
            "next" => self.cmd_page_delta(1),
            "prev" => self.cmd_page_delta(-1),
            "text" => self.cmd_text(),
            "ask" => self.cmd_ask(rest).await,
            "quiz" => self.cmd_quiz().await,
            "answer" => self.cmd_answer(rest).await,
            "history" => self.cmd_history().await,
            "quit" | "exit" => return false,
            _ => println!("未知命令: {} (help 查看命令)", command),
        }

        true
    }

    fn cmd_help(&self) {
        println!("命令:");
        println!("  upload <文件路径> [标题]   上传并处理 PDF");
        println!("  docs                       列出文档");
        println!("  open <文档ID>              打开文档开始学习");
        println!("  delete <文档ID>            删除文档");
        println!("  page <n> / next / prev     翻页");
        println!("  text                       查看当前页文本");
        println!("  ask <问题>                 就当前页提问");
        println!("  quiz                       为当前页生成测验题");
        println!("  answer <题号> <答案>       作答测验题并评分");
        println!("  history                    查看当前文档的问答记录");
        println!("  quit                       退出");
    }

    // ========== 文档管理 ==========

    async fn cmd_upload(&mut self, rest: &str) {
        let (path, title) = match rest.split_once(char::is_whitespace) {
            Some((p, t)) => (p, t.trim().to_string()),
            None if !rest.is_empty() => {
                // 未提供标题时用文件名（去掉扩展名）
                let stem = Path::new(rest)
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| rest.to_string());
                (rest, stem)
            }
            None => {
                println!("用法: upload <文件路径> [标题]");
                return;
            }
        };

        match self
            .documents
            .upload(LOCAL_OWNER, &title, Path::new(path))
            .await
        {
            Ok((document, receipt)) => {
                println!(
                    "✓ 上传成功: {} [{}] ({} 页, {} 字符) id={}",
                    receipt.filename,
                    receipt.file_type,
                    document.page_count,
                    receipt.text_length,
                    receipt.id
                );
            }
            Err(e) => render_error(&e),
        }
    }

    async fn cmd_docs(&mut self) {
        match self.documents.list(LOCAL_OWNER).await {
            Ok(documents) if documents.is_empty() => {
                println!("还没有文档，用 upload 上传一个 PDF");
            }
            Ok(documents) => {
                for doc in documents {
                    println!(
                        "  {}  {} ({} 页, {})",
                        doc.id,
                        doc.title,
                        doc.page_count,
                        doc.created_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
            Err(e) => render_error(&e),
        }
    }

    async fn cmd_open(&mut self, id: &str) {
        if id.is_empty() {
            println!("用法: open <文档ID>");
            return;
        }

        let document = match self.documents.get(LOCAL_OWNER, id).await {
            Ok(document) => document,
            Err(e) => return render_error(&e),
        };

        match self.documents.load_source(&document) {
            Ok(source) => {
                println!(
                    "✓ 已打开: {} (第 1/{} 页)",
                    document.title,
                    source.page_count()
                );
                self.session.open_document(document, source);
                self.pending_quiz.clear();
            }
            Err(e) => render_error(&e),
        }
    }

    async fn cmd_delete(&mut self, id: &str) {
        if id.is_empty() {
            println!("用法: delete <文档ID>");
            return;
        }
        match self.documents.delete(LOCAL_OWNER, id).await {
            Ok(()) => println!("✓ 已删除"),
            Err(e) => render_error(&e),
        }
    }

    // ========== 导航 ==========

    fn cmd_page(&mut self, rest: &str) {
        let page: usize = match rest.parse() {
            Ok(page) => page,
            Err(_) => {
                println!("用法: page <页码>");
                return;
            }
        };
        match self.session.goto_page(page) {
            Ok(()) => self.print_position(),
            Err(e) => render_error(&e),
        }
    }

    fn cmd_page_delta(&mut self, delta: isize) {
        let current = self.session.current_page() as isize;
        let target = current + delta;
        if target < 1 {
            println!("已经是第一页");
            return;
        }
        match self.session.goto_page(target as usize) {
            Ok(()) => self.print_position(),
            Err(e) => render_error(&e),
        }
    }

    fn cmd_text(&self) {
        let text = self.session.current_page_text();
        if text.is_empty() {
            println!("当前没有页面文本 (先 open 一个文档)");
        } else {
            println!("{}", truncate_text(&text, 2000));
        }
    }

    fn print_position(&self) {
        println!(
            "第 {}/{} 页",
            self.session.current_page(),
            self.session.page_count()
        );
    }

    // ========== 提问 ==========

    async fn cmd_ask(&mut self, question: &str) {
        let ticket = match self.session.begin_ask(question) {
            Ok(Some(ticket)) => ticket,
            Ok(None) => {
                debug!("模型调用进行中，本次提问被忽略");
                return;
            }
            Err(e) => return render_error(&e),
        };

        println!("🤖 思考中...");
        let result = self
            .gateway
            .evaluate(&ticket.question, None, Some(&ticket.context))
            .await;

        match self.session.complete_ask(ticket, result) {
            AskOutcome::Answered { question, answer } => {
                println!("{}", answer);
                self.persist_question(&question, &answer).await;
            }
            AskOutcome::Stale => println!("(页面已切换，回答已丢弃)"),
            AskOutcome::Failed(e) => render_error(&e),
        }
    }

    /// 问答成功后落一条记录
    async fn persist_question(&mut self, question: &str, answer: &str) {
        let document_id = match self.session.document() {
            Some(doc) => doc.id.clone(),
            None => return,
        };
        if let Err(e) = self
            .questions
            .record(LOCAL_OWNER, &document_id, question, answer)
            .await
        {
            render_error(&e);
        }
    }

    // ========== 测验 ==========

    async fn cmd_quiz(&mut self) {
        let ticket = match self.session.begin_quiz() {
            Ok(Some(ticket)) => ticket,
            Ok(None) => {
                debug!("模型调用进行中，本次出题被忽略");
                return;
            }
            Err(e) => return render_error(&e),
        };

        println!("🤖 出题中...");
        let result = self.gateway.generate_questions(&ticket.context).await;

        match self.session.complete_quiz(ticket, result) {
            QuizOutcome::Generated(questions) => {
                self.render_quiz(&questions);
                self.pending_quiz = questions;
            }
            QuizOutcome::Fallback(questions) => {
                println!("⚠️ 模型暂时不可用，以下是通用练习题:");
                self.render_quiz(&questions);
                self.pending_quiz = questions;
            }
            QuizOutcome::Stale => println!("(页面已切换，题目已丢弃)"),
            QuizOutcome::Failed(e) => render_error(&e),
        }
    }

    fn render_quiz(&self, questions: &[String]) {
        for (i, question) in questions.iter().enumerate() {
            println!("  {}. {}", i + 1, question);
        }
        println!("用 answer <题号> <你的答案> 作答");
    }

    async fn cmd_answer(&mut self, rest: &str) {
        let (index, user_answer) = match rest.split_once(char::is_whitespace) {
            Some((n, a)) => (n, a.trim()),
            None => {
                println!("用法: answer <题号> <你的答案>");
                return;
            }
        };

        let index: usize = match index.parse() {
            Ok(n) if n >= 1 && n <= self.pending_quiz.len() => n,
            _ => {
                println!("题号无效 (先用 quiz 出题)");
                return;
            }
        };
        let question = self.pending_quiz[index - 1].clone();

        let ticket = match self.session.begin_answer(&question, user_answer) {
            Ok(AnswerStep::Evaluate(ticket)) => ticket,
            Ok(AnswerStep::Rejected { feedback }) => {
                println!("{}", feedback);
                return;
            }
            Ok(AnswerStep::Ignored) => {
                debug!("模型调用进行中，本次作答被忽略");
                return;
            }
            Err(e) => return render_error(&e),
        };

        println!("🤖 评分中...");
        let result = self
            .gateway
            .evaluate(
                &ticket.question,
                Some(&ticket.user_answer),
                ticket.context.as_deref(),
            )
            .await;

        match self.session.complete_answer(ticket, result) {
            AnswerOutcome::Correct {
                feedback,
                correct_answer,
            } => {
                println!("✅ 答对了!");
                println!("{}", feedback);
                if !correct_answer.is_empty() {
                    println!("参考答案: {}", correct_answer);
                }
            }
            AnswerOutcome::NeedsImprovement {
                feedback,
                correct_answer,
                diff,
            } => {
                println!("📝 还需改进");
                println!("{}", feedback);
                if !correct_answer.is_empty() {
                    println!("参考答案: {}", correct_answer);
                }
                if let Some(diff) = diff {
                    if !diff.missing.is_empty() {
                        println!(
                            "缺少的关键词: {}",
                            diff.missing.iter().cloned().collect::<Vec<_>>().join(", ")
                        );
                    }
                    if !diff.incorrect.is_empty() {
                        println!(
                            "多余/不准确的词: {}",
                            diff.incorrect.iter().cloned().collect::<Vec<_>>().join(", ")
                        );
                    }
                }
            }
            AnswerOutcome::Stale => println!("(页面已切换，评分已丢弃)"),
            AnswerOutcome::Failed(e) => render_error(&e),
        }
    }

    // ========== 记录 ==========

    async fn cmd_history(&mut self) {
        let document_id = match self.session.document() {
            Some(doc) => doc.id.clone(),
            None => {
                println!("先 open 一个文档");
                return;
            }
        };

        match self
            .questions
            .list_for_document(LOCAL_OWNER, &document_id)
            .await
        {
            Ok(records) if records.is_empty() => println!("这个文档还没有问答记录"),
            Ok(records) => {
                for record in records {
                    println!(
                        "[{}] Q: {}",
                        record.created_at.format("%Y-%m-%d %H:%M"),
                        record.question_text
                    );
                    println!("    A: {}", truncate_text(&record.answer_text, 200));
                }
            }
            Err(e) => render_error(&e),
        }
    }
}

/// 把错误渲染成一条可忽略的消息
///
/// 失败不改变任何已有状态，交互循环继续。
fn render_error(error: &AppError) {
    println!("✗ {}", error);
}
