//! # StudyPal
//!
//! 一个"学习助手"核心库：上传 PDF，按页提取文本，
//! 由远程生成式模型回答问题、给自由作答评分、生成测验题。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `storage/` - JSON 文件集合存储（每个集合一个文件）
//! - `clients/` - 模型 API 的单次调用封装
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程
//! - `ModelGateway` - 模型调用能力（缓存 + 重试 + 解析回退）
//! - `similarity` - 答案相似度与低质量答案守卫
//! - `PageSource` - 按页文本来源
//! - `DocumentService` / `QuestionService` - 文档与问答记录
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 每个会话一个纯状态机
//! - `StudySession` - begin_* / complete_* 状态迁移（单飞 + 页面纪元）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/` - 资源所有者，驱动交互循环并渲染结果

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod storage;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, GatewayError, Result};
pub use models::{Document, Evaluation, QuestionRecord};
pub use orchestrator::App;
pub use services::{AnswerCache, DocumentService, ModelGateway, PageSource, QuestionService};
pub use workflow::StudySession;
