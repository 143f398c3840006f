use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::Record;

/// 问答记录
///
/// 问答流程创建；可单独删除，没有更新操作。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: String,
    pub question_text: String,
    pub answer_text: String,
    /// 所属用户
    pub owner: String,
    /// 所属文档
    pub document_id: String,
    pub created_at: DateTime<Utc>,
}

impl Record for QuestionRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

/// 模型评估结果
///
/// 远程模型被要求返回的固定两字段 JSON 对象。
/// 模型不守约时由网关回退为 `{feedback: 原文, correct_answer: ""}`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub feedback: String,
    #[serde(rename = "correctAnswer", default)]
    pub correct_answer: String,
}

/// 对话角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

/// 会话转录里的一条消息
///
/// 转录是有序的 append-only 日志，失败的操作不会写入。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}
