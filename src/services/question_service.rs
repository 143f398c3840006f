//! 问答记录服务 - 业务能力层
//!
//! 问答流程产生的记录：创建、按文档列出、删除。
//! 没有更新操作。

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, Result, StorageError};
use crate::models::QuestionRecord;
use crate::storage::JsonStore;

/// 问答记录服务
pub struct QuestionService {
    store: JsonStore<QuestionRecord>,
}

impl QuestionService {
    /// 创建新的问答记录服务
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            store: JsonStore::open(&config.data_dir, "questions")?,
        })
    }

    /// 记录一次问答
    pub async fn record(
        &self,
        owner: &str,
        document_id: &str,
        question_text: &str,
        answer_text: &str,
    ) -> Result<QuestionRecord> {
        let record = QuestionRecord {
            id: Uuid::new_v4().to_string(),
            question_text: question_text.to_string(),
            answer_text: answer_text.to_string(),
            owner: owner.to_string(),
            document_id: document_id.to_string(),
            created_at: Utc::now(),
        };
        let record = self.store.create(record).await?;
        debug!("问答记录已保存: {}", record.id);
        Ok(record)
    }

    /// 列出某文档下的问答记录（新的在前）
    pub async fn list_for_document(
        &self,
        owner: &str,
        document_id: &str,
    ) -> Result<Vec<QuestionRecord>> {
        let mut records = self
            .store
            .find_many(|q| q.owner == owner && q.document_id == document_id)
            .await?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// 删除一条问答记录
    pub async fn delete(&self, owner: &str, id: &str) -> Result<()> {
        match self.store.find_by_id(id).await? {
            Some(record) if record.owner == owner => {
                self.store.delete(id).await?;
                Ok(())
            }
            _ => Err(AppError::Storage(StorageError::NotFound {
                collection: "questions".to_string(),
                id: id.to_string(),
            })),
        }
    }
}
