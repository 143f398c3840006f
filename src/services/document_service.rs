//! 文档服务 - 业务能力层
//!
//! 上传边界：大小和类型校验 → 文本提取 → 落盘 → 记录入库。
//! 文档记录创建后不可修改，只能整条删除。

use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, Result, StorageError, ValidationError};
use crate::models::{Document, FileType, UploadReceipt};
use crate::services::page_text::PageSource;
use crate::storage::JsonStore;

/// 文档服务
pub struct DocumentService {
    store: JsonStore<Document>,
    upload_dir: PathBuf,
    max_upload_bytes: u64,
}

impl DocumentService {
    /// 创建新的文档服务
    pub fn new(config: &Config) -> Result<Self> {
        let upload_dir = PathBuf::from(&config.upload_dir);
        std::fs::create_dir_all(&upload_dir)
            .map_err(|e| AppError::storage_write_failed(upload_dir.display().to_string(), e))?;

        Ok(Self {
            store: JsonStore::open(&config.data_dir, "documents")?,
            upload_dir,
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    /// 上传并处理一个文件
    ///
    /// # 参数
    /// - `owner`: 上传用户
    /// - `title`: 文档标题
    /// - `source_path`: 待上传文件的路径
    ///
    /// # 返回
    /// 返回创建的文档记录和上传回执
    pub async fn upload(
        &self,
        owner: &str,
        title: &str,
        source_path: &Path,
    ) -> Result<(Document, UploadReceipt)> {
        if title.trim().is_empty() {
            return Err(AppError::Validation(ValidationError::EmptyInput {
                field: "title",
            }));
        }

        let filename = source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());

        let bytes = tokio::fs::read(source_path)
            .await
            .map_err(|e| AppError::storage_read_failed(source_path.display().to_string(), e))?;

        // 校验在任何提取之前完成
        if bytes.len() as u64 > self.max_upload_bytes {
            return Err(AppError::Validation(ValidationError::FileTooLarge {
                size: bytes.len() as u64,
                max: self.max_upload_bytes,
            }));
        }

        let file_type = match FileType::from_magic(&bytes) {
            Some(t) => t,
            None => {
                return Err(AppError::Validation(ValidationError::UnsupportedFileType {
                    detected: "未知".to_string(),
                }));
            }
        };

        // 只有 PDF 支持文本提取；图片类型能识别但不接受
        if file_type != FileType::Pdf {
            return Err(AppError::Validation(ValidationError::UnsupportedFileType {
                detected: file_type.name().to_string(),
            }));
        }

        let source = PageSource::from_bytes(&bytes)?;
        let extracted_text = source.full_text();
        if extracted_text.trim().is_empty() {
            return Err(AppError::Validation(ValidationError::NoTextExtracted {
                filename,
            }));
        }

        // 落盘时加唯一前缀，避免同名覆盖
        let id = Uuid::new_v4().to_string();
        let stored_path = self.upload_dir.join(format!("{}-{}", id, filename));
        tokio::fs::write(&stored_path, &bytes)
            .await
            .map_err(|e| AppError::storage_write_failed(stored_path.display().to_string(), e))?;

        let text_length = extracted_text.chars().count();
        let document = Document {
            id: id.clone(),
            title: title.trim().to_string(),
            file_path: stored_path.display().to_string(),
            extracted_text,
            page_count: source.page_count(),
            owner: owner.to_string(),
            created_at: Utc::now(),
        };
        let document = self.store.create(document).await?;

        info!(
            "✓ 文档上传成功: {} ({} 页, {} 字符)",
            document.title, document.page_count, text_length
        );

        let receipt = UploadReceipt {
            id,
            filename,
            file_type,
            text_length,
        };
        Ok((document, receipt))
    }

    /// 列出用户的所有文档（新的在前）
    pub async fn list(&self, owner: &str) -> Result<Vec<Document>> {
        let mut documents = self.store.find_many(|d| d.owner == owner).await?;
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(documents)
    }

    /// 取单个文档
    pub async fn get(&self, owner: &str, id: &str) -> Result<Document> {
        match self.store.find_by_id(id).await? {
            Some(document) if document.owner == owner => Ok(document),
            _ => Err(AppError::Storage(StorageError::NotFound {
                collection: "documents".to_string(),
                id: id.to_string(),
            })),
        }
    }

    /// 删除文档及其落盘文件
    pub async fn delete(&self, owner: &str, id: &str) -> Result<()> {
        let document = self.get(owner, id).await?;

        self.store.delete(id).await?;

        // 文件清理失败不阻塞删除
        if let Err(e) = tokio::fs::remove_file(&document.file_path).await {
            warn!("⚠️ 删除落盘文件失败 ({}): {}", document.file_path, e);
        }

        info!("✓ 文档已删除: {}", document.title);
        Ok(())
    }

    /// 为文档重新加载按页文本来源
    pub fn load_source(&self, document: &Document) -> Result<PageSource> {
        PageSource::load(&document.file_path)
    }
}
