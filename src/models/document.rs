use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::Record;

/// 文档记录
///
/// 上传时创建，删除前不可修改（没有更新操作）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    /// 存储目录里的文件路径
    pub file_path: String,
    /// 全文提取文本（逐页拼接）
    pub extracted_text: String,
    pub page_count: usize,
    /// 所属用户
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

impl Record for Document {
    fn id(&self) -> &str {
        &self.id
    }
}

/// 上传回执
///
/// 上传边界对外返回的信息：标识、文件名、识别出的类型、提取字符数。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub id: String,
    pub filename: String,
    pub file_type: FileType,
    pub text_length: usize,
}

/// 上传文件类型
///
/// 通过魔数识别；当前只有 PDF 支持文本提取。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    Pdf,
    Png,
    Jpeg,
    Bmp,
    Tiff,
}

impl FileType {
    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            FileType::Pdf => "PDF",
            FileType::Png => "PNG",
            FileType::Jpeg => "JPEG",
            FileType::Bmp => "BMP",
            FileType::Tiff => "TIFF",
        }
    }

    /// 通过文件头魔数识别类型
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF-") {
            return Some(FileType::Pdf);
        }
        if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(FileType::Png);
        }
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(FileType::Jpeg);
        }
        if bytes.starts_with(b"BM") {
            return Some(FileType::Bmp);
        }
        // TIFF: little-endian "II*\0" 或 big-endian "MM\0*"
        if bytes.starts_with(&[0x49, 0x49, 0x2A, 0x00])
            || bytes.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return Some(FileType::Tiff);
        }
        None
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
