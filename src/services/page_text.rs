//! 页面文本来源 - 业务能力层
//!
//! 为已加载的文档提供按页的纯文本。
//! 页码从 1 开始，取值幂等，不会修改文档状态。

use std::path::Path;

use crate::error::{AppError, DocumentError, Result};

/// 按页提供文本的文档来源
///
/// 加载时一次性提取所有页面，之后每次取页都从同一份提取结果派生。
pub struct PageSource {
    pages: Vec<String>,
}

impl PageSource {
    /// 从 PDF 文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pages = pdf_extract::extract_text_by_pages(path)
            .map_err(|e| AppError::extract_failed(path.display().to_string(), e))?;
        Ok(Self { pages })
    }

    /// 从内存中的 PDF 字节加载
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| AppError::extract_failed("<内存>", e))?;
        Ok(Self { pages })
    }

    /// 直接用现成的页面文本构造（测试和非 PDF 来源用）
    pub fn from_pages(pages: Vec<String>) -> Self {
        Self { pages }
    }

    /// 页数
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// 取某一页的文本
    ///
    /// # 参数
    /// - `page`: 页码，取值范围 [1, page_count]
    ///
    /// # 返回
    /// 返回该页的纯文本；页码越界时返回 `PageOutOfRange`
    pub fn page_text(&self, page: usize) -> Result<String> {
        if page == 0 || page > self.pages.len() {
            return Err(AppError::Document(DocumentError::PageOutOfRange {
                page,
                page_count: self.pages.len(),
            }));
        }
        Ok(self.pages[page - 1].clone())
    }

    /// 全文（逐页拼接）
    pub fn full_text(&self) -> String {
        self.pages.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> PageSource {
        PageSource::from_pages(vec![
            "page one text".to_string(),
            "page two text".to_string(),
        ])
    }

    #[test]
    fn test_page_text_in_range() {
        let src = source();
        assert_eq!(src.page_text(1).unwrap(), "page one text");
        assert_eq!(src.page_text(2).unwrap(), "page two text");
    }

    #[test]
    fn test_page_text_idempotent() {
        let src = source();
        assert_eq!(src.page_text(1).unwrap(), src.page_text(1).unwrap());
        assert_eq!(src.page_count(), 2);
    }

    #[test]
    fn test_page_text_out_of_range() {
        let src = source();
        for page in [0, 3, 100] {
            match src.page_text(page) {
                Err(AppError::Document(DocumentError::PageOutOfRange { .. })) => {}
                other => panic!("页码 {} 应该越界, 实际: {:?}", page, other.map(|_| ())),
            }
        }
    }

    #[test]
    fn test_full_text_joins_pages() {
        assert_eq!(source().full_text(), "page one text\npage two text");
    }
}
