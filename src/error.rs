use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 模型网关错误
    Gateway(GatewayError),
    /// 文档/页面错误
    Document(DocumentError),
    /// 会话前置条件错误
    Session(SessionError),
    /// 存储层错误
    Storage(StorageError),
    /// 输入校验错误（任何 I/O 之前被拒绝）
    Validation(ValidationError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Gateway(e) => write!(f, "模型网关错误: {}", e),
            AppError::Document(e) => write!(f, "文档错误: {}", e),
            AppError::Session(e) => write!(f, "会话错误: {}", e),
            AppError::Storage(e) => write!(f, "存储错误: {}", e),
            AppError::Validation(e) => write!(f, "校验错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Gateway(e) => Some(e),
            AppError::Document(e) => Some(e),
            AppError::Session(e) => Some(e),
            AppError::Storage(e) => Some(e),
            AppError::Validation(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 模型网关错误
///
/// 对应远程生成式模型调用的失败分类：
/// 传输失败和服务过载会被重试，凭证失败立即浮出，
/// 格式不符只有在严格模式下才是错误。
#[derive(Debug)]
pub enum GatewayError {
    /// 网络/超时/非 2xx 响应（重试后浮出）
    Transport {
        endpoint: String,
        detail: String,
    },
    /// 服务过载（429/503，重试耗尽后浮出）
    Overloaded {
        endpoint: String,
        status: u16,
    },
    /// 凭证无效（401/403，从不重试）
    Auth {
        message: String,
    },
    /// 模型输出不是约定的 JSON（仅严格模式）
    MalformedResponse {
        raw: String,
    },
    /// 响应信封里没有候选内容
    EmptyResponse {
        endpoint: String,
    },
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Transport { endpoint, detail } => {
                write!(f, "请求失败 ({}): {}", endpoint, detail)
            }
            GatewayError::Overloaded { endpoint, status } => {
                write!(f, "模型服务过载 ({}, HTTP {})", endpoint, status)
            }
            GatewayError::Auth { message } => {
                write!(f, "凭证无效: {}", message)
            }
            GatewayError::MalformedResponse { raw } => {
                write!(f, "模型输出不是约定的 JSON: {}", raw)
            }
            GatewayError::EmptyResponse { endpoint } => {
                write!(f, "模型返回空结果: {}", endpoint)
            }
        }
    }
}

impl std::error::Error for GatewayError {}

impl GatewayError {
    /// 该错误是否允许重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::Transport { .. } | GatewayError::Overloaded { .. }
        )
    }

    /// 该错误是否属于"服务不可用"（出题流程据此切换到兜底题目）
    pub fn is_unavailable(&self) -> bool {
        self.is_retryable()
    }
}

/// 文档/页面错误
#[derive(Debug)]
pub enum DocumentError {
    /// 页码超出 [1, page_count]
    PageOutOfRange {
        page: usize,
        page_count: usize,
    },
    /// PDF 文本提取失败
    ExtractFailed {
        path: String,
        detail: String,
    },
    /// 当前没有加载任何文档
    NoDocument,
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::PageOutOfRange { page, page_count } => {
                write!(f, "页码 {} 超出范围 [1, {}]", page, page_count)
            }
            DocumentError::ExtractFailed { path, detail } => {
                write!(f, "PDF 文本提取失败 ({}): {}", path, detail)
            }
            DocumentError::NoDocument => write!(f, "当前没有加载任何文档"),
        }
    }
}

impl std::error::Error for DocumentError {}

/// 会话前置条件错误
///
/// 全部是本地检查，触发时不会发出任何网络请求。
#[derive(Debug)]
pub enum SessionError {
    /// 提问需要已加载的文档和足够的页面文本
    NoContent {
        required: usize,
    },
    /// 出题需要更长的页面文本
    InsufficientContent {
        actual: usize,
        required: usize,
    },
    /// 模型输出里提取不到任何题目
    NoQuestionsExtracted,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NoContent { required } => {
                write!(f, "当前页面没有可用文本 (至少需要 {} 个字符)", required)
            }
            SessionError::InsufficientContent { actual, required } => {
                write!(
                    f,
                    "页面文本不足以出题: {} 个字符 (至少需要 {})",
                    actual, required
                )
            }
            SessionError::NoQuestionsExtracted => {
                write!(f, "模型输出里提取不到任何题目")
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// 存储层错误
#[derive(Debug)]
pub enum StorageError {
    /// 读取集合文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入集合文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 集合文件不是合法 JSON
    ParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 记录不存在
    NotFound {
        collection: String,
        id: String,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ReadFailed { path, source } => {
                write!(f, "读取失败 ({}): {}", path, source)
            }
            StorageError::WriteFailed { path, source } => {
                write!(f, "写入失败 ({}): {}", path, source)
            }
            StorageError::ParseFailed { path, source } => {
                write!(f, "JSON 解析失败 ({}): {}", path, source)
            }
            StorageError::NotFound { collection, id } => {
                write!(f, "记录不存在: {} / {}", collection, id)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::ReadFailed { source, .. }
            | StorageError::WriteFailed { source, .. }
            | StorageError::ParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 输入校验错误
#[derive(Debug)]
pub enum ValidationError {
    /// 文件类型不支持
    UnsupportedFileType {
        detected: String,
    },
    /// 文件超过大小上限
    FileTooLarge {
        size: u64,
        max: u64,
    },
    /// 文件里提取不到任何文本
    NoTextExtracted {
        filename: String,
    },
    /// 必填输入为空
    EmptyInput {
        field: &'static str,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::UnsupportedFileType { detected } => {
                write!(f, "不支持的文件类型: {}", detected)
            }
            ValidationError::FileTooLarge { size, max } => {
                write!(f, "文件过大: {} 字节 (上限 {} 字节)", size, max)
            }
            ValidationError::NoTextExtracted { filename } => {
                write!(f, "文件里提取不到任何文本: {}", filename)
            }
            ValidationError::EmptyInput { field } => {
                write!(f, "输入不能为空: {}", field)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置值非法
    InvalidValue {
        key: String,
        value: String,
    },
    /// 配置文件解析失败
    FileParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value } => {
                write!(f, "配置项 {} 的值非法: '{}'", key, value)
            }
            ConfigError::FileParseFailed { path, source } => {
                write!(f, "配置文件解析失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::FileParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

// ========== 从子错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::Gateway(err)
    }
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        AppError::Document(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建存储读取错误
    pub fn storage_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Storage(StorageError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建存储写入错误
    pub fn storage_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Storage(StorageError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建 PDF 提取错误
    pub fn extract_failed(path: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        AppError::Document(DocumentError::ExtractFailed {
            path: path.into(),
            detail: detail.to_string(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type Result<T> = std::result::Result<T, AppError>;
