use crate::error::{AppError, ConfigError};
use std::path::Path;

/// 程序配置文件
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 模型 API 配置 ---
    /// 生成式模型 API 基础地址
    pub api_base_url: String,
    /// API 密钥（以 query 参数形式传递）
    pub api_key: String,
    /// 模型名称
    pub model_name: String,
    // --- 生成参数 ---
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    // --- 重试策略 ---
    /// 最大尝试次数（含首次）
    pub max_attempts: usize,
    /// 首次重试前的等待毫秒数，之后每次翻倍
    pub retry_base_delay_ms: u64,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 解析策略 ---
    /// 模型输出不是约定 JSON 时是否报错（false = 回退为纯反馈文本）
    pub strict_model_json: bool,
    // --- 缓存 ---
    /// 答案缓存容量（LRU 淘汰）
    pub cache_capacity: usize,
    // --- 存储 ---
    /// JSON 集合文件存放目录
    pub data_dir: String,
    /// 上传文件存放目录
    pub upload_dir: String,
    /// 上传文件大小上限（字节）
    pub max_upload_bytes: u64,
    // --- 日志 ---
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: String::new(),
            model_name: "gemini-pro".to_string(),
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
            max_attempts: 3,
            retry_base_delay_ms: 1000,
            request_timeout_secs: 120,
            strict_model_json: false,
            cache_capacity: 256,
            data_dir: "data".to_string(),
            upload_dir: "uploads".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载配置，未设置的项使用 `base` 中的值
    pub fn from_env_with(base: Self) -> Self {
        Self {
            api_base_url: std::env::var("STUDYPAL_API_BASE_URL").unwrap_or(base.api_base_url),
            api_key: std::env::var("STUDYPAL_API_KEY").unwrap_or(base.api_key),
            model_name: std::env::var("STUDYPAL_MODEL_NAME").unwrap_or(base.model_name),
            temperature: std::env::var("STUDYPAL_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(base.temperature),
            top_k: std::env::var("STUDYPAL_TOP_K").ok().and_then(|v| v.parse().ok()).unwrap_or(base.top_k),
            top_p: std::env::var("STUDYPAL_TOP_P").ok().and_then(|v| v.parse().ok()).unwrap_or(base.top_p),
            max_output_tokens: std::env::var("STUDYPAL_MAX_OUTPUT_TOKENS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.max_output_tokens),
            max_attempts: std::env::var("STUDYPAL_MAX_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.max_attempts),
            retry_base_delay_ms: std::env::var("STUDYPAL_RETRY_BASE_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.retry_base_delay_ms),
            request_timeout_secs: std::env::var("STUDYPAL_REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.request_timeout_secs),
            strict_model_json: std::env::var("STUDYPAL_STRICT_MODEL_JSON").ok().and_then(|v| v.parse().ok()).unwrap_or(base.strict_model_json),
            cache_capacity: std::env::var("STUDYPAL_CACHE_CAPACITY").ok().and_then(|v| v.parse().ok()).unwrap_or(base.cache_capacity),
            data_dir: std::env::var("STUDYPAL_DATA_DIR").unwrap_or(base.data_dir),
            upload_dir: std::env::var("STUDYPAL_UPLOAD_DIR").unwrap_or(base.upload_dir),
            max_upload_bytes: std::env::var("STUDYPAL_MAX_UPLOAD_BYTES").ok().and_then(|v| v.parse().ok()).unwrap_or(base.max_upload_bytes),
            verbose_logging: std::env::var("STUDYPAL_VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(base.verbose_logging),
        }
    }

    /// 从环境变量加载配置（基于默认值）
    pub fn from_env() -> Self {
        Self::from_env_with(Self::default())
    }

    /// 从 TOML 配置文件加载
    pub fn from_file(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(ConfigError::FileParseFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            AppError::Config(ConfigError::FileParseFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })?;
        Ok(config)
    }

    /// 标准加载顺序：配置文件（如存在）→ 环境变量覆盖
    pub fn load(config_path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let base = if config_path.as_ref().exists() {
            Self::from_file(config_path)?
        } else {
            Self::default()
        };
        Ok(Self::from_env_with(base))
    }

    /// 缓存容量等关键取值的合法性检查
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.max_attempts == 0 {
            return Err(AppError::Config(ConfigError::InvalidValue {
                key: "max_attempts".to_string(),
                value: self.max_attempts.to_string(),
            }));
        }
        if self.cache_capacity == 0 {
            return Err(AppError::Config(ConfigError::InvalidValue {
                key: "cache_capacity".to_string(),
                value: self.cache_capacity.to_string(),
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model_name, "gemini-pro");
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert!(!config.strict_model_json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let toml_text = r#"
            api_key = "k-123"
            model_name = "gemini-pro-test"
            max_attempts = 5
        "#;
        let config: Config = toml::from_str(toml_text).unwrap();
        assert_eq!(config.api_key, "k-123");
        assert_eq!(config.model_name, "gemini-pro-test");
        assert_eq!(config.max_attempts, 5);
        // 未设置的项保持默认值
        assert_eq!(config.retry_base_delay_ms, 1000);
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let config = Config {
            max_attempts: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
