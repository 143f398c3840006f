//! 生成式模型 API 客户端
//!
//! 封装单次 `generateContent` 调用的全部线上交互：
//! `POST {base}/models/{model}:generateContent?key={api_key}`，
//! 请求体是 `contents` + `generationConfig`，
//! 响应取 `candidates[0].content.parts[0].text`。
//! 重试策略不在这里，由上层网关负责。

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, GatewayError};

/// 一条消息内容（请求和响应共用同一形状）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: String,
    pub parts: Vec<Part>,
}

/// 消息里的一个文本片段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

impl Content {
    /// 构造一条 user 角色消息
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: "user".to_string(),
            parts,
        }
    }
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// 生成参数
#[derive(Debug, Clone, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

/// 请求体
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: &'a [Content],
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

/// 响应信封
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

/// 非 2xx 响应携带的错误信封
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// 模型客户端
pub struct ModelClient {
    client: reqwest::Client,
    base_url: String,
    model_name: String,
    api_key: String,
    generation_config: GenerationConfig,
}

impl ModelClient {
    /// 创建新的模型客户端
    pub fn new(config: &Config) -> crate::error::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Other(format!("创建 HTTP 客户端失败: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model_name: config.model_name.clone(),
            api_key: config.api_key.clone(),
            generation_config: GenerationConfig {
                temperature: config.temperature,
                top_k: config.top_k,
                top_p: config.top_p,
                max_output_tokens: config.max_output_tokens,
            },
        })
    }

    /// 调用端点（不含密钥，可安全打日志）
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model_name
        )
    }

    /// 发送一次生成请求
    ///
    /// # 参数
    /// - `contents`: 消息列表
    ///
    /// # 返回
    /// 返回模型输出的原始文本
    pub async fn generate(&self, contents: &[Content]) -> Result<String, GatewayError> {
        let endpoint = self.endpoint();
        debug!("调用模型 API: {}", endpoint);

        let body = GenerateRequest {
            contents,
            generation_config: self.generation_config.clone(),
        };

        let url = format!("{}?key={}", endpoint, self.api_key);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport {
                endpoint: endpoint.clone(),
                detail: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| GatewayError::Transport {
            endpoint: endpoint.clone(),
            detail: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(self.classify_failure(status.as_u16(), &text, endpoint));
        }

        let envelope: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| GatewayError::Transport {
                endpoint: endpoint.clone(),
                detail: format!("响应信封不是合法 JSON: {}", e),
            })?;

        let content = envelope
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(GatewayError::EmptyResponse { endpoint })?;

        debug!("模型 API 调用成功, 输出 {} 字符", content.chars().count());

        Ok(content.trim().to_string())
    }

    /// 将非 2xx 响应归类到错误分类
    fn classify_failure(&self, status: u16, body: &str, endpoint: String) -> GatewayError {
        // 错误信封是可选的
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|env| env.error)
            .and_then(|e| e.message);

        warn!("模型 API 返回 HTTP {}: {:?}", status, message);

        match status {
            401 | 403 => GatewayError::Auth {
                message: message.unwrap_or_else(|| format!("HTTP {}", status)),
            },
            429 | 503 => GatewayError::Overloaded { endpoint, status },
            _ => GatewayError::Transport {
                endpoint,
                detail: message.unwrap_or_else(|| format!("HTTP {}", status)),
            },
        }
    }
}
