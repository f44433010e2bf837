use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::DeliveryError;
use crate::models::{BodyFormat, HttpMethod};

/// 触发重试的服务端状态码
const RETRYABLE_STATUS: [u16; 4] = [500, 502, 503, 504];

/// 重试策略：总尝试次数与指数退避
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base: Duration::from_millis(100),
            backoff_max: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Sleep before the given retry (1-based): `base * 2^(retry-1)`, capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.backoff_base
            .saturating_mul(factor)
            .min(self.backoff_max)
    }

    pub fn is_retryable_status(status: u16) -> bool {
        RETRYABLE_STATUS.contains(&status)
    }
}

/// 最终收到的 HTTP 响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResponse {
    pub status: u16,
    pub body: String,
    /// 实际尝试次数
    pub attempts: u32,
}

impl DeliveryResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

enum EncodedBody {
    Empty,
    Json(String),
    Form(Vec<(String, String)>),
}

pub struct HttpDeliveryClient {
    client: Client,
    retry: RetryPolicy,
}

impl HttpDeliveryClient {
    pub fn new(request_timeout: Duration, retry: RetryPolicy) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| DeliveryError::InvalidRequest(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { client, retry })
    }

    /// 发送请求，遇到 5xx 或连接错误时重试
    pub async fn deliver(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &BTreeMap<String, String>,
        payload: &Value,
        format: BodyFormat,
    ) -> Result<DeliveryResponse, DeliveryError> {
        let url = Url::parse(url).map_err(|e| DeliveryError::InvalidRequest(format!("url '{}': {}", url, e)))?;
        let header_map = build_headers(headers)?;
        let body = match method {
            HttpMethod::Get => EncodedBody::Empty,
            HttpMethod::Post => encode_body(payload, format)?,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let last_attempt = attempt >= self.retry.max_attempts;

            match self.request(method, &url, &header_map, &body).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if !RetryPolicy::is_retryable_status(status) {
                        let body = response.text().await.unwrap_or_default();
                        return Ok(DeliveryResponse {
                            status,
                            body,
                            attempts: attempt,
                        });
                    }
                    if last_attempt {
                        return Err(DeliveryError::RetriesExhausted {
                            attempts: attempt,
                            status,
                        });
                    }
                    log::warn!("Attempt {} to {} returned {}, retrying", attempt, url, status);
                }
                Err(e) if e.is_builder() => {
                    return Err(DeliveryError::InvalidRequest(e.to_string()));
                }
                Err(e) => {
                    if last_attempt {
                        return Err(DeliveryError::Transport {
                            attempts: attempt,
                            source: e,
                        });
                    }
                    log::warn!("Attempt {} to {} failed: {}, retrying", attempt, url, e);
                }
            }

            tokio::time::sleep(self.retry.backoff(attempt)).await;
        }
    }

    fn request(
        &self,
        method: HttpMethod,
        url: &Url,
        headers: &HeaderMap,
        body: &EncodedBody,
    ) -> reqwest::RequestBuilder {
        let method = match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };
        let builder = self
            .client
            .request(method, url.clone())
            .headers(headers.clone());

        match body {
            EncodedBody::Empty => builder,
            EncodedBody::Json(json) => {
                let builder = if headers.contains_key(CONTENT_TYPE) {
                    builder
                } else {
                    builder.header(CONTENT_TYPE, "application/json")
                };
                builder.body(json.clone())
            }
            EncodedBody::Form(pairs) => builder.form(pairs),
        }
    }
}

fn build_headers(headers: &BTreeMap<String, String>) -> Result<HeaderMap, DeliveryError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| DeliveryError::InvalidRequest(format!("header name '{}': {}", name, e)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| DeliveryError::InvalidRequest(format!("header '{}': {}", name, e)))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

fn encode_body(payload: &Value, format: BodyFormat) -> Result<EncodedBody, DeliveryError> {
    match format {
        BodyFormat::Json => serde_json::to_string(payload)
            .map(EncodedBody::Json)
            .map_err(|e| DeliveryError::Encode(e.to_string())),
        BodyFormat::Form => form_pairs(payload).map(EncodedBody::Form),
    }
}

/// 表单只支持一层对象，嵌套值按 JSON 文本发送
fn form_pairs(payload: &Value) -> Result<Vec<(String, String)>, DeliveryError> {
    let Value::Object(fields) = payload else {
        return Err(DeliveryError::Encode(
            "form body must be an object".to_string(),
        ));
    };

    Ok(fields
        .iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                Value::Number(_) | Value::Bool(_) => value.to_string(),
                Value::Array(_) | Value::Object(_) => value.to_string(),
            };
            (key.clone(), text)
        })
        .collect())
}
