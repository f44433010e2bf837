use std::time::Duration;
use thiserror::Error;

/// 模板渲染错误
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Body template contains a node the renderer cannot handle
    #[error("unsupported template value type: {kind}")]
    UnsupportedTemplateType { kind: &'static str },
}

/// HTTP 投递错误
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// URL or header could not be turned into a request; never retried
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Connection-level failure on the last attempt
    #[error("transport error after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    /// Every attempt answered with a retryable server error
    #[error("gave up after {attempts} attempt(s), last status {status}")]
    RetriesExhausted { attempts: u32, status: u16 },

    /// Channel exceeded its total time budget
    #[error("delivery timed out after {after:?}")]
    TimedOut { after: Duration },

    /// Payload could not be encoded for the channel's body format
    #[error("cannot encode payload: {0}")]
    Encode(String),
}

/// Failure while handling one notification channel
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// 单个进程检查错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InspectError {
    /// Expected for processes owned by other users; skipped silently
    #[error("access denied to process {pid}")]
    AccessDenied { pid: u32 },

    #[error("cannot inspect process {pid}: {reason}")]
    Other { pid: u32, reason: String },
}

/// 启动配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("invalid UTC offset '{0}', expected +HH:MM or -HH:MM")]
    InvalidOffset(String),

    #[error("channel '{channel}': {reason}")]
    Channel { channel: String, reason: String },
}
