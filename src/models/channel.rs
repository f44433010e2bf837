use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 渠道 HTTP 方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[serde(alias = "get")]
    Get,
    #[serde(alias = "post")]
    Post,
}

/// POST 请求体的序列化格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyFormat {
    #[default]
    Json,
    /// application/x-www-form-urlencoded (SMS gateways)
    Form,
}

/// Open interval of minutes, `lo < minute < hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinuteWindow(pub u32, pub u32);

/// 渠道投递条件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeliveryCondition {
    #[default]
    Always,
    Never,
    /// `hour >= hour_min` and the minute falls inside any window
    TimeWindow {
        hour_min: u32,
        windows: Vec<MinuteWindow>,
    },
}

/// 一个告警通知渠道
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationChannel {
    #[serde(default)]
    pub name: String,
    pub method: HttpMethod,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// 请求体模板
    #[serde(default = "empty_body")]
    pub body: Value,
    #[serde(default)]
    pub body_format: BodyFormat,
    #[serde(default)]
    pub condition: DeliveryCondition,
}

fn empty_body() -> Value {
    Value::Object(serde_json::Map::new())
}

impl NotificationChannel {
    /// Name used in logs and metric labels.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.url
        } else {
            &self.name
        }
    }
}
