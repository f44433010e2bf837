use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::config::{AlertConfig, ChannelSettings};
use crate::error::ConfigError;
use crate::models::{BodyFormat, DeliveryCondition, HttpMethod, MinuteWindow, NotificationChannel};

/// 启动后不再修改的渠道列表
#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    channels: Vec<NotificationChannel>,
}

#[derive(Deserialize)]
struct ChannelFile {
    #[serde(default)]
    channels: Vec<NotificationChannel>,
}

impl ChannelRegistry {
    pub fn new(channels: Vec<NotificationChannel>) -> Self {
        Self { channels }
    }

    /// 有渠道文件时只使用文件中的渠道，否则使用内置渠道
    pub fn from_config(config: &AlertConfig) -> Result<Self, ConfigError> {
        match &config.channels_path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin(&config.channels)),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().display().to_string();
        let contents = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Read {
            path: path_str.clone(),
            source,
        })?;
        Self::parse_toml(&contents, &path_str)
    }

    pub fn parse_toml(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        let file: ChannelFile = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            reason: e.to_string(),
        })?;

        let channels = file
            .channels
            .into_iter()
            .map(expand_env)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { channels })
    }

    /// webhook、PagerDuty、SMS，未配置 URL 的渠道不加入
    pub fn builtin(settings: &ChannelSettings) -> Self {
        let mut channels = Vec::new();

        if let Some(url) = &settings.webhook_url {
            let mut headers = BTreeMap::new();
            insert_opt(&mut headers, "authorization", settings.webhook_token.clone());

            channels.push(NotificationChannel {
                name: "webhook".to_string(),
                method: HttpMethod::Post,
                url: url.clone(),
                headers,
                body: json!({
                    "source": "{name}",
                    "origin": "{name}",
                    "message": "**{name} Error** → Server is not running please check asap.",
                    "hashTag": "#MidDayData",
                }),
                body_format: BodyFormat::Json,
                condition: DeliveryCondition::Always,
            });
        } else {
            log::debug!("WEBHOOK_URL not set, webhook channel disabled");
        }

        if let Some(url) = &settings.pager_duty_url {
            let mut headers = BTreeMap::from([
                ("Accept".to_string(), "application/vnd.pagerduty+json;version=2".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ]);
            insert_opt(
                &mut headers,
                "Authorization",
                settings.pager_duty_api_key.as_ref().map(|key| format!("Token token={}", key)),
            );
            insert_opt(&mut headers, "From", settings.pager_duty_email.clone());

            channels.push(NotificationChannel {
                name: "pager_duty".to_string(),
                method: HttpMethod::Post,
                url: url.clone(),
                headers,
                body: json!({
                    "incident": {
                        "type": "incident",
                        "title": "**{name} Error** → Server is not running please check asap.",
                        "service": {
                            "id": settings.pager_duty_service_id.clone().unwrap_or_default(),
                            "type": "service_reference",
                        },
                        "body": {
                            "type": "incident_body",
                            "details": "{name} Server is not running please check asap.",
                        },
                    }
                }),
                body_format: BodyFormat::Json,
                condition: DeliveryCondition::Always,
            });
        } else {
            log::debug!("PAGER_DUTY_URL not set, PagerDuty channel disabled");
        }

        if let Some(url) = &settings.sms_url {
            let mut headers = BTreeMap::from([(
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            )]);
            insert_opt(&mut headers, "Authorization", settings.sms_auth.clone());

            channels.push(NotificationChannel {
                name: "sms".to_string(),
                method: HttpMethod::Post,
                url: url.clone(),
                headers,
                body: json!({
                    "To": settings.sms_to.clone().unwrap_or_default(),
                    "MessagingServiceSid": settings.sms_sid.clone().unwrap_or_default(),
                    "Body": "**{name}** → SK404 Server is not running please check asap.",
                }),
                body_format: BodyFormat::Form,
                condition: DeliveryCondition::TimeWindow {
                    hour_min: settings.sms_from_hour,
                    windows: vec![MinuteWindow(15, 30), MinuteWindow(45, 60)],
                },
            });
        } else {
            log::debug!("SMS_URL not set, SMS channel disabled");
        }

        Self { channels }
    }

    pub fn channels(&self) -> &[NotificationChannel] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

fn insert_opt(headers: &mut BTreeMap<String, String>, name: &str, value: Option<String>) {
    if let Some(value) = value {
        headers.insert(name.to_string(), value);
    }
}

// url 和 header 中的 ${VAR} 从环境变量展开
fn expand_env(mut channel: NotificationChannel) -> Result<NotificationChannel, ConfigError> {
    let label = channel.label().to_string();
    let expand = |value: &str| -> Result<String, ConfigError> {
        shellexpand::env(value)
            .map(|expanded| expanded.into_owned())
            .map_err(|e| ConfigError::Channel {
                channel: label.clone(),
                reason: e.to_string(),
            })
    };

    channel.url = expand(&channel.url)?;
    for value in channel.headers.values_mut() {
        *value = expand(value)?;
    }
    Ok(channel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn all_settings() -> ChannelSettings {
        ChannelSettings {
            webhook_url: Some("http://hooks.local/alert".into()),
            webhook_token: Some("wh-token".into()),
            pager_duty_url: Some("http://pd.local/incidents".into()),
            pager_duty_service_id: Some("PSVC1".into()),
            pager_duty_api_key: Some("pd-key".into()),
            pager_duty_email: Some("ops@example.com".into()),
            sms_url: Some("http://sms.local/send".into()),
            sms_to: Some("+15550100".into()),
            sms_sid: Some("MG123".into()),
            sms_auth: Some("Basic abc".into()),
            sms_from_hour: 10,
        }
    }

    #[test]
    fn test_builtin_order_and_shape() {
        let registry = ChannelRegistry::builtin(&all_settings());
        let names: Vec<_> = registry.channels().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["webhook", "pager_duty", "sms"]);

        let pager_duty = &registry.channels()[1];
        assert_eq!(pager_duty.headers["Authorization"], "Token token=pd-key");
        assert_eq!(pager_duty.body["incident"]["service"]["id"], "PSVC1");

        let sms = &registry.channels()[2];
        assert_eq!(sms.body_format, BodyFormat::Form);
        assert!(matches!(sms.condition, DeliveryCondition::TimeWindow { hour_min: 10, .. }));
    }

    #[test]
    fn test_builtin_skips_unconfigured() {
        let settings = ChannelSettings {
            webhook_url: Some("http://hooks.local".into()),
            ..ChannelSettings::default()
        };
        let registry = ChannelRegistry::builtin(&settings);

        assert_eq!(registry.len(), 1);
        assert!(registry.channels()[0].headers.is_empty());
        assert!(ChannelRegistry::builtin(&ChannelSettings::default()).is_empty());
    }

    #[test]
    fn test_parse_toml_channels() {
        std::env::set_var("PROCESS_ALERTER_TEST_TOKEN", "t0k3n");
        let registry = ChannelRegistry::parse_toml(
            r#"
            [[channels]]
            name = "chat"
            method = "POST"
            url = "http://chat.local/${PROCESS_ALERTER_TEST_TOKEN}"
            headers = { Authorization = "Bearer ${PROCESS_ALERTER_TEST_TOKEN}" }
            body = { text = "{name} is down", priority = 2 }

            [[channels]]
            name = "sms"
            method = "POST"
            url = "http://sms.local"
            body_format = "form"
            body = { Body = "{name}" }
            condition = { type = "time_window", hour_min = 9, windows = [[0, 10]] }

            [[channels]]
            method = "GET"
            url = "http://status.local/ping"
            "#,
            "inline",
        )
        .unwrap();

        let channels = registry.channels();
        assert_eq!(channels.len(), 3);
        assert_eq!(channels[0].url, "http://chat.local/t0k3n");
        assert_eq!(channels[0].headers["Authorization"], "Bearer t0k3n");
        assert_eq!(channels[0].body, json!({"text": "{name} is down", "priority": 2}));
        assert_eq!(
            channels[1].condition,
            DeliveryCondition::TimeWindow { hour_min: 9, windows: vec![MinuteWindow(0, 10)] }
        );
        assert_eq!(channels[2].method, HttpMethod::Get);
        assert_eq!(channels[2].condition, DeliveryCondition::Always);
    }

    #[test]
    fn test_missing_env_var() {
        let err = ChannelRegistry::parse_toml(
            r#"
            [[channels]]
            name = "chat"
            method = "POST"
            url = "http://chat.local/${PROCESS_ALERTER_TEST_UNSET_VAR}"
            "#,
            "inline",
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::Channel { ref channel, .. } if channel == "chat"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[channels]]\nmethod = \"GET\"\nurl = \"http://status.local\"").unwrap();

        let registry = ChannelRegistry::load(file.path()).unwrap();
        assert_eq!(registry.len(), 1);

        assert!(matches!(
            ChannelRegistry::load("/nonexistent/channels.toml"),
            Err(ConfigError::Read { .. })
        ));
    }
}
