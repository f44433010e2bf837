use chrono::FixedOffset;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::CommandArgs;
use crate::error::ConfigError;

/// 内置渠道需要的地址与凭据
#[derive(Debug, Clone, Default)]
pub struct ChannelSettings {
    pub webhook_url: Option<String>,
    pub webhook_token: Option<String>,
    pub pager_duty_url: Option<String>,
    pub pager_duty_service_id: Option<String>,
    pub pager_duty_api_key: Option<String>,
    pub pager_duty_email: Option<String>,
    pub sms_url: Option<String>,
    pub sms_to: Option<String>,
    pub sms_sid: Option<String>,
    pub sms_auth: Option<String>,
    pub sms_from_hour: u32,
}

/// 启动时构建一次的运行配置
#[derive(Debug, Clone)]
pub struct AlertConfig {
    pub services_path: PathBuf,
    pub channels_path: Option<PathBuf>,
    pub utc_offset: FixedOffset,
    pub channels: ChannelSettings,
    pub request_timeout: Duration,
    pub channel_timeout: Duration,
    pub interval: Option<Duration>,
    pub metrics_file: Option<PathBuf>,
}

impl AlertConfig {
    pub fn from_args(args: CommandArgs) -> Result<Self, ConfigError> {
        let utc_offset = parse_utc_offset(&args.utc_offset)?;

        Ok(Self {
            services_path: args.services,
            channels_path: args.channels,
            utc_offset,
            channels: ChannelSettings {
                webhook_url: non_empty(args.webhook_url),
                webhook_token: non_empty(args.webhook_token),
                pager_duty_url: non_empty(args.pager_duty_url),
                pager_duty_service_id: non_empty(args.pager_duty_service_id),
                pager_duty_api_key: non_empty(args.pager_duty_api_key),
                pager_duty_email: non_empty(args.pager_duty_email),
                sms_url: non_empty(args.sms_url),
                sms_to: non_empty(args.sms_to),
                sms_sid: non_empty(args.sms_sid),
                sms_auth: non_empty(args.sms_auth),
                sms_from_hour: args.sms_from_hour,
            },
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            channel_timeout: Duration::from_secs(args.channel_timeout_secs),
            interval: args.interval_secs.filter(|s| *s > 0).map(Duration::from_secs),
            metrics_file: args.metrics_file,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// 解析 `+HH:MM` / `-HH:MM` / `+HHMM`，`Z` 和 `UTC` 视为零偏移
pub fn parse_utc_offset(text: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError::InvalidOffset(text.to_string());
    let trimmed = text.trim();

    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1, &trimmed[1..]),
        Some(b'-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_offsets() {
        assert_eq!(parse_utc_offset("+05:30").unwrap().local_minus_utc(), 19800);
        assert_eq!(parse_utc_offset("+0530").unwrap().local_minus_utc(), 19800);
        assert_eq!(parse_utc_offset("-04:00").unwrap().local_minus_utc(), -14400);
        assert_eq!(parse_utc_offset("UTC").unwrap().local_minus_utc(), 0);
    }

    #[test]
    fn test_reject_bad_offsets() {
        for bad in ["05:30", "+5:30", "+25:00", "+05:61", "Asia/Kolkata", ""] {
            assert!(
                matches!(parse_utc_offset(bad), Err(ConfigError::InvalidOffset(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_from_args_defaults() {
        let args = CommandArgs::try_parse_from(["process-alerter"]).unwrap();
        let config = AlertConfig::from_args(args).unwrap();

        assert_eq!(config.services_path, PathBuf::from("services.json"));
        assert_eq!(config.utc_offset.local_minus_utc(), 19800);
        assert_eq!(config.channels.sms_from_hour, 10);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.channel_timeout, Duration::from_secs(15));
        assert!(config.interval.is_none());
    }

    #[test]
    fn test_from_args_overrides() {
        let args = CommandArgs::try_parse_from([
            "process-alerter",
            "--services",
            "/etc/alerter/services.json",
            "--utc-offset",
            "+00:00",
            "--webhook-url",
            "http://hooks.local",
            "--sms-url",
            "  ",
            "--interval-secs",
            "40",
        ])
        .unwrap();
        let config = AlertConfig::from_args(args).unwrap();

        assert_eq!(config.channels.webhook_url.as_deref(), Some("http://hooks.local"));
        assert!(config.channels.sms_url.is_none());
        assert_eq!(config.interval, Some(Duration::from_secs(40)));
        assert_eq!(config.utc_offset.local_minus_utc(), 0);
    }
}
