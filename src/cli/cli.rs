use clap::Parser;
use std::path::PathBuf;

/// Process Alerter - 进程存活检查与多渠道告警
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// 服务清单 (JSON)
    #[arg(short, long, env = "SERVICES_FILE", default_value = "services.json")]
    pub services: PathBuf,

    /// 渠道定义文件 (TOML)，设置后替换内置渠道
    #[arg(short, long, env = "CHANNELS_FILE")]
    pub channels: Option<PathBuf>,

    /// 条件判断使用的时区偏移
    #[arg(long, env = "ALERT_UTC_OFFSET", default_value = "+05:30")]
    pub utc_offset: String,

    #[arg(long, env = "WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    #[arg(long, env = "WEBHOOK_TOKEN", hide_env_values = true)]
    pub webhook_token: Option<String>,

    #[arg(long, env = "PAGER_DUTY_URL")]
    pub pager_duty_url: Option<String>,

    #[arg(long, env = "PAGER_DUTY_SERVICE_ID")]
    pub pager_duty_service_id: Option<String>,

    #[arg(long, env = "PAGER_DUTY_API_KEY", hide_env_values = true)]
    pub pager_duty_api_key: Option<String>,

    #[arg(long, env = "PAGER_DUTY_EMAIL")]
    pub pager_duty_email: Option<String>,

    #[arg(long, env = "SMS_URL")]
    pub sms_url: Option<String>,

    #[arg(long, env = "SMS_TO")]
    pub sms_to: Option<String>,

    #[arg(long, env = "SMS_SID")]
    pub sms_sid: Option<String>,

    #[arg(long, env = "SMS_AUTH", hide_env_values = true)]
    pub sms_auth: Option<String>,

    /// SMS 只在该小时之后发送
    #[arg(long, env = "SMS_FROM_HOUR", default_value_t = 10)]
    pub sms_from_hour: u32,

    /// 单次 HTTP 请求超时（秒）
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 5)]
    pub request_timeout_secs: u64,

    /// 单个渠道总耗时上限，含重试（秒）
    #[arg(long, env = "CHANNEL_TIMEOUT_SECS", default_value_t = 15)]
    pub channel_timeout_secs: u64,

    /// 循环检查间隔（秒），不设置则只运行一次
    #[arg(short, long, env = "CHECK_INTERVAL_SECS")]
    pub interval_secs: Option<u64>,

    /// Prometheus textfile 输出路径
    #[arg(short, long, env = "METRICS_FILE")]
    pub metrics_file: Option<PathBuf>,
}
