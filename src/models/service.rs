use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// 被监控服务的描述（来自 services.json）
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    /// 展示名，用于告警模板
    #[serde(default)]
    pub name: Option<String>,
    /// 进程 ID，负数视为未设置
    #[serde(default, deserialize_with = "deserialize_pid")]
    pub process_id: Option<u32>,
    /// 进程名（忽略大小写匹配）
    #[serde(default)]
    pub process_name: Option<String>,
    /// 必须全部出现在命令行中的参数
    #[serde(default, deserialize_with = "deserialize_args")]
    pub args: Vec<String>,
}

impl ServiceDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.process_id = Some(pid);
        self
    }

    pub fn with_process_name(mut self, process_name: impl Into<String>) -> Self {
        self.process_name = Some(process_name.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Non-empty process name, if any.
    pub fn process_name(&self) -> Option<&str> {
        self.process_name.as_deref().filter(|n| !n.is_empty())
    }

    /// Value substituted for `{name}` / `{args}` in alert templates.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        if !self.args.is_empty() {
            return self.args.join(" ");
        }
        if let Some(process_name) = self.process_name() {
            return process_name.to_string();
        }
        match self.process_id {
            Some(pid) => format!("pid:{}", pid),
            None => "unnamed".to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPid {
    Number(i64),
    Text(String),
}

fn deserialize_pid<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawPid>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawPid::Number(n)) => Ok(u32::try_from(n).ok()),
        Some(RawPid::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            let n: i64 = text.parse().map_err(de::Error::custom)?;
            Ok(u32::try_from(n).ok())
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawArgs {
    One(String),
    Many(Vec<String>),
}

// 旧版 manifest 中 args 是单个字符串
fn deserialize_args<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let args = match Option::<RawArgs>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(RawArgs::One(token)) => vec![token],
        Some(RawArgs::Many(tokens)) => tokens,
    };
    Ok(args.into_iter().filter(|t| !t.is_empty()).collect())
}

fn is_falsy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// 解析 manifest 内容，跳过空条目和无法解析的条目
pub fn parse_manifest(contents: &str, origin: &str) -> Result<Vec<ServiceDescriptor>, ConfigError> {
    let entries: Vec<serde_json::Value> =
        serde_json::from_str(contents).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            reason: e.to_string(),
        })?;

    let mut services = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        if is_falsy(&entry) {
            log::debug!("Skipping empty manifest entry #{}", index);
            continue;
        }
        match serde_json::from_value::<ServiceDescriptor>(entry) {
            Ok(service) => services.push(service),
            Err(e) => log::warn!("Skipping manifest entry #{} in {}: {}", index, origin, e),
        }
    }
    Ok(services)
}

pub fn load_manifest<P: AsRef<Path>>(path: P) -> Result<Vec<ServiceDescriptor>, ConfigError> {
    let path_str = path.as_ref().display().to_string();
    let contents = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Read {
        path: path_str.clone(),
        source,
    })?;
    parse_manifest(&contents, &path_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_entry() {
        let services = parse_manifest(
            r#"[{"name": "api", "processId": 42, "processName": "nginx", "args": ["--port", "8080"]}]"#,
            "inline",
        )
        .unwrap();

        assert_eq!(
            services,
            vec![ServiceDescriptor::named("api")
                .with_pid(42)
                .with_process_name("nginx")
                .with_args(["--port", "8080"])]
        );
    }

    #[test]
    fn test_skips_falsy_entries() {
        let services = parse_manifest(
            r#"[null, {}, {"processName": "worker"}, false, ""]"#,
            "inline",
        )
        .unwrap();

        assert_eq!(services.len(), 1);
        assert_eq!(services[0].process_name(), Some("worker"));
    }

    #[test]
    fn test_skips_malformed_entry() {
        let services = parse_manifest(
            r#"[{"processId": {"nested": true}}, {"name": "ok"}]"#,
            "inline",
        )
        .unwrap();

        assert_eq!(services, vec![ServiceDescriptor::named("ok")]);
    }

    #[test]
    fn test_legacy_args_string() {
        let services = parse_manifest(r#"[{"args": "server.py"}]"#, "inline").unwrap();
        assert_eq!(services[0].args, vec!["server.py".to_string()]);
        assert_eq!(services[0].display_name(), "server.py");
    }

    #[test]
    fn test_process_id_variants() {
        let services = parse_manifest(
            r#"[{"processId": "123"}, {"processId": -1}, {"processId": ""}]"#,
            "inline",
        )
        .unwrap();

        assert_eq!(services[0].process_id, Some(123));
        assert_eq!(services[1].process_id, None);
        assert_eq!(services[2].process_id, None);
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(ServiceDescriptor::named("X").display_name(), "X");
        assert_eq!(
            ServiceDescriptor::default().with_process_name("redis").display_name(),
            "redis"
        );
        assert_eq!(ServiceDescriptor::default().with_pid(7).display_name(), "pid:7");
        assert_eq!(ServiceDescriptor::default().display_name(), "unnamed");
    }

    #[test]
    fn test_not_an_array() {
        let err = parse_manifest(r#"{"name": "x"}"#, "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_manifest_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"name": "X", "processName": "worker"}}]"#).unwrap();

        let services = load_manifest(file.path()).unwrap();
        assert_eq!(services, vec![ServiceDescriptor::named("X").with_process_name("worker")]);
    }

    #[test]
    fn test_load_missing_manifest() {
        let err = load_manifest("/nonexistent/services.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
