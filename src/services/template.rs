use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::error::TemplateError;
use crate::models::ServiceDescriptor;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{\{|\}\}|\{([^{}]*)\}").unwrap();
}

/// 模板中可替换的占位符名（args 为旧版写法）
const SERVICE_KEYS: [&str; 2] = ["name", "args"];

/// 用服务信息渲染渠道请求体模板，返回新的结构，不修改输入
pub fn render(template: &Value, service: &ServiceDescriptor) -> Result<Value, TemplateError> {
    render_with(template, &service.display_name())
}

fn render_with(template: &Value, service_name: &str) -> Result<Value, TemplateError> {
    match template {
        Value::String(text) => Ok(Value::String(render_str(text, service_name))),
        Value::Number(_) | Value::Bool(_) => Ok(template.clone()),
        Value::Object(fields) => {
            let mut rendered = Map::with_capacity(fields.len());
            for (key, value) in fields {
                rendered.insert(key.clone(), render_with(value, service_name)?);
            }
            Ok(Value::Object(rendered))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| render_with(item, service_name))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Null => Err(TemplateError::UnsupportedTemplateType { kind: "null" }),
    }
}

/// Substitutes `{name}` / `{args}`. `{{` and `}}` are escaped braces; any other
/// placeholder is left as written.
pub fn render_str(text: &str, service_name: &str) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures| match &caps[0] {
            "{{" => "{".to_string(),
            "}}" => "}".to_string(),
            whole => match caps.get(1).map(|m| m.as_str().trim()) {
                Some(key) if SERVICE_KEYS.contains(&key) => service_name.to_string(),
                _ => whole.to_string(),
            },
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_preserves_structure() {
        let template = json!({"a": {"b": "{name} down"}, "c": 200});
        let rendered = render(&template, &ServiceDescriptor::named("X")).unwrap();
        assert_eq!(rendered, json!({"a": {"b": "X down"}, "c": 200}));
    }

    #[test]
    fn test_legacy_args_placeholder() {
        let rendered = render_str("**{args} Error** → Server is not running", "billing");
        assert_eq!(rendered, "**billing Error** → Server is not running");
    }

    #[test]
    fn test_sequences_and_scalars() {
        let template = json!({
            "tags": ["{name}", "static", 3, true],
            "ratio": 0.5,
            "nested": [{"msg": "{name}!"}]
        });
        let rendered = render(&template, &ServiceDescriptor::named("db")).unwrap();
        assert_eq!(
            rendered,
            json!({
                "tags": ["db", "static", 3, true],
                "ratio": 0.5,
                "nested": [{"msg": "db!"}]
            })
        );
    }

    #[test]
    fn test_unknown_placeholder_kept() {
        assert_eq!(render_str("{name} on {host}", "api"), "api on {host}");
        assert_eq!(render_str("{}", "api"), "{}");
    }

    #[test]
    fn test_escaped_braces() {
        assert_eq!(render_str("{{name}} is {name}", "api"), "{name} is api");
        assert_eq!(render_str("lone } and {", "api"), "lone } and {");
    }

    #[test]
    fn test_null_is_unsupported() {
        let template = json!({"ok": "{name}", "bad": [null]});
        let err = render(&template, &ServiceDescriptor::named("X")).unwrap_err();
        assert!(matches!(
            err,
            TemplateError::UnsupportedTemplateType { kind: "null" }
        ));
    }

    #[test]
    fn test_render_does_not_touch_template() {
        let template = json!({"message": "{name} down", "list": ["{name}"]});
        let original = template.clone();

        let first = render(&template, &ServiceDescriptor::named("first")).unwrap();
        let second = render(&template, &ServiceDescriptor::named("second")).unwrap();

        assert_eq!(template, original);
        assert_eq!(first, json!({"message": "first down", "list": ["first"]}));
        assert_eq!(second, json!({"message": "second down", "list": ["second"]}));
    }
}
