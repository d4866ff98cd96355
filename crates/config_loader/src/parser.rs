//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, StackBlueprint};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<StackBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<StackBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<StackBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{OutputKind, SinkType};

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[[decoders]]
id = "uart"
annotation_classes = [{ id = "rx-data", description = "RX data" }]

[[instances]]
id = "uart-1"
decoder = "uart"
outputs = [{ kind = "annotation" }, { kind = "passthrough", proto_id = "uart" }]

[[sinks]]
name = "log_sink"
kind = "annotation"
sink_type = "log"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.decoders.len(), 1);
        assert_eq!(bp.decoders[0].annotation_classes[0].id, "rx-data");
        assert_eq!(bp.instances[0].session, 0);
        assert_eq!(bp.instances[0].outputs[1].kind, OutputKind::Passthrough);
        assert_eq!(bp.instances[0].outputs[1].proto_id.as_deref(), Some("uart"));
        assert_eq!(bp.sinks[0].sink_type, SinkType::Log);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "decoders": [{ "id": "i2c" }],
            "instances": [{
                "id": "i2c-1",
                "decoder": "i2c",
                "session": 2,
                "outputs": [{
                    "kind": "meta",
                    "meta": { "value_type": "float", "name": "freq" }
                }]
            }],
            "sinks": [{ "name": "log", "session": 2, "kind": "meta", "sink_type": "log" }]
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        let meta = bp.instances[0].outputs[0].meta.as_ref().unwrap();
        assert_eq!(meta.name, "freq");
        assert!(meta.description.is_empty());
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let content = r#"
[[sinks]]
name = "log"
kind = "logic"
sink_type = "log"
"#;
        assert!(matches!(
            parse_toml(content),
            Err(ContractError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
