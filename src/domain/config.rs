use serde::{Deserialize, Serialize};

/// Closed set of supported provider backends. The registry in `llm` keys its
/// descriptor table on this enum; nothing else enumerates providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Claude,
    OpenAi,
    Gemini,
    Cerebras,
    Bedrock,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::Claude,
        ProviderKind::OpenAi,
        ProviderKind::Gemini,
        ProviderKind::Cerebras,
        ProviderKind::Bedrock,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ProviderKind::Claude => "claude",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Cerebras => "cerebras",
            ProviderKind::Bedrock => "bedrock",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim() {
            "claude" => Some(ProviderKind::Claude),
            "openai" => Some(ProviderKind::OpenAi),
            "gemini" => Some(ProviderKind::Gemini),
            "cerebras" => Some(ProviderKind::Cerebras),
            "bedrock" => Some(ProviderKind::Bedrock),
            _ => None,
        }
    }
}

/// Stored credentials plus selected model, one variant per backend.
///
/// The settings layer owns persistence; a provider instance exclusively owns
/// the variant passed to its constructor and never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderConfig {
    Claude {
        api_key: String,
        model: String,
    },
    OpenAi {
        api_key: String,
        model: String,
    },
    Gemini {
        api_key: String,
        model: String,
    },
    Cerebras {
        api_key: String,
        model: String,
    },
    Bedrock {
        access_key_id: String,
        secret_access_key: String,
        region: String,
        model: String,
    },
}

impl ProviderConfig {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderConfig::Claude { .. } => ProviderKind::Claude,
            ProviderConfig::OpenAi { .. } => ProviderKind::OpenAi,
            ProviderConfig::Gemini { .. } => ProviderKind::Gemini,
            ProviderConfig::Cerebras { .. } => ProviderKind::Cerebras,
            ProviderConfig::Bedrock { .. } => ProviderKind::Bedrock,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Password,
    Select,
    Number,
}

/// One input field of a provider's settings form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigField {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
}

impl ConfigField {
    pub fn password(key: &'static str, label: &'static str, placeholder: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Password,
            required: true,
            default: None,
            options: Vec::new(),
            placeholder: Some(placeholder),
        }
    }

    pub fn text(key: &'static str, label: &'static str, placeholder: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Text,
            required: true,
            default: None,
            options: Vec::new(),
            placeholder: Some(placeholder),
        }
    }

    pub fn select(
        key: &'static str,
        label: &'static str,
        options: &[&'static str],
        default: &'static str,
    ) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Select,
            required: true,
            default: Some(default),
            options: options.to_vec(),
            placeholder: None,
        }
    }
}

/// Ordered field descriptors driving dynamic settings-form generation.
/// Stable for a given provider kind; never depends on instance state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigSchema {
    pub fields: Vec<ConfigField>,
}

impl ConfigSchema {
    pub fn new(fields: Vec<ConfigField>) -> Self {
        Self { fields }
    }

    pub fn field(&self, key: &str) -> Option<&ConfigField> {
        self.fields.iter().find(|field| field.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigField, ConfigSchema, FieldKind, ProviderConfig, ProviderKind};

    #[test]
    fn provider_ids_round_trip() {
        for kind in ProviderKind::ALL {
            assert_eq!(ProviderKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(ProviderKind::from_id("not-a-real-provider"), None);
        assert_eq!(ProviderKind::from_id(" claude "), Some(ProviderKind::Claude));
    }

    #[test]
    fn config_variant_reports_its_kind() {
        let config = ProviderConfig::Bedrock {
            access_key_id: "AKIA".to_string(),
            secret_access_key: "secret".to_string(),
            region: "us-east-1".to_string(),
            model: "anthropic.claude-3-5-sonnet-20241022-v2:0".to_string(),
        };
        assert_eq!(config.kind(), ProviderKind::Bedrock);
    }

    #[test]
    fn stored_config_deserializes_from_tagged_json() {
        let json = r#"{"provider":"openai","api_key":"sk-test","model":"gpt-4o-mini"}"#;
        let config: ProviderConfig =
            serde_json::from_str(json).expect("tagged config should deserialize");

        assert_eq!(
            config,
            ProviderConfig::OpenAi {
                api_key: "sk-test".to_string(),
                model: "gpt-4o-mini".to_string(),
            }
        );
    }

    #[test]
    fn schema_lookup_finds_fields_by_key() {
        let schema = ConfigSchema::new(vec![
            ConfigField::password("api_key", "API key", "sk-..."),
            ConfigField::select("model", "Model", &["gpt-4o", "gpt-4o-mini"], "gpt-4o-mini"),
        ]);

        let field = schema.field("model").expect("model field should exist");
        assert_eq!(field.kind, FieldKind::Select);
        assert_eq!(field.default, Some("gpt-4o-mini"));
        assert!(schema.field("missing").is_none());
    }
}
