//! Static catalog of supported backends and the only construction path for
//! provider instances. Construction never performs network I/O; credentials
//! are only exercised by `test_connection` or a real request.

use crate::domain::{ConfigSchema, OrganizerError, ProviderConfig, ProviderKind};

use super::bedrock::BedrockProvider;
use super::cerebras::CerebrasProvider;
use super::claude::ClaudeProvider;
use super::gemini::GeminiProvider;
use super::openai::OpenAiProvider;
use super::provider::TabProvider;

/// Display metadata for one backend, used by settings UIs to render the
/// provider picker without instantiating anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub kind: ProviderKind,
    pub display_name: &'static str,
    pub description: &'static str,
    /// Asset name of the provider logo bundled with the settings UI.
    pub icon: &'static str,
}

const DESCRIPTORS: [ProviderDescriptor; 5] = [
    ProviderDescriptor {
        kind: ProviderKind::Claude,
        display_name: "Claude",
        description: "Anthropic Claude via the Messages API",
        icon: "claude",
    },
    ProviderDescriptor {
        kind: ProviderKind::OpenAi,
        display_name: "OpenAI",
        description: "OpenAI GPT models via chat completions",
        icon: "openai",
    },
    ProviderDescriptor {
        kind: ProviderKind::Gemini,
        display_name: "Gemini",
        description: "Google Gemini via the generateContent API",
        icon: "gemini",
    },
    ProviderDescriptor {
        kind: ProviderKind::Cerebras,
        display_name: "Cerebras",
        description: "Cerebras-hosted open models, OpenAI-compatible",
        icon: "cerebras",
    },
    ProviderDescriptor {
        kind: ProviderKind::Bedrock,
        display_name: "AWS Bedrock",
        description: "Anthropic Claude models served through AWS Bedrock",
        icon: "bedrock",
    },
];

pub fn descriptors() -> &'static [ProviderDescriptor] {
    &DESCRIPTORS
}

pub fn descriptor(kind: ProviderKind) -> &'static ProviderDescriptor {
    DESCRIPTORS
        .iter()
        .find(|descriptor| descriptor.kind == kind)
        .expect("descriptor table covers every provider kind")
}

/// Field layout for a backend's settings form, available before any
/// credentials exist.
pub fn config_schema_for(kind: ProviderKind) -> ConfigSchema {
    match kind {
        ProviderKind::Claude => ClaudeProvider::schema(),
        ProviderKind::OpenAi => OpenAiProvider::schema(),
        ProviderKind::Gemini => GeminiProvider::schema(),
        ProviderKind::Cerebras => CerebrasProvider::schema(),
        ProviderKind::Bedrock => BedrockProvider::schema(),
    }
}

/// Builds the provider selected by `provider_id` from its stored config.
///
/// Fails with `UnknownProvider` for an unrecognized id and with a
/// configuration error when the stored config belongs to a different backend
/// than the one requested.
pub fn create_provider(
    provider_id: &str,
    config: ProviderConfig,
) -> Result<Box<dyn TabProvider>, OrganizerError> {
    let kind = ProviderKind::from_id(provider_id)
        .ok_or_else(|| OrganizerError::unknown_provider(provider_id))?;

    if config.kind() != kind {
        return Err(OrganizerError::configuration(format!(
            "stored config is for '{}' but provider '{}' was requested",
            config.kind().id(),
            kind.id(),
        )));
    }

    let provider: Box<dyn TabProvider> = match config {
        ProviderConfig::Claude { api_key, model } => Box::new(ClaudeProvider::new(api_key, model)?),
        ProviderConfig::OpenAi { api_key, model } => Box::new(OpenAiProvider::new(api_key, model)?),
        ProviderConfig::Gemini { api_key, model } => Box::new(GeminiProvider::new(api_key, model)?),
        ProviderConfig::Cerebras { api_key, model } => {
            Box::new(CerebrasProvider::new(api_key, model)?)
        }
        ProviderConfig::Bedrock {
            access_key_id,
            secret_access_key,
            region,
            model,
        } => Box::new(BedrockProvider::new(
            access_key_id,
            secret_access_key,
            region,
            model,
        )?),
    };

    Ok(provider)
}
