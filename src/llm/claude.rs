use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::domain::{
    CleanResult, ConfigField, ConfigSchema, GroupingResult, OrganizerError, ProviderKind, TabRecord,
};

use super::http::{RetryPolicy, send_once, send_with_retry};
use super::prompt_builder::{BuiltPrompt, build_clean_prompt, build_organize_prompt};
use super::provider::{
    DEFAULT_TIMEOUT, MAX_TOKENS_CATEGORIZE, MAX_TOKENS_CLEAN, SAMPLING_TEMPERATURE, TabProvider,
};
use super::schema_validator::ResponseSchemaValidator;

const LABEL: &str = "Claude";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

pub(crate) const DEFAULT_MODELS: &[&str] = &[
    "claude-sonnet-4-5",
    "claude-haiku-4-5",
    "claude-3-5-haiku-latest",
];
const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

/// Adapter for the Anthropic Messages API. Claude has no schema-enforced
/// output mode, so responses go through text extraction before validation.
pub struct ClaudeProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
    validator: ResponseSchemaValidator,
    retry: RetryPolicy,
}

impl ClaudeProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, OrganizerError> {
        Self::with_config(api_key, model, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    pub fn with_config(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OrganizerError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(OrganizerError::configuration(
                "Claude API key must not be empty",
            ));
        }
        let model = model.into();
        if model.trim().is_empty() {
            return Err(OrganizerError::configuration(
                "Claude model must not be empty",
            ));
        }
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(OrganizerError::configuration(
                "Claude API base URL must not be empty",
            ));
        }

        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            OrganizerError::internal(format!("failed to create Claude HTTP client: {err}"))
        })?;

        Ok(Self {
            api_key,
            model,
            base_url,
            client,
            validator: ResponseSchemaValidator::new()?,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub(crate) fn schema() -> ConfigSchema {
        ConfigSchema::new(vec![
            ConfigField::password("api_key", "Anthropic API key", "sk-ant-..."),
            ConfigField::select("model", "Model", DEFAULT_MODELS, DEFAULT_MODEL),
        ])
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }

    fn request_payload(&self, prompt: &BuiltPrompt, max_tokens: u32) -> ClaudeMessagesRequest {
        ClaudeMessagesRequest {
            model: self.model.clone(),
            max_tokens,
            temperature: SAMPLING_TEMPERATURE,
            system: prompt.system.clone(),
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: prompt.user.clone(),
            }],
        }
    }

    async fn complete(
        &self,
        prompt: &BuiltPrompt,
        max_tokens: u32,
    ) -> Result<String, OrganizerError> {
        let payload = self.request_payload(prompt, max_tokens);
        let request = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&payload);

        let body = send_with_retry(request, LABEL, &self.retry, map_http_error).await?;
        messages_response_text(&body)
    }
}

#[async_trait]
impl TabProvider for ClaudeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    fn config_schema(&self) -> ConfigSchema {
        Self::schema()
    }

    async fn categorize(
        &self,
        tabs: &[TabRecord],
        guidance: Option<&str>,
    ) -> Result<GroupingResult, OrganizerError> {
        if tabs.is_empty() {
            return Ok(GroupingResult::default());
        }

        let prompt = build_organize_prompt(tabs, guidance);
        let text = self.complete(&prompt, MAX_TOKENS_CATEGORIZE).await?;
        self.validator.grouping_from_text(&text)
    }

    async fn clean_tabs(
        &self,
        tabs: &[TabRecord],
        guidance: &str,
    ) -> Result<CleanResult, OrganizerError> {
        let prompt = build_clean_prompt(tabs, guidance)?;
        let text = self.complete(&prompt, MAX_TOKENS_CLEAN).await?;
        let proposal = self.validator.clean_from_text(&text)?;
        Ok(CleanResult::resolve(proposal, tabs))
    }

    async fn test_connection(&self) -> bool {
        let payload = ClaudeMessagesRequest {
            model: self.model.clone(),
            max_tokens: 1,
            temperature: SAMPLING_TEMPERATURE,
            system: String::new(),
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: "ping".to_string(),
            }],
        };
        let request = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&payload);

        match send_once(request, LABEL, map_http_error).await {
            Ok(_) => true,
            Err(error) => {
                log::debug!("Claude connection test failed: {error}");
                false
            }
        }
    }
}

pub(crate) fn messages_response_text(body: &str) -> Result<String, OrganizerError> {
    let response: ClaudeMessagesResponse = serde_json::from_str(body).map_err(|err| {
        OrganizerError::malformed(format!("Claude response decode failed: {err}"), body)
    })?;

    let joined = response
        .content
        .iter()
        .filter_map(ClaudeContentBlock::as_text)
        .collect::<Vec<_>>()
        .join("");

    if joined.trim().is_empty() {
        return Err(OrganizerError::EmptyResponse);
    }
    Ok(joined)
}

#[derive(Debug, Serialize)]
struct ClaudeMessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<ClaudeMessage>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeMessagesResponse {
    #[serde(default)]
    content: Vec<ClaudeContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl ClaudeContentBlock {
    fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Other => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorEnvelope {
    #[serde(default)]
    error: Option<ClaudeErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

fn map_http_error(status: StatusCode, body: &str) -> OrganizerError {
    let parsed = serde_json::from_str::<ClaudeErrorEnvelope>(body).ok();
    let error_type = parsed
        .as_ref()
        .and_then(|envelope| envelope.error.as_ref())
        .map(|detail| detail.error_type.as_str());
    // The backend's own message rides along on every classification.
    let message = parsed
        .as_ref()
        .and_then(|envelope| envelope.error.as_ref())
        .map(|detail| detail.message.clone())
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| body.trim().chars().take(256).collect());

    if matches!(
        error_type,
        Some("authentication_error" | "invalid_api_key_error")
    ) || status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
    {
        return OrganizerError::auth(message);
    }
    if matches!(error_type, Some("rate_limit_error")) || status == StatusCode::TOO_MANY_REQUESTS {
        return OrganizerError::rate_limited(message);
    }
    if matches!(error_type, Some("timeout_error"))
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::GATEWAY_TIMEOUT
    {
        return OrganizerError::timeout(message);
    }

    OrganizerError::transport(format!("Claude API returned HTTP {status}: {message}"))
}
