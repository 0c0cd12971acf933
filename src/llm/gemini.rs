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

const LABEL: &str = "Gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub(crate) const DEFAULT_MODELS: &[&str] =
    &["gemini-2.0-flash", "gemini-2.5-flash", "gemini-2.5-pro"];
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Adapter for the Gemini generateContent API. JSON output is requested via
/// the response MIME type, with text extraction kept as the fallback path.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
    validator: ResponseSchemaValidator,
    retry: RetryPolicy,
}

impl GeminiProvider {
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
                "Gemini API key must not be empty",
            ));
        }
        let model = model.into();
        if model.trim().is_empty() {
            return Err(OrganizerError::configuration(
                "Gemini model must not be empty",
            ));
        }
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(OrganizerError::configuration(
                "Gemini API base URL must not be empty",
            ));
        }

        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            OrganizerError::internal(format!("failed to create Gemini HTTP client: {err}"))
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
            ConfigField::password("api_key", "Gemini API key", "AIza..."),
            ConfigField::select("model", "Model", DEFAULT_MODELS, DEFAULT_MODEL),
        ])
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn models_url(&self) -> String {
        format!("{}/v1beta/models", self.base_url.trim_end_matches('/'))
    }

    async fn complete(
        &self,
        prompt: &BuiltPrompt,
        max_tokens: u32,
    ) -> Result<String, OrganizerError> {
        let payload = GenerateContentRequest {
            system_instruction: ContentPayload {
                role: None,
                parts: vec![TextPart {
                    text: prompt.system.clone(),
                }],
            },
            contents: vec![ContentPayload {
                role: Some("user".to_string()),
                parts: vec![TextPart {
                    text: prompt.user.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: SAMPLING_TEMPERATURE,
                max_output_tokens: max_tokens,
                response_mime_type: "application/json".to_string(),
            },
        };

        let request = self
            .client
            .post(self.generate_url())
            .query(&[("key", self.api_key.as_str())])
            .header("content-type", "application/json")
            .json(&payload);

        let body = send_with_retry(request, LABEL, &self.retry, map_http_error).await?;
        response_text(&body)
    }
}

#[async_trait]
impl TabProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
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
        let request = self
            .client
            .get(self.models_url())
            .query(&[("key", self.api_key.as_str()), ("pageSize", "1")]);

        match send_once(request, LABEL, map_http_error).await {
            Ok(_) => true,
            Err(error) => {
                log::debug!("Gemini connection test failed: {error}");
                false
            }
        }
    }
}

fn response_text(body: &str) -> Result<String, OrganizerError> {
    let response: GenerateContentResponse = serde_json::from_str(body).map_err(|err| {
        OrganizerError::malformed(format!("Gemini response decode failed: {err}"), body)
    })?;

    let joined = response
        .candidates
        .first()
        .map(|candidate| {
            candidate
                .content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if joined.trim().is_empty() {
        return Err(OrganizerError::EmptyResponse);
    }
    Ok(joined)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: ContentPayload,
    contents: Vec<ContentPayload>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct ContentPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    #[serde(default)]
    content: ResponseContent,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    #[serde(default)]
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

fn map_http_error(status: StatusCode, body: &str) -> OrganizerError {
    let parsed = serde_json::from_str::<GeminiErrorEnvelope>(body).ok();
    let rpc_status = parsed
        .as_ref()
        .and_then(|envelope| envelope.error.as_ref())
        .and_then(|detail| detail.status.as_deref());
    let message = parsed
        .as_ref()
        .and_then(|envelope| envelope.error.as_ref())
        .map(|detail| detail.message.clone())
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| body.trim().chars().take(256).collect());

    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || matches!(rpc_status, Some("UNAUTHENTICATED" | "PERMISSION_DENIED"))
    {
        return OrganizerError::auth(message);
    }
    if status == StatusCode::TOO_MANY_REQUESTS || matches!(rpc_status, Some("RESOURCE_EXHAUSTED")) {
        return OrganizerError::rate_limited(message);
    }
    if status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::GATEWAY_TIMEOUT
        || matches!(rpc_status, Some("DEADLINE_EXCEEDED"))
    {
        return OrganizerError::timeout(message);
    }

    OrganizerError::transport(format!("Gemini API returned HTTP {status}: {message}"))
}
