//! Shared plumbing for backends speaking the OpenAI chat-completions dialect.
//! The OpenAI and Cerebras adapters both delegate here; only base URL, model
//! catalog, and settings schema differ between them.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::OrganizerError;

use super::http::{RetryPolicy, send_once, send_with_retry};
use super::prompt_builder::BuiltPrompt;
use super::provider::SAMPLING_TEMPERATURE;
use super::response_parsing::non_empty_owned;

pub(crate) struct ChatCompletionsClient {
    label: &'static str,
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
    retry: RetryPolicy,
}

impl ChatCompletionsClient {
    pub(crate) fn new(
        label: &'static str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OrganizerError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(OrganizerError::configuration(format!(
                "{label} API key must not be empty"
            )));
        }
        let model = model.into();
        if model.trim().is_empty() {
            return Err(OrganizerError::configuration(format!(
                "{label} model must not be empty"
            )));
        }
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(OrganizerError::configuration(format!(
                "{label} API base URL must not be empty"
            )));
        }

        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            OrganizerError::internal(format!("failed to create {label} HTTP client: {err}"))
        })?;

        Ok(Self {
            label,
            api_key,
            model,
            base_url,
            client,
            retry: RetryPolicy::default(),
        })
    }

    pub(crate) fn set_retry(&mut self, retry: RetryPolicy) {
        self.retry = retry;
    }

    /// Runs one chat completion and returns the assistant text. The response
    /// shape is pinned with a `json_schema` response format, so extraction is
    /// a fallback rather than the main path for these backends.
    pub(crate) async fn complete(
        &self,
        prompt: &BuiltPrompt,
        max_tokens: u32,
        schema_name: &'static str,
        schema_text: &str,
    ) -> Result<String, OrganizerError> {
        let schema: Value = serde_json::from_str(schema_text).map_err(|err| {
            OrganizerError::internal(format!("invalid built-in {schema_name} schema: {err}"))
        })?;

        let payload = ChatCompletionsRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompt.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.user.clone(),
                },
            ],
            temperature: SAMPLING_TEMPERATURE,
            max_tokens,
            response_format: ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchemaFormat {
                    name: schema_name.to_string(),
                    schema,
                    strict: false,
                },
            },
        };

        let label = self.label;
        let request = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&payload);

        let body = send_with_retry(request, label, &self.retry, |status, body| {
            map_http_error(label, status, body)
        })
        .await?;
        response_text(label, &body)
    }

    /// One minimal, single-shot request against the model catalog endpoint.
    pub(crate) async fn probe(&self) -> Result<(), OrganizerError> {
        let label = self.label;
        let request = self
            .client
            .get(self.models_url())
            .bearer_auth(&self.api_key);

        send_once(request, label, |status, body| {
            map_http_error(label, status, body)
        })
        .await?;
        Ok(())
    }

    fn completions_url(&self) -> String {
        build_v1_url(&self.base_url, "chat/completions")
    }

    fn models_url(&self) -> String {
        build_v1_url(&self.base_url, "models")
    }
}

fn response_text(label: &str, body: &str) -> Result<String, OrganizerError> {
    let response: ChatCompletionsResponse = serde_json::from_str(body).map_err(|err| {
        OrganizerError::malformed(format!("{label} response decode failed: {err}"), body)
    })?;

    let text = response
        .choices
        .iter()
        .find_map(ChatChoice::extract_text);

    match text {
        Some(text) => Ok(text),
        None => Err(OrganizerError::EmptyResponse),
    }
}

fn build_v1_url(base_url: &str, endpoint_path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let endpoint_path = endpoint_path.trim_start_matches('/');

    if base.ends_with("/v1") {
        format!("{base}/{endpoint_path}")
    } else {
        format!("{base}/v1/{endpoint_path}")
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    schema: Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatChoiceMessage>,
    #[serde(default)]
    text: Option<String>,
}

impl ChatChoice {
    fn extract_text(&self) -> Option<String> {
        if let Some(text) = self.text.as_deref().and_then(non_empty_owned) {
            return Some(text);
        }
        let content = self.message.as_ref()?.content.as_ref()?;
        extract_message_content(content)
    }
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<Value>,
}

fn extract_message_content(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => non_empty_owned(text),
        Value::Array(parts) => {
            let joined = parts
                .iter()
                .filter_map(extract_content_part_text)
                .collect::<String>();
            non_empty_owned(&joined)
        }
        _ => None,
    }
}

fn extract_content_part_text(part: &Value) -> Option<String> {
    match part {
        Value::String(text) => Some(text.to_string()),
        Value::Object(map) => map
            .get("text")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

pub(crate) fn map_http_error(label: &str, status: StatusCode, body: &str) -> OrganizerError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let error_type = parsed
        .as_ref()
        .and_then(|envelope| envelope.error.as_ref())
        .and_then(|detail| detail.error_type.as_deref());
    let error_code = parsed
        .as_ref()
        .and_then(|envelope| envelope.error.as_ref())
        .and_then(|detail| detail.code.as_deref());
    let message = parsed
        .as_ref()
        .and_then(|envelope| envelope.error.as_ref())
        .map(|detail| detail.message.clone())
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| body.trim().chars().take(256).collect());

    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || matches!(error_type, Some("authentication_error"))
        || matches!(
            error_code,
            Some("invalid_api_key" | "invalid_authentication")
        )
    {
        return OrganizerError::auth(message);
    }

    if status == StatusCode::TOO_MANY_REQUESTS
        || matches!(error_type, Some("rate_limit_error" | "insufficient_quota"))
        || matches!(
            error_code,
            Some("rate_limit_exceeded" | "insufficient_quota")
        )
    {
        return OrganizerError::rate_limited(message);
    }

    if status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::GATEWAY_TIMEOUT
        || matches!(error_type, Some("timeout" | "server_timeout"))
        || matches!(error_code, Some("request_timeout"))
    {
        return OrganizerError::timeout(message);
    }

    OrganizerError::transport(format!("{label} API returned HTTP {status}: {message}"))
}
