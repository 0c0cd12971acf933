use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::domain::{
    CleanResult, ConfigField, ConfigSchema, GroupingResult, OrganizerError, ProviderKind, TabRecord,
};

use super::claude::messages_response_text;
use super::http::{RetryPolicy, send_once, send_with_retry};
use super::prompt_builder::{BuiltPrompt, build_clean_prompt, build_organize_prompt};
use super::provider::{
    DEFAULT_TIMEOUT, MAX_TOKENS_CATEGORIZE, MAX_TOKENS_CLEAN, SAMPLING_TEMPERATURE, TabProvider,
};
use super::schema_validator::ResponseSchemaValidator;
use super::sigv4::{SigningInput, encode_path_segment, sign};

const LABEL: &str = "Bedrock";
const SERVICE: &str = "bedrock";
const ANTHROPIC_BEDROCK_VERSION: &str = "bedrock-2023-05-31";

pub(crate) const DEFAULT_MODELS: &[&str] = &[
    "anthropic.claude-3-5-sonnet-20241022-v2:0",
    "anthropic.claude-3-5-haiku-20241022-v1:0",
];
const DEFAULT_MODEL: &str = "anthropic.claude-3-5-sonnet-20241022-v2:0";

/// Adapter for AWS Bedrock serving Anthropic models. Requests are SigV4
/// signed instead of bearer-authenticated; the invoke response envelope is
/// the Anthropic Messages envelope, so decoding is shared with the Claude
/// adapter. No schema-enforced output, so extraction runs before validation.
pub struct BedrockProvider {
    access_key_id: String,
    secret_access_key: String,
    region: String,
    model: String,
    base_url: String,
    client: Client,
    validator: ResponseSchemaValidator,
    retry: RetryPolicy,
}

impl BedrockProvider {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, OrganizerError> {
        let region = region.into();
        if region.trim().is_empty() {
            return Err(OrganizerError::configuration(
                "Bedrock region must not be empty",
            ));
        }
        let base_url = format!("https://bedrock-runtime.{region}.amazonaws.com");
        Self::with_config(
            access_key_id,
            secret_access_key,
            region,
            model,
            base_url,
            DEFAULT_TIMEOUT,
        )
    }

    pub fn with_config(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OrganizerError> {
        let access_key_id = access_key_id.into();
        if access_key_id.trim().is_empty() {
            return Err(OrganizerError::configuration(
                "Bedrock access key ID must not be empty",
            ));
        }
        let secret_access_key = secret_access_key.into();
        if secret_access_key.trim().is_empty() {
            return Err(OrganizerError::configuration(
                "Bedrock secret access key must not be empty",
            ));
        }
        let region = region.into();
        if region.trim().is_empty() {
            return Err(OrganizerError::configuration(
                "Bedrock region must not be empty",
            ));
        }
        let model = model.into();
        if model.trim().is_empty() {
            return Err(OrganizerError::configuration(
                "Bedrock model must not be empty",
            ));
        }
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(OrganizerError::configuration(
                "Bedrock endpoint URL must not be empty",
            ));
        }

        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            OrganizerError::internal(format!("failed to create Bedrock HTTP client: {err}"))
        })?;

        Ok(Self {
            access_key_id,
            secret_access_key,
            region,
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
            ConfigField::text("access_key_id", "AWS access key ID", "AKIA..."),
            ConfigField::password("secret_access_key", "AWS secret access key", ""),
            ConfigField::text("region", "AWS region", "us-east-1"),
            ConfigField::select("model", "Model", DEFAULT_MODELS, DEFAULT_MODEL),
        ])
    }

    fn invoke_path(&self) -> String {
        format!("/model/{}/invoke", encode_path_segment(&self.model))
    }

    fn signed_invoke_request(
        &self,
        payload: &BedrockInvokeRequest,
    ) -> Result<reqwest::RequestBuilder, OrganizerError> {
        let path = self.invoke_path();
        let url_text = format!("{}{path}", self.base_url.trim_end_matches('/'));
        let url = Url::parse(&url_text).map_err(|err| {
            OrganizerError::configuration(format!("invalid Bedrock endpoint URL: {err}"))
        })?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(OrganizerError::configuration(
                    "Bedrock endpoint URL has no host",
                ));
            }
        };

        let body = serde_json::to_vec(payload).map_err(|err| {
            OrganizerError::internal(format!("failed to serialize Bedrock payload: {err}"))
        })?;

        let signed = sign(&SigningInput {
            access_key_id: &self.access_key_id,
            secret_access_key: &self.secret_access_key,
            region: &self.region,
            service: SERVICE,
            host: &host,
            path: &path,
            payload: &body,
            timestamp: Utc::now(),
        })?;

        Ok(self
            .client
            .post(url)
            .header("content-type", "application/json")
            .header("x-amz-date", signed.amz_date)
            .header("authorization", signed.authorization)
            .body(body))
    }

    fn request_payload(&self, prompt: &BuiltPrompt, max_tokens: u32) -> BedrockInvokeRequest {
        BedrockInvokeRequest {
            anthropic_version: ANTHROPIC_BEDROCK_VERSION.to_string(),
            max_tokens,
            temperature: SAMPLING_TEMPERATURE,
            system: prompt.system.clone(),
            messages: vec![BedrockMessage {
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
        let request = self.signed_invoke_request(&payload)?;

        let body = send_with_retry(request, LABEL, &self.retry, map_http_error).await?;
        messages_response_text(&body)
    }
}

#[async_trait]
impl TabProvider for BedrockProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Bedrock
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
        let payload = BedrockInvokeRequest {
            anthropic_version: ANTHROPIC_BEDROCK_VERSION.to_string(),
            max_tokens: 1,
            temperature: SAMPLING_TEMPERATURE,
            system: String::new(),
            messages: vec![BedrockMessage {
                role: "user".to_string(),
                content: "ping".to_string(),
            }],
        };

        let request = match self.signed_invoke_request(&payload) {
            Ok(request) => request,
            Err(error) => {
                log::debug!("Bedrock connection test failed to build: {error}");
                return false;
            }
        };

        match send_once(request, LABEL, map_http_error).await {
            Ok(_) => true,
            Err(error) => {
                log::debug!("Bedrock connection test failed: {error}");
                false
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct BedrockInvokeRequest {
    anthropic_version: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<BedrockMessage>,
}

#[derive(Debug, Serialize)]
struct BedrockMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct BedrockErrorEnvelope {
    #[serde(default)]
    message: Option<String>,
}

fn map_http_error(status: StatusCode, body: &str) -> OrganizerError {
    let message = serde_json::from_str::<BedrockErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| body.trim().chars().take(256).collect());

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return OrganizerError::auth(message);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return OrganizerError::rate_limited(message);
    }
    if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        return OrganizerError::timeout(message);
    }

    OrganizerError::transport(format!("Bedrock API returned HTTP {status}: {message}"))
}
