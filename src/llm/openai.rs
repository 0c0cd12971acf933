use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{
    CleanResult, ConfigField, ConfigSchema, GroupingResult, OrganizerError, ProviderKind, TabRecord,
};

use super::http::RetryPolicy;
use super::openai_compatible::ChatCompletionsClient;
use super::prompt_builder::{build_clean_prompt, build_organize_prompt};
use super::provider::{DEFAULT_TIMEOUT, MAX_TOKENS_CATEGORIZE, MAX_TOKENS_CLEAN, TabProvider};
use super::schema_validator::{
    CLEAN_PROPOSAL_JSON_SCHEMA, GROUPING_RESULT_JSON_SCHEMA, ResponseSchemaValidator,
};

const LABEL: &str = "OpenAI";
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub(crate) const DEFAULT_MODELS: &[&str] = &["gpt-4o-mini", "gpt-4o", "gpt-4.1-mini"];
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Adapter for the OpenAI chat-completions API with schema-pinned output.
pub struct OpenAiProvider {
    chat: ChatCompletionsClient,
    validator: ResponseSchemaValidator,
}

impl OpenAiProvider {
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
        Ok(Self {
            chat: ChatCompletionsClient::new(LABEL, api_key, model, base_url, timeout)?,
            validator: ResponseSchemaValidator::new()?,
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.chat.set_retry(retry);
        self
    }

    pub(crate) fn schema() -> ConfigSchema {
        ConfigSchema::new(vec![
            ConfigField::password("api_key", "OpenAI API key", "sk-..."),
            ConfigField::select("model", "Model", DEFAULT_MODELS, DEFAULT_MODEL),
        ])
    }
}

#[async_trait]
impl TabProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
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
        let text = self
            .chat
            .complete(
                &prompt,
                MAX_TOKENS_CATEGORIZE,
                "grouping_result",
                GROUPING_RESULT_JSON_SCHEMA,
            )
            .await?;
        self.validator.grouping_from_text(&text)
    }

    async fn clean_tabs(
        &self,
        tabs: &[TabRecord],
        guidance: &str,
    ) -> Result<CleanResult, OrganizerError> {
        let prompt = build_clean_prompt(tabs, guidance)?;
        let text = self
            .chat
            .complete(
                &prompt,
                MAX_TOKENS_CLEAN,
                "clean_proposal",
                CLEAN_PROPOSAL_JSON_SCHEMA,
            )
            .await?;
        let proposal = self.validator.clean_from_text(&text)?;
        Ok(CleanResult::resolve(proposal, tabs))
    }

    async fn test_connection(&self) -> bool {
        match self.chat.probe().await {
            Ok(()) => true,
            Err(error) => {
                log::debug!("OpenAI connection test failed: {error}");
                false
            }
        }
    }
}
