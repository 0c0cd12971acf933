use thiserror::Error;

const MAX_EXCERPT_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    UserActionRequired,
    TemporaryFailure,
    InternalFailure,
}

/// Failure taxonomy shared by every provider adapter and the registry.
///
/// Backend detail is never discarded: transport failures carry the backend's
/// own message and malformed responses carry a bounded excerpt of the raw
/// payload for diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrganizerError {
    #[error("configuration error: {message}")]
    Configuration { message: String },
    #[error("unknown provider type '{provider_id}'")]
    UnknownProvider { provider_id: String },
    #[error("provider authentication failed: {detail}")]
    Auth { detail: String },
    #[error("provider rate limit reached: {detail}")]
    RateLimited { detail: String },
    #[error("provider request timed out: {detail}")]
    Timeout { detail: String },
    #[error("provider transport failed: {message}")]
    Transport { message: String },
    #[error("provider response failed validation: {message}; response excerpt: {excerpt}")]
    MalformedResponse { message: String, excerpt: String },
    #[error("provider returned an empty response")]
    EmptyResponse,
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl OrganizerError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn unknown_provider(provider_id: impl Into<String>) -> Self {
        Self::UnknownProvider {
            provider_id: provider_id.into(),
        }
    }

    /// Backend-failure constructors keep the backend's own error text, bounded
    /// the same way response excerpts are.
    pub fn auth(detail: impl Into<String>) -> Self {
        Self::Auth {
            detail: excerpt_of(&detail.into()),
        }
    }

    pub fn rate_limited(detail: impl Into<String>) -> Self {
        Self::RateLimited {
            detail: excerpt_of(&detail.into()),
        }
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::Timeout {
            detail: excerpt_of(&detail.into()),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Builds a validation failure that keeps a bounded, newline-compacted
    /// excerpt of the raw response text.
    pub fn malformed(message: impl Into<String>, raw_response: &str) -> Self {
        Self::MalformedResponse {
            message: message.into(),
            excerpt: excerpt_of(raw_response),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } | Self::UnknownProvider { .. } | Self::Auth { .. } => {
                ErrorCategory::UserActionRequired
            }
            Self::RateLimited { .. } | Self::Timeout { .. } | Self::Transport { .. } => {
                ErrorCategory::TemporaryFailure
            }
            Self::MalformedResponse { .. } | Self::EmptyResponse | Self::Internal { .. } => {
                ErrorCategory::InternalFailure
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Timeout { .. } | Self::Transport { .. }
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration { message } => {
                format!("Please review the provider configuration: {message}")
            }
            Self::UnknownProvider { provider_id } => {
                format!("The selected provider '{provider_id}' is not available.")
            }
            Self::Auth { detail } => {
                format!(
                    "Authentication failed: {detail}. Check your provider API key and \
                     configuration."
                )
            }
            Self::RateLimited { detail } => {
                format!("The provider is rate limiting requests ({detail}). Please retry in a moment.")
            }
            Self::Timeout { detail } => {
                format!("The provider did not respond in time ({detail}). Please retry.")
            }
            Self::Transport { message } => {
                format!("Could not reach the provider service: {message}")
            }
            Self::MalformedResponse { message, excerpt } => {
                format!("The provider returned an unusable response: {message} ({excerpt})")
            }
            Self::EmptyResponse => {
                "The provider returned an empty response. The tab list may exceed the model's \
                 context window; try organizing fewer tabs."
                    .to_string()
            }
            Self::Internal { message } => {
                format!("An internal error occurred: {message}")
            }
        }
    }
}

fn excerpt_of(raw: &str) -> String {
    let compact = raw.trim().replace('\n', " ");
    compact.chars().take(MAX_EXCERPT_LEN).collect()
}
