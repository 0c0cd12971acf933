use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};

use crate::domain::OrganizerError;

/// Bounded retry for transient transport failures, shared by every provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
        }
    }
}

/// Sends `request`, retrying retryable failures per `policy`, and returns the
/// response body on success. `map_status` translates non-2xx responses into
/// the error taxonomy; transport-level failures are mapped uniformly.
pub(crate) async fn send_with_retry<M>(
    request: RequestBuilder,
    label: &str,
    policy: &RetryPolicy,
    map_status: M,
) -> Result<String, OrganizerError>
where
    M: Fn(StatusCode, &str) -> OrganizerError,
{
    let mut attempt = 0;
    let mut backoff = policy.initial_backoff;

    loop {
        attempt += 1;
        let prepared = request.try_clone().ok_or_else(|| {
            OrganizerError::internal(format!("{label} request body is not cloneable"))
        })?;

        match send_once(prepared, label, &map_status).await {
            Ok(body) => return Ok(body),
            Err(error) if error.is_retryable() && attempt < policy.max_attempts => {
                log::warn!(
                    "{label} request failed on attempt {attempt}/{max} ({error}); retrying in {backoff:?}",
                    max = policy.max_attempts,
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(policy.max_backoff);
            }
            Err(error) => return Err(error),
        }
    }
}

/// Single-shot variant used by `test_connection`, which must not burn retry
/// budget on a credential probe.
pub(crate) async fn send_once<M>(
    request: RequestBuilder,
    label: &str,
    map_status: M,
) -> Result<String, OrganizerError>
where
    M: Fn(StatusCode, &str) -> OrganizerError,
{
    let response = request
        .send()
        .await
        .map_err(|error| map_transport_error(label, error))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|error| map_transport_error(label, error))?;

    if !status.is_success() {
        return Err(map_status(status, &body));
    }
    Ok(body)
}

pub(crate) fn map_transport_error(label: &str, error: reqwest::Error) -> OrganizerError {
    if error.is_timeout() {
        return OrganizerError::timeout(format!("{label} request timed out: {error}"));
    }
    OrganizerError::transport(format!("{label} transport error: {error}"))
}
