//! End-to-end adapter tests against a local mock HTTP server: request wiring,
//! response extraction and validation, retry bounds, and connection probes.

use std::io::Write;
use std::time::Duration;

use mockito::Matcher;
use tabherd::domain::{GroupColor, OrganizerError, TabRecord, UNGROUPED_GROUP_ID};
use tabherd::llm::{
    BedrockProvider, CerebrasProvider, ClaudeProvider, GeminiProvider, OpenAiProvider, RetryPolicy,
    TabProvider,
};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(2),
    }
}

fn tab(index: usize, title: &str, url: &str) -> TabRecord {
    TabRecord {
        id: 100 + index as i64,
        index,
        title: title.to_string(),
        url: url.to_string(),
        window_id: 1,
        group_id: UNGROUPED_GROUP_ID,
        pinned: false,
        active: index == 0,
    }
}

fn sample_tabs() -> Vec<TabRecord> {
    vec![
        tab(0, "Chase Online Banking", "https://chase.com/login"),
        tab(1, "Weather Forecast", "https://weather.example/today"),
    ]
}

fn claude(server: &mockito::Server) -> ClaudeProvider {
    ClaudeProvider::with_config("sk-ant-test", "claude-sonnet-4-5", server.url(), TEST_TIMEOUT)
        .expect("provider should build")
        .with_retry_policy(fast_retry())
}

#[tokio::test]
async fn claude_categorize_extracts_fenced_json_from_prose() {
    let mut server = mockito::Server::new_async().await;
    let reply = "Here are your groups:\n```json\n{\"groups\":[{\"name\":\"Finance\",\
                 \"color\":\"green\",\"tabIndices\":[0]}],\"ungrouped\":[1]}\n```";
    let body = serde_json::json!({
        "content": [{"type": "text", "text": reply}]
    });
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "sk-ant-test")
        .match_header("anthropic-version", "2023-06-01")
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let result = claude(&server)
        .categorize(&sample_tabs(), None)
        .await
        .expect("categorize should succeed");

    mock.assert_async().await;
    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[0].name, "Finance");
    assert_eq!(result.groups[0].color, GroupColor::Green);
    assert_eq!(result.groups[0].tab_indices, vec![0]);
    assert_eq!(result.ungrouped, vec![1]);
}

#[tokio::test]
async fn claude_categorize_skips_the_network_for_an_empty_snapshot() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .expect(0)
        .create_async()
        .await;

    let result = claude(&server)
        .categorize(&[], None)
        .await
        .expect("empty snapshot should short-circuit");

    mock.assert_async().await;
    assert!(result.groups.is_empty());
    assert!(result.ungrouped.is_empty());
}

#[tokio::test]
async fn claude_rejects_schema_violations_with_a_response_excerpt() {
    let mut server = mockito::Server::new_async().await;
    let body = serde_json::json!({
        "content": [{
            "type": "text",
            "text": r#"{"groups":[{"name":"Misc","color":"chartreuse","tabIndices":[0]}],"ungrouped":[]}"#
        }]
    });
    server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let error = claude(&server)
        .categorize(&sample_tabs(), None)
        .await
        .expect_err("invalid color should fail validation");

    assert!(matches!(
        error,
        OrganizerError::MalformedResponse { ref excerpt, .. } if excerpt.contains("chartreuse")
    ));
}

#[tokio::test]
async fn claude_retries_transient_failures_a_bounded_number_of_times() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .with_status(503)
        .with_body(r#"{"error":{"type":"api_error","message":"overloaded"}}"#)
        .expect(3)
        .create_async()
        .await;

    let error = claude(&server)
        .categorize(&sample_tabs(), None)
        .await
        .expect_err("persistent 503 should fail");

    mock.assert_async().await;
    assert!(matches!(error, OrganizerError::Transport { .. }));
}

#[tokio::test]
async fn claude_auth_failures_skip_retries_and_keep_the_backend_message() {
    let mut server = mockito::Server::new_async().await;
    let backend_message = "API key sk-ant-test was revoked on 2026-08-01";
    let mock = server
        .mock("POST", "/v1/messages")
        .with_status(401)
        .with_body(format!(
            r#"{{"error":{{"type":"authentication_error","message":"{backend_message}"}}}}"#
        ))
        .expect(1)
        .create_async()
        .await;

    let error = claude(&server)
        .categorize(&sample_tabs(), None)
        .await
        .expect_err("401 should fail");

    mock.assert_async().await;
    assert!(matches!(
        error,
        OrganizerError::Auth { ref detail } if detail == backend_message
    ));
    assert!(error.to_string().contains(backend_message));
    assert!(error.user_message().contains(backend_message));
}

#[tokio::test]
async fn claude_test_connection_reports_failure_instead_of_erroring() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/messages")
        .with_status(401)
        .with_body(r#"{"error":{"type":"authentication_error","message":"invalid x-api-key"}}"#)
        .create_async()
        .await;

    assert!(!claude(&server).test_connection().await);
}

#[tokio::test]
async fn claude_test_connection_succeeds_against_a_healthy_endpoint() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body(r#"{"content":[{"type":"text","text":"pong"}]}"#)
        .create_async()
        .await;

    assert!(claude(&server).test_connection().await);
}

#[tokio::test]
async fn openai_clean_resolves_close_indices_to_tab_details() {
    let mut server = mockito::Server::new_async().await;
    let body = serde_json::json!({
        "choices": [{
            "finish_reason": "stop",
            "message": {
                "role": "assistant",
                "content": r#"{"tabsToClose":[1],"reasoning":"The forecast tab is stale."}"#
            }
        }]
    });
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "gpt-4o-mini",
            "response_format": {
                "type": "json_schema",
                "json_schema": {"name": "clean_proposal"}
            }
        })))
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let provider =
        OpenAiProvider::with_config("sk-test", "gpt-4o-mini", server.url(), TEST_TIMEOUT)
            .expect("provider should build")
            .with_retry_policy(fast_retry());

    let result = provider
        .clean_tabs(&sample_tabs(), "close anything stale")
        .await
        .expect("clean should succeed");

    mock.assert_async().await;
    assert_eq!(result.tabs_to_close, vec![1]);
    assert_eq!(result.reasoning, "The forecast tab is stale.");
    assert_eq!(result.tab_details.len(), 1);
    assert_eq!(result.tab_details[0].title, "Weather Forecast");
    assert_eq!(result.tab_details[0].url, "https://weather.example/today");
}

#[tokio::test]
async fn openai_clean_rejects_blank_guidance_before_any_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let provider =
        OpenAiProvider::with_config("sk-test", "gpt-4o-mini", server.url(), TEST_TIMEOUT)
            .expect("provider should build");

    let error = provider
        .clean_tabs(&sample_tabs(), "   ")
        .await
        .expect_err("blank guidance should fail");

    mock.assert_async().await;
    assert!(matches!(error, OrganizerError::Configuration { .. }));
}

#[tokio::test]
async fn gemini_categorize_extracts_json_embedded_in_prose() {
    let mut server = mockito::Server::new_async().await;
    let reply = "Sure! {\"groups\":[{\"name\":\"Finance\",\"color\":\"green\",\
                 \"tabIndices\":[0]}],\"ungrouped\":[1]} Let me know if this helps.";
    let body = serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": reply}]}}]
    });
    let mock = server
        .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
        .match_query(Matcher::UrlEncoded("key".to_string(), "AIza-test".to_string()))
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let provider =
        GeminiProvider::with_config("AIza-test", "gemini-2.0-flash", server.url(), TEST_TIMEOUT)
            .expect("provider should build")
            .with_retry_policy(fast_retry());

    let result = provider
        .categorize(&sample_tabs(), Some("group by purpose"))
        .await
        .expect("categorize should succeed");

    mock.assert_async().await;
    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[0].name, "Finance");
    assert_eq!(result.ungrouped, vec![1]);
}

#[tokio::test]
async fn gemini_maps_quota_exhaustion_to_rate_limiting() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
        .match_query(Matcher::Any)
        .with_status(429)
        .with_body(r#"{"error":{"code":429,"message":"quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#)
        .create_async()
        .await;

    let provider =
        GeminiProvider::with_config("AIza-test", "gemini-2.0-flash", server.url(), TEST_TIMEOUT)
            .expect("provider should build")
            .with_retry_policy(RetryPolicy {
                max_attempts: 1,
                ..fast_retry()
            });

    let error = provider
        .categorize(&sample_tabs(), None)
        .await
        .expect_err("429 should fail");

    assert!(matches!(
        error,
        OrganizerError::RateLimited { detail } if detail == "quota exceeded"
    ));
}

#[tokio::test]
async fn bedrock_categorize_signs_and_invokes_the_model_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let body = serde_json::json!({
        "content": [{
            "type": "text",
            "text": r#"{"groups":[{"name":"Finance","color":"green","tabIndices":[0]}],"ungrouped":[1]}"#
        }]
    });
    let mock = server
        .mock("POST", Matcher::Regex(r"^/model/.+/invoke$".to_string()))
        .match_header("x-amz-date", Matcher::Regex(r"^\d{8}T\d{6}Z$".to_string()))
        .match_header(
            "authorization",
            Matcher::Regex(concat!(
                r"^AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/\d{8}/us-east-1/bedrock/aws4_request, ",
                r"SignedHeaders=content-type;host;x-amz-date, Signature=[0-9a-f]{64}$"
            )
            .to_string()),
        )
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let provider = BedrockProvider::with_config(
        "AKIDEXAMPLE",
        "secret",
        "us-east-1",
        "anthropic.claude-3-5-haiku-20241022-v1:0",
        server.url(),
        TEST_TIMEOUT,
    )
    .expect("provider should build")
    .with_retry_policy(fast_retry());

    let result = provider
        .categorize(&sample_tabs(), None)
        .await
        .expect("categorize should succeed");

    mock.assert_async().await;
    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[0].color, GroupColor::Green);
    assert_eq!(result.ungrouped, vec![1]);
}

#[tokio::test]
async fn bedrock_maps_throttling_to_rate_limiting() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", Matcher::Regex(r"^/model/.+/invoke$".to_string()))
        .with_status(429)
        .with_body(r#"{"message":"Too many requests, please wait before trying again."}"#)
        .create_async()
        .await;

    let provider = BedrockProvider::with_config(
        "AKIDEXAMPLE",
        "secret",
        "us-east-1",
        "anthropic.claude-3-5-haiku-20241022-v1:0",
        server.url(),
        TEST_TIMEOUT,
    )
    .expect("provider should build")
    .with_retry_policy(RetryPolicy {
        max_attempts: 1,
        ..fast_retry()
    });

    let error = provider
        .categorize(&sample_tabs(), None)
        .await
        .expect_err("429 should fail");

    assert!(matches!(
        error,
        OrganizerError::RateLimited { detail }
        if detail == "Too many requests, please wait before trying again."
    ));
}

#[tokio::test]
async fn cerebras_categorize_wires_the_chat_completions_dialect() {
    let mut server = mockito::Server::new_async().await;
    let body = serde_json::json!({
        "choices": [{
            "finish_reason": "stop",
            "message": {
                "role": "assistant",
                "content": r#"{"groups":[{"name":"Finance","color":"green","tabIndices":[0]}],"ungrouped":[1]}"#
            }
        }]
    });
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer csk-test")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "llama-3.3-70b",
            "response_format": {
                "type": "json_schema",
                "json_schema": {"name": "grouping_result"}
            }
        })))
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let provider =
        CerebrasProvider::with_config("csk-test", "llama-3.3-70b", server.url(), TEST_TIMEOUT)
            .expect("provider should build")
            .with_retry_policy(fast_retry());

    let result = provider
        .categorize(&sample_tabs(), None)
        .await
        .expect("categorize should succeed");

    mock.assert_async().await;
    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[0].name, "Finance");
    assert_eq!(result.ungrouped, vec![1]);
}

#[tokio::test]
async fn test_connection_reports_false_on_a_stalled_endpoint() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_chunked_body(|writer| {
            std::thread::sleep(Duration::from_millis(500));
            writer.write_all(br#"{"content":[{"type":"text","text":"pong"}]}"#)
        })
        .create_async()
        .await;

    let provider = ClaudeProvider::with_config(
        "sk-ant-test",
        "claude-sonnet-4-5",
        server.url(),
        Duration::from_millis(100),
    )
    .expect("provider should build");

    assert!(!provider.test_connection().await);
}

#[tokio::test]
async fn test_connection_reports_false_when_the_endpoint_is_unreachable() {
    // Bind to grab a free port, then drop the listener so nothing answers.
    let url = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let address = listener.local_addr().expect("bound socket has an address");
        format!("http://{address}")
    };

    let provider = ClaudeProvider::with_config(
        "sk-ant-test",
        "claude-sonnet-4-5",
        url,
        Duration::from_millis(250),
    )
    .expect("provider should build");

    assert!(!provider.test_connection().await);
}
