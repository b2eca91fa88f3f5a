use std::time;

use async_trait::async_trait;
use reqwest::header;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::OpenAiConfig;
use crate::error::FetchError;

/// Anything that can produce the payload of an event.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch(&self) -> Result<Value, FetchError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Body of a chat completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatCompletionRequest {
    /// A request carrying a single prompt message.
    pub fn new(model: &str, role: &str, prompt: &str) -> Self {
        Self {
            model: model.to_owned(),
            messages: vec![ChatMessage {
                role: role.to_owned(),
                content: prompt.to_owned(),
            }],
        }
    }
}

/// Requests one chat completion per `fetch` call. Everything about the request is fixed at
/// construction time.
pub struct CompletionFetcher {
    client: reqwest::Client,
    url: String,
    api_key: String,
    request: ChatCompletionRequest,
}

impl CompletionFetcher {
    pub fn new(
        url: &str,
        api_key: &str,
        request: ChatCompletionRequest,
        timeout: Option<time::Duration>,
    ) -> Result<Self, FetchError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent("gpt-ingest");
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(FetchError::ClientError)?;

        Ok(Self {
            client,
            url: url.to_owned(),
            api_key: api_key.to_owned(),
            request,
        })
    }

    pub fn from_config(config: &OpenAiConfig) -> Result<Self, FetchError> {
        let request = ChatCompletionRequest::new(
            config.model.as_str(),
            config.prompt_role.as_str(),
            config.prompt.as_str(),
        );

        Self::new(
            config.api_url.as_str(),
            config.api_key.as_str(),
            request,
            config.request_timeout.map(|timeout| timeout.0),
        )
    }

    /// Send the chat completion request and return the decoded response body as is.
    ///
    /// There are no retries: any transport failure, non-success status or undecodable body is
    /// returned as a `FetchError`.
    pub async fn fetch(&self) -> Result<Value, FetchError> {
        debug!(url = %self.url, model = %self.request.model, "requesting chat completion");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&self.request)
            .send()
            .await
            .map_err(FetchError::RequestError)?;

        let status = response.status();
        debug!(%status, "received chat completion response");

        let response = response
            .error_for_status()
            .map_err(|error| FetchError::StatusError { status, error })?;

        let body = response.bytes().await.map_err(FetchError::RequestError)?;

        serde_json::from_slice(&body).map_err(FetchError::ParseError)
    }
}

#[async_trait]
impl EventSource for CompletionFetcher {
    async fn fetch(&self) -> Result<Value, FetchError> {
        CompletionFetcher::fetch(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use httpmock::{Method, MockServer};
    use serde_json::json;

    const COMPLETIONS_PATH: &str = "/v1/chat/completions";

    fn fetcher_for(server: &MockServer, timeout: Option<time::Duration>) -> CompletionFetcher {
        CompletionFetcher::new(
            &server.url(COMPLETIONS_PATH),
            "sk-test",
            ChatCompletionRequest::new("gpt-4", "system", "Your prompt here"),
            timeout,
        )
        .expect("failed to build fetcher")
    }

    #[test]
    fn test_request_serializes_to_chat_completion_body() {
        let request = ChatCompletionRequest::new("gpt-4", "system", "Your prompt here");

        assert_json_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "gpt-4",
                "messages": [{"role": "system", "content": "Your prompt here"}],
            })
        );
    }

    #[tokio::test]
    async fn test_fetch_returns_response_body_unmodified() {
        let server = MockServer::start_async().await;
        let payload = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "hello"}}],
        });

        let mock = server
            .mock_async(|when, then| {
                when.method(Method::POST)
                    .path(COMPLETIONS_PATH)
                    .header("authorization", "Bearer sk-test")
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "model": "gpt-4",
                        "messages": [{"role": "system", "content": "Your prompt here"}],
                    }));
                then.status(200).json_body(payload.clone());
            })
            .await;

        let response = fetcher_for(&server, None)
            .fetch()
            .await
            .expect("fetch failed");

        assert_json_eq!(response, payload);
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_fetch_fails_on_error_status() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(Method::POST).path(COMPLETIONS_PATH);
                then.status(401)
                    .json_body(json!({"error": {"message": "Incorrect API key provided"}}));
            })
            .await;

        let result = fetcher_for(&server, None).fetch().await;

        match result {
            Err(FetchError::StatusError { status, .. }) => {
                assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED)
            }
            other => panic!("expected a status error, got {:?}", other),
        }
        // No retries.
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_fetch_fails_on_malformed_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(Method::POST).path(COMPLETIONS_PATH);
                then.status(200).body("{\"choices\": [");
            })
            .await;

        let result = fetcher_for(&server, None).fetch().await;

        assert!(matches!(result, Err(FetchError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_fetch_fails_when_server_is_unreachable() {
        let fetcher = CompletionFetcher::new(
            "http://127.0.0.1:1/v1/chat/completions",
            "sk-test",
            ChatCompletionRequest::new("gpt-4", "system", "Your prompt here"),
            None,
        )
        .unwrap();

        let result = fetcher.fetch().await;

        assert!(matches!(result, Err(FetchError::RequestError(_))));
    }

    #[tokio::test]
    async fn test_fetch_honours_configured_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(Method::POST).path(COMPLETIONS_PATH);
                then.status(200)
                    .delay(time::Duration::from_millis(500))
                    .json_body(json!({}));
            })
            .await;

        let result = fetcher_for(&server, Some(time::Duration::from_millis(50)))
            .fetch()
            .await;

        match result {
            Err(FetchError::RequestError(error)) => assert!(error.is_timeout()),
            other => panic!("expected a timeout, got {:?}", other),
        }
    }
}
