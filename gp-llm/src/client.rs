use crate::error::{LlmError, Result};
use crate::openai::{OpenAiChatRequest, OpenAiModelsResponse, decode_chat_completion};
use crate::types::{ChatCompletion, ChatMessage, ChatOptions, ModelInfo, ToolDefinition};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_TOOL_NAME_LEN: usize = 64;

#[derive(Clone)]
pub struct LlmClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl LlmClient {
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: build_http_client(DEFAULT_TIMEOUT),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_http_client(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// `GET {base}/models`.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let request = self
            .client
            .get(self.endpoint("/models"))
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json");
        let body = send(request).await?;
        let parsed: OpenAiModelsResponse = serde_json::from_str(&body).map_err(decode_error)?;
        let models: Vec<ModelInfo> = parsed.into();
        tracing::debug!(count = models.len(), "models listed");
        Ok(models)
    }

    /// `POST {base}/chat/completions`, decoded into the first choice.
    #[tracing::instrument(level = "info", skip_all, fields(model = %self.model))]
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        options: ChatOptions,
    ) -> Result<ChatCompletion> {
        let raw = self.chat_raw(messages, tools, options).await?;
        decode_chat_completion(raw).map_err(decode_error)
    }

    /// `POST {base}/chat/completions`, returning the parsed body without interpreting it.
    #[tracing::instrument(level = "info", skip_all, fields(model = %self.model))]
    pub async fn chat_raw(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        options: ChatOptions,
    ) -> Result<serde_json::Value> {
        for tool in tools {
            validate_tool_name(&tool.name)?;
        }
        let req = OpenAiChatRequest::new(&self.model, messages, tools, options);

        let request = self
            .client
            .post(self.endpoint("/chat/completions"))
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&req);
        let body = send(request).await?;
        serde_json::from_str(&body).map_err(decode_error)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(%e, "reqwest client build failed; falling back to default client");
            reqwest::Client::new()
        })
}

/// Sends the request and returns the body of a 200 response.
///
/// Any other status becomes `LlmError::Status` carrying the raw body.
async fn send(request: reqwest::RequestBuilder) -> Result<String> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    tracing::debug!(status = status.as_u16(), body_len = body.len(), "response received");
    if status != StatusCode::OK {
        return Err(LlmError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

/// Bodies are only decoded after `send` has seen a 200.
fn decode_error(e: impl std::fmt::Display) -> LlmError {
    LlmError::Decode {
        status: StatusCode::OK.as_u16(),
        reason: e.to_string(),
    }
}

/// Function names must match `^[a-zA-Z0-9_-]{1,64}$`.
pub fn validate_tool_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(LlmError::InvalidInput("tool name is empty".to_string()));
    }
    if name.len() > MAX_TOOL_NAME_LEN {
        return Err(LlmError::InvalidInput(format!(
            "tool name {name:?} exceeds {MAX_TOOL_NAME_LEN} characters"
        )));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(LlmError::InvalidInput(format!(
            "tool name {name:?} contains invalid character {bad:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use serde_json::{Value, json};

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "Bearer good-key")
    }

    async fn models(headers: HeaderMap) -> impl IntoResponse {
        if !authorized(&headers) {
            return (AxumStatus::UNAUTHORIZED, r#"{"error":"invalid_api_key"}"#).into_response();
        }
        Json(json!({"object": "list", "data": [{"id": "llama-3.1-70b-versatile", "owned_by": "Meta"}]}))
            .into_response()
    }

    async fn garbage() -> &'static str {
        "<html>gateway</html>"
    }

    async fn chat(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
        let content_type = headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Json(json!({
            "choices": [{"message": {"role": "assistant", "content": "test successful"}, "finish_reason": "stop"}],
            "echo": body,
            "content_type": content_type,
        }))
    }

    async fn spawn_server() -> String {
        let app = Router::new()
            .route("/v1/models", get(models))
            .route("/v1/chat/completions", post(chat))
            .route("/broken/models", get(garbage));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}/v1")
    }

    #[tokio::test]
    async fn list_models_returns_ids_on_200() {
        let base = spawn_server().await;
        let client = LlmClient::new("good-key", "m").with_base_url(&base);
        let models = client.list_models().await.expect("models");
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].id, "llama-3.1-70b-versatile");
    }

    #[tokio::test]
    async fn list_models_surfaces_status_and_raw_body() {
        let base = spawn_server().await;
        let client = LlmClient::new("bad-key", "m").with_base_url(&base);
        let err = client.list_models().await.expect_err("401");
        assert_eq!(err.status(), Some(401));
        match err {
            LlmError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, r#"{"error":"invalid_api_key"}"#);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn chat_sends_model_options_and_json_content_type() {
        let base = spawn_server().await;
        let client = LlmClient::new("good-key", "llama-3.1-70b-versatile")
            .with_base_url(&format!("{base}/"));
        let options = ChatOptions {
            temperature: 0.7,
            max_tokens: 50,
        };
        let out = client
            .chat(&[ChatMessage::user("ping")], &[], options)
            .await
            .expect("chat");
        assert_eq!(out.content, "test successful");
        assert_eq!(out.finish_reason, "stop");

        let raw = client
            .chat_raw(&[ChatMessage::user("ping")], &[], options)
            .await
            .expect("chat raw");
        assert_eq!(raw["echo"]["model"], "llama-3.1-70b-versatile");
        assert_eq!(raw["echo"]["messages"][0]["role"], "user");
        assert_eq!(raw["echo"]["max_tokens"], 50);
        assert!(
            raw["content_type"]
                .as_str()
                .is_some_and(|v| v.starts_with("application/json"))
        );
    }

    #[tokio::test]
    async fn chat_rejects_invalid_tool_name_before_sending() {
        let client = LlmClient::new("k", "m").with_base_url("http://127.0.0.1:9");
        let tool = ToolDefinition {
            name: "trigger.automation".to_string(),
            description: "d".to_string(),
            parameters: json!({}),
        };
        let err = client
            .chat_raw(&[ChatMessage::user("x")], &[tool], ChatOptions::default())
            .await
            .expect_err("invalid name");
        assert!(matches!(err, LlmError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let client = LlmClient::new("k", "m")
            .with_base_url(&format!("http://{addr}/v1"))
            .with_timeout(Duration::from_secs(5));
        let err = client.list_models().await.expect_err("refused");
        assert!(matches!(err, LlmError::Http(_)));
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn undecodable_200_body_keeps_its_status() {
        let base = spawn_server().await;
        let client =
            LlmClient::new("good-key", "m").with_base_url(&base.replace("/v1", "/broken"));
        let err = client.list_models().await.expect_err("not json");
        assert!(matches!(err, LlmError::Decode { status: 200, .. }));
        assert_eq!(err.status(), Some(200));
    }

    #[test]
    fn tool_name_validation() {
        assert!(validate_tool_name("trigger_automation").is_ok());
        assert!(validate_tool_name("a-b_C9").is_ok());
        assert!(validate_tool_name("").is_err());
        assert!(validate_tool_name("has space").is_err());
        assert!(validate_tool_name(&"x".repeat(65)).is_err());
    }

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let client = LlmClient::new("k", "m").with_base_url("http://host/v1/");
        assert_eq!(client.endpoint("/models"), "http://host/v1/models");
        assert_eq!(LlmClient::new("k", "m").base_url(), DEFAULT_BASE_URL);
    }
}
