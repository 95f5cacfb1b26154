//! The three validation probes and the sequence that runs them.
//!
//! Each probe turns its call into a `ProbeOutcome`; nothing a probe hits stops the
//! sequence, so every run attempts models, plain chat, then tool chat.

use gp_llm::{
    ChatCompletion, ChatMessage, ChatOptions, LlmClient, LlmError, ModelInfo, ToolDefinition,
};
use serde_json::json;

pub const CHAT_PROMPT: &str = "Say 'test successful' if you can read this";
pub const TOOL_PROMPT: &str = "I need to book an appointment for tomorrow at 2pm";

const CHAT_OPTIONS: ChatOptions = ChatOptions {
    temperature: 0.7,
    max_tokens: 50,
};
const TOOL_CHAT_OPTIONS: ChatOptions = ChatOptions {
    temperature: 0.7,
    max_tokens: 500,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome<T> {
    Passed(T),
    /// Non-200 response; `body` is the raw text.
    EndpointError { status: u16, body: String },
    /// No usable response: connect/TLS/timeout failures, undecodable bodies.
    /// `status` is set when a response arrived but its body could not be decoded.
    TransportFault { status: Option<u16>, cause: String },
}

impl<T> ProbeOutcome<T> {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed(_))
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Passed(_) => "passed",
            Self::EndpointError { .. } => "endpoint_error",
            Self::TransportFault { .. } => "transport_fault",
        }
    }
}

impl<T> From<gp_llm::Result<T>> for ProbeOutcome<T> {
    fn from(result: gp_llm::Result<T>) -> Self {
        match result {
            Ok(v) => Self::Passed(v),
            Err(LlmError::Status { status, body }) => Self::EndpointError { status, body },
            Err(e) => Self::TransportFault {
                status: e.status(),
                cause: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub model: String,
    pub models: ProbeOutcome<Vec<ModelInfo>>,
    pub chat: ProbeOutcome<ChatCompletion>,
    pub tool_chat: ProbeOutcome<serde_json::Value>,
}

impl ValidationReport {
    pub fn passed_count(&self) -> usize {
        [
            self.models.is_passed(),
            self.chat.is_passed(),
            self.tool_chat.is_passed(),
        ]
        .into_iter()
        .filter(|p| *p)
        .count()
    }

    pub const PROBE_COUNT: usize = 3;
}

pub struct Validator {
    client: LlmClient,
}

impl Validator {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(level = "info", skip_all, fields(base_url = %self.client.base_url()))]
    pub async fn run(&self) -> ValidationReport {
        let models = self.probe_models().await;
        let chat = self.probe_chat().await;
        let tool_chat = self.probe_tool_chat().await;
        ValidationReport {
            model: self.client.model().to_string(),
            models,
            chat,
            tool_chat,
        }
    }

    #[tracing::instrument(level = "info", skip_all)]
    pub async fn probe_models(&self) -> ProbeOutcome<Vec<ModelInfo>> {
        let outcome = ProbeOutcome::from(self.client.list_models().await);
        tracing::info!(probe = "models", outcome = outcome.label(), "probe finished");
        outcome
    }

    #[tracing::instrument(level = "info", skip_all)]
    pub async fn probe_chat(&self) -> ProbeOutcome<ChatCompletion> {
        let messages = [ChatMessage::user(CHAT_PROMPT)];
        let outcome = ProbeOutcome::from(self.client.chat(&messages, &[], CHAT_OPTIONS).await);
        tracing::info!(probe = "chat", outcome = outcome.label(), "probe finished");
        outcome
    }

    #[tracing::instrument(level = "info", skip_all)]
    pub async fn probe_tool_chat(&self) -> ProbeOutcome<serde_json::Value> {
        let result = match booking_tool() {
            Ok(tool) => {
                let messages = [ChatMessage::user(TOOL_PROMPT)];
                self.client
                    .chat_raw(&messages, &[tool], TOOL_CHAT_OPTIONS)
                    .await
            }
            Err(e) => Err(e),
        };
        let outcome = ProbeOutcome::from(result);
        tracing::info!(probe = "tool_chat", outcome = outcome.label(), "probe finished");
        outcome
    }
}

/// The single function offered to the model in the tool probe.
pub fn booking_tool() -> gp_llm::Result<ToolDefinition> {
    ToolDefinition::validated(
        "trigger_automation",
        "Trigger an n8n automation workflow",
        json!({
            "type": "object",
            "properties": {
                "action": {"type": "string"},
                "payload": {"type": "object"}
            },
            "required": ["action", "payload"]
        }),
    )
}
