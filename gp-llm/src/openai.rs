use crate::error::{LlmError, Result};
use crate::types::{ChatCompletion, ChatMessage, ChatOptions, ModelInfo, ToolDefinition, Usage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAiTool>,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiChatRequest {
    pub(crate) fn new(
        model: &str,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        options: ChatOptions,
    ) -> Self {
        Self {
            model: model.to_string(),
            messages: messages.iter().map(to_openai_message).collect(),
            tools: tools.iter().map(to_openai_tool).collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAiTool {
    r#type: String,
    function: OpenAiToolFunction,
}

#[derive(Debug, Serialize)]
struct OpenAiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

fn to_openai_tool(t: &ToolDefinition) -> OpenAiTool {
    OpenAiTool {
        r#type: "function".to_string(),
        function: OpenAiToolFunction {
            name: t.name.clone(),
            description: t.description.clone(),
            parameters: t.parameters.clone(),
        },
    }
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

fn to_openai_message(m: &ChatMessage) -> OpenAiMessage {
    OpenAiMessage {
        role: "user".to_string(),
        content: m.content.clone(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiModelsResponse {
    #[serde(default)]
    data: Vec<ModelInfo>,
}

impl From<OpenAiModelsResponse> for Vec<ModelInfo> {
    fn from(v: OpenAiModelsResponse) -> Self {
        v.data
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

pub(crate) fn decode_chat_completion(raw: serde_json::Value) -> Result<ChatCompletion> {
    let parsed: OpenAiChatResponse = serde_json::from_value(raw)?;
    let choice = parsed.choices.into_iter().next().ok_or_else(|| {
        LlmError::ResponseFormat("chat response missing choices".to_string())
    })?;

    let usage = parsed.usage.map_or_else(Usage::default, |u| Usage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
    });

    Ok(ChatCompletion {
        content: choice.message.content.unwrap_or_default(),
        finish_reason: choice
            .finish_reason
            .unwrap_or_else(|| "unknown".to_string()),
        usage,
    })
}
