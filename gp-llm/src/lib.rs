//! Minimal client for OpenAI-compatible model hosts (Groq by default).
//!
//! Pure HTTP: model listing and non-streaming chat completions with optional tools.

mod client;
mod error;
mod openai;
mod types;

pub use client::{DEFAULT_BASE_URL, LlmClient, validate_tool_name};
pub use error::{LlmError, Result};
pub use types::{ChatCompletion, ChatMessage, ChatOptions, ModelInfo, ToolDefinition, Usage};
