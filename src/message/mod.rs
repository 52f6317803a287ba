//! Conversation messages and the append-only log that records them.
//!
//! Every turn of a team session contributes messages to a [`MessageLog`]:
//! the user's task, each agent's final answer, and one tool-result message
//! per tool call resolved along the way.

mod log;

pub use log::{MessageLog, Transcript};

use crate::tool::ToolError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Identifier of an agent participating in a conversation.
pub type AgentId = String;

/// Who produced a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Tool,
    Agent(AgentId),
}

impl Speaker {
    /// The agent id, if this speaker is an agent.
    pub fn agent_id(&self) -> Option<&str> {
        match self {
            Speaker::Agent(id) => Some(id),
            _ => None,
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Speaker::User => write!(f, "user"),
            Speaker::Tool => write!(f, "tool"),
            Speaker::Agent(id) => write!(f, "{}", id),
        }
    }
}

/// Conversational role of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    ToolResult,
}

/// Message payload: free text, a structured value, or a failed tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Content {
    Text(String),
    Structured(Value),
    ToolError(ToolError),
}

impl Content {
    /// Render the content as plain text (structured values as compact JSON).
    pub fn as_text(&self) -> String {
        match self {
            Content::Text(text) => text.clone(),
            Content::Structured(Value::String(s)) => s.clone(),
            Content::Structured(value) => value.to_string(),
            Content::ToolError(err) => err.to_string(),
        }
    }

    /// Whether this content records a failed tool call.
    pub fn is_tool_error(&self) -> bool {
        matches!(self, Content::ToolError(_))
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

/// A tool invocation requested by an agent's completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call identifier, used to pair a request with its result.
    pub id: String,
    /// Name of the requested tool.
    pub name: String,
    /// Arguments as produced by the model.
    pub arguments: Value,
}

impl ToolCall {
    /// Create a tool call with a freshly generated id.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: format!("call_{}", Uuid::new_v4().simple()),
            name: name.into(),
            arguments,
        }
    }

    /// Create a tool call with a provider-assigned id.
    pub fn with_id(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

impl std::fmt::Display for ToolCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

/// A single entry of the conversation. Immutable once appended to a log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub speaker: Speaker,
    pub role: Role,
    pub content: Content,
    /// The call this message answers (tool results only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
    /// Agent whose turn requested the tool call (tool results only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<AgentId>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(speaker: Speaker, role: Role, content: Content) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker,
            role,
            content,
            tool_call: None,
            requested_by: None,
            created_at: Utc::now(),
        }
    }

    /// A message from the user (typically the task that starts a run).
    pub fn user(content: impl Into<Content>) -> Self {
        Self::new(Speaker::User, Role::User, content.into())
    }

    /// An agent's final answer for its turn.
    pub fn assistant(agent: impl Into<AgentId>, content: impl Into<Content>) -> Self {
        Self::new(Speaker::Agent(agent.into()), Role::Assistant, content.into())
    }

    /// The outcome of resolving `call` on behalf of `agent`.
    pub fn tool_result(
        agent: impl Into<AgentId>,
        call: ToolCall,
        outcome: std::result::Result<Value, ToolError>,
    ) -> Self {
        let content = match outcome {
            Ok(value) => Content::Structured(value),
            Err(err) => Content::ToolError(err),
        };
        let mut message = Self::new(Speaker::Tool, Role::ToolResult, content);
        message.tool_call = Some(call);
        message.requested_by = Some(agent.into());
        message
    }

    /// Text rendering of the content.
    pub fn text(&self) -> String {
        self.content.as_text()
    }

    /// Whether `agent` authored this message or requested the tool call it answers.
    pub fn belongs_to(&self, agent: &str) -> bool {
        self.speaker.agent_id() == Some(agent) || self.requested_by.as_deref() == Some(agent)
    }
}
