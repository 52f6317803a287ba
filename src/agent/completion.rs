//! The completion capability an agent is bound to.

use crate::error::Result;
use crate::message::{Message, ToolCall};
use crate::schema::OutputSchema;
use crate::tool::ToolSpec;
use async_trait::async_trait;

/// Everything a model needs to produce the next step of an agent's turn.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    /// Id of the agent whose turn this is; decides whose messages are "own".
    pub agent: &'a str,
    pub instructions: &'a str,
    /// The full session log, oldest first.
    pub messages: &'a [Message],
    pub tools: Vec<&'a ToolSpec>,
    pub output_schema: Option<&'a OutputSchema>,
}

/// What the model decided to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The agent is done with its turn.
    FinalAnswer { content: String },
    /// The agent wants these tools run, in order, before continuing.
    ToolRequests(Vec<ToolCall>),
}

impl Completion {
    pub fn final_answer(content: impl Into<String>) -> Self {
        Completion::FinalAnswer {
            content: content.into(),
        }
    }

    pub fn tool_request(call: ToolCall) -> Self {
        Completion::ToolRequests(vec![call])
    }
}

/// Opaque, possibly slow and possibly failing inference endpoint.
///
/// Implementations are not expected to retry; retry policy belongs to the
/// caller of a team run.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion>;

    /// Model name for logging.
    fn name(&self) -> &str;
}
