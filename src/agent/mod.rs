//! Agents: configured participants of a team conversation.
//!
//! An [`Agent`] is inert configuration (instructions, tools, output schema)
//! bound to a [`CompletionModel`]. The [`TurnExecutor`] runs one turn for an
//! agent, resolving any tool calls the model asks for along the way.

mod completion;
mod openai;
mod turn;

pub use completion::{Completion, CompletionModel, CompletionRequest};
pub use openai::OpenAIChatModel;
pub use turn::TurnExecutor;

use crate::error::{Result, RoundtableError};
use crate::message::AgentId;
use crate::schema::OutputSchema;
use crate::tool::{ToolRegistry, ToolSpec};
use std::sync::Arc;
use std::time::Duration;

/// Instructions used when none are configured.
pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful assistant.";

/// Default cap on tool round-trips within a single turn.
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 10;

/// A named participant. Immutable once built; share it with `Arc`.
pub struct Agent {
    id: AgentId,
    description: String,
    instructions: String,
    model: Arc<dyn CompletionModel>,
    tools: Arc<ToolRegistry>,
    output_schema: Option<OutputSchema>,
    max_tool_iterations: usize,
    completion_timeout: Option<Duration>,
}

impl Agent {
    /// Start building an agent bound to `model`.
    pub fn builder(id: impl Into<AgentId>, model: Arc<dyn CompletionModel>) -> AgentBuilder {
        AgentBuilder {
            id: id.into(),
            description: String::new(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            model,
            shared_tools: None,
            tools: Vec::new(),
            output_schema: None,
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
            completion_timeout: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn model(&self) -> &Arc<dyn CompletionModel> {
        &self.model
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn output_schema(&self) -> Option<&OutputSchema> {
        self.output_schema.as_ref()
    }

    pub fn max_tool_iterations(&self) -> usize {
        self.max_tool_iterations
    }

    pub fn completion_timeout(&self) -> Option<Duration> {
        self.completion_timeout
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("model", &self.model.name())
            .field("tools", &self.tools.names())
            .field("output_schema", &self.output_schema.as_ref().map(|s| s.name()))
            .field("max_tool_iterations", &self.max_tool_iterations)
            .finish()
    }
}

/// Builder for [`Agent`]. Validation happens in [`build`](Self::build).
pub struct AgentBuilder {
    id: AgentId,
    description: String,
    instructions: String,
    model: Arc<dyn CompletionModel>,
    shared_tools: Option<Arc<ToolRegistry>>,
    tools: Vec<ToolSpec>,
    output_schema: Option<OutputSchema>,
    max_tool_iterations: usize,
    completion_timeout: Option<Duration>,
}

impl AgentBuilder {
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn instructions(mut self, instructions: &str) -> Self {
        self.instructions = instructions.to_string();
        self
    }

    /// Use a registry shared with other agents.
    pub fn tools(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.shared_tools = Some(registry);
        self
    }

    /// Add a tool owned by this agent.
    pub fn tool(mut self, spec: ToolSpec) -> Self {
        self.tools.push(spec);
        self
    }

    pub fn output_schema(mut self, schema: OutputSchema) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub fn max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max;
        self
    }

    pub fn completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Agent> {
        if self.id.trim().is_empty() {
            return Err(RoundtableError::Configuration(
                "Agent id must not be empty".to_string(),
            ));
        }
        if self.max_tool_iterations < 1 {
            return Err(RoundtableError::Configuration(format!(
                "Agent '{}': max_tool_iterations must be at least 1",
                self.id
            )));
        }

        let tools = match (self.shared_tools, self.tools.is_empty()) {
            (Some(shared), true) => shared,
            (shared, _) => {
                let mut registry = shared.map(|r| (*r).clone()).unwrap_or_default();
                for spec in self.tools {
                    registry.register(spec)?;
                }
                Arc::new(registry)
            }
        };

        Ok(Agent {
            id: self.id,
            description: self.description,
            instructions: self.instructions,
            model: self.model,
            tools,
            output_schema: self.output_schema,
            max_tool_iterations: self.max_tool_iterations,
            completion_timeout: self.completion_timeout,
        })
    }
}
