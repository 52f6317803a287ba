//! Completion model backed by an OpenAI-compatible chat completions API.

use super::{Completion, CompletionModel, CompletionRequest};
use crate::config::ProviderSettings;
use crate::error::{Result, RoundtableError};
use crate::message::{Message, Role, ToolCall};
use crate::openai::{create_client, create_client_from_settings};
use crate::schema::OutputSchema;
use crate::tool::ToolSpec;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs, ChatCompletionTool,
    ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
    ResponseFormat, ResponseFormatJsonSchema,
};
use async_openai::Client;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

/// Chat completions client for one model.
pub struct OpenAIChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
}

impl OpenAIChatModel {
    /// Use the default OpenAI endpoint.
    pub fn new(model: &str) -> Result<Self> {
        Ok(Self::with_client(create_client()?, model))
    }

    /// Use the endpoint, key and timeout from provider settings.
    pub fn from_settings(settings: &ProviderSettings, model: &str) -> Result<Self> {
        let mut chat = Self::with_client(create_client_from_settings(settings)?, model);
        chat.temperature = settings.temperature;
        Ok(chat)
    }

    pub fn with_client(client: Client<OpenAIConfig>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[async_trait]
impl CompletionModel for OpenAIChatModel {
    #[instrument(skip(self, request), fields(model = %self.model, agent = %request.agent))]
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion> {
        let messages = build_messages(&request)?;
        debug!("Sending {} messages to {}", messages.len(), self.model);

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(messages);
        if !request.tools.is_empty() {
            args.tools(tool_definitions(&request.tools));
        }
        if let Some(schema) = request.output_schema {
            args.response_format(response_format(schema));
        }
        if let Some(temperature) = self.temperature {
            args.temperature(temperature);
        }
        let chat_request = args.build().map_err(|e| RoundtableError::Provider(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| RoundtableError::OpenAI(format!("Completion error for '{}': {}", request.agent, e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RoundtableError::Provider("No response from model".to_string()))?;

        match choice.message.tool_calls {
            Some(tool_calls) if !tool_calls.is_empty() => Ok(Completion::ToolRequests(
                tool_calls.into_iter().map(parse_tool_call).collect(),
            )),
            _ => Ok(Completion::FinalAnswer {
                content: choice
                    .message
                    .content
                    .or(choice.message.refusal)
                    .unwrap_or_default(),
            }),
        }
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Convert a provider tool call. Arguments that are not valid JSON are kept as
/// a raw string so argument validation reports them back to the agent.
fn parse_tool_call(call: ChatCompletionMessageToolCall) -> ToolCall {
    let raw = call.function.arguments;
    let arguments = if raw.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&raw).unwrap_or(Value::String(raw))
    };
    ToolCall::with_id(call.id, call.function.name, arguments)
}

/// Structured output request. Schemas the provider cannot enforce strictly
/// are sent as hints; the turn executor validates the answer either way.
fn response_format(schema: &OutputSchema) -> ResponseFormat {
    ResponseFormat::JsonSchema {
        json_schema: ResponseFormatJsonSchema {
            description: None,
            name: schema.name().to_string(),
            schema: Some(schema.schema().clone()),
            strict: Some(schema.is_strict()),
        },
    }
}

/// Function definitions for the agent's tools.
fn tool_definitions(tools: &[&ToolSpec]) -> Vec<ChatCompletionTool> {
    tools
        .iter()
        .map(|spec| ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: spec.name().to_string(),
                description: Some(spec.description().to_string()).filter(|d| !d.is_empty()),
                parameters: Some(spec.parameters().to_json_schema()),
                strict: None,
            },
        })
        .collect()
}

/// Render the session log from the point of view of `request.agent`.
///
/// - the user task stays a user message;
/// - the agent's own answers are assistant messages;
/// - other agents' answers become user messages named after their speaker;
/// - the agent's own tool results become an assistant `tool_calls` message
///   followed by one tool message per result;
/// - tool results obtained by other agents are summarized as user messages.
fn build_messages(request: &CompletionRequest<'_>) -> Result<Vec<ChatCompletionRequestMessage>> {
    let me = request.agent;
    let log = request.messages;
    let mut messages: Vec<ChatCompletionRequestMessage> = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(request.instructions.to_string())
            .build()
            .map_err(provider_error)?
            .into(),
    ];

    let mut i = 0;
    while i < log.len() {
        let message = &log[i];
        match message.role {
            Role::User => messages.push(user_message(message.text(), None)?),
            Role::Assistant if message.speaker.agent_id() == Some(me) => messages.push(
                ChatCompletionRequestAssistantMessageArgs::default()
                    .content(message.text())
                    .build()
                    .map_err(provider_error)?
                    .into(),
            ),
            Role::Assistant => {
                messages.push(user_message(message.text(), message.speaker.agent_id())?)
            }
            Role::ToolResult if message.requested_by.as_deref() == Some(me) => {
                // Results of one round sit next to each other in the log
                let mut end = i + 1;
                while end < log.len()
                    && log[end].role == Role::ToolResult
                    && log[end].requested_by.as_deref() == Some(me)
                {
                    end += 1;
                }
                append_own_tool_results(&mut messages, &log[i..end])?;
                i = end;
                continue;
            }
            Role::ToolResult => {
                let requester = message.requested_by.as_deref();
                let call = message
                    .tool_call
                    .as_ref()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "tool".to_string());
                messages.push(user_message(
                    format!("[{} result] {}", call, message.text()),
                    requester,
                )?);
            }
        }
        i += 1;
    }

    Ok(messages)
}

fn append_own_tool_results(
    messages: &mut Vec<ChatCompletionRequestMessage>,
    results: &[Message],
) -> Result<()> {
    let calls: Vec<ChatCompletionMessageToolCall> = results
        .iter()
        .filter_map(|m| m.tool_call.as_ref())
        .map(|call| ChatCompletionMessageToolCall {
            id: call.id.clone(),
            r#type: ChatCompletionToolType::Function,
            function: FunctionCall {
                name: call.name.clone(),
                arguments: match &call.arguments {
                    Value::String(raw) => raw.clone(),
                    other => other.to_string(),
                },
            },
        })
        .collect();

    if !calls.is_empty() {
        messages.push(
            ChatCompletionRequestAssistantMessageArgs::default()
                .tool_calls(calls)
                .build()
                .map_err(provider_error)?
                .into(),
        );
    }

    for result in results {
        match result.tool_call {
            Some(ref call) => messages.push(
                ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(call.id.clone())
                    .content(result.text())
                    .build()
                    .map_err(provider_error)?
                    .into(),
            ),
            None => messages.push(user_message(result.text(), None)?),
        }
    }
    Ok(())
}

fn user_message(content: String, name: Option<&str>) -> Result<ChatCompletionRequestMessage> {
    let mut args = ChatCompletionRequestUserMessageArgs::default();
    args.content(content);
    if let Some(name) = name {
        args.name(participant_name(name));
    }
    Ok(args.build().map_err(provider_error)?.into())
}

/// Participant names may only contain letters, digits, '_' and '-'.
fn participant_name(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .take(64)
        .collect()
}

fn provider_error(e: impl std::fmt::Display) -> RoundtableError {
    RoundtableError::Provider(e.to_string())
}
