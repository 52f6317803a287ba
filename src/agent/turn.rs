//! Turn execution with the tool-calling resolution loop.

use super::{Agent, Completion, CompletionRequest};
use crate::error::{Result, RoundtableError};
use crate::message::{Content, Message, MessageLog};
use crate::schema::validate;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Runs a single agent turn against a session log.
///
/// The turn contributes exactly one assistant message to the log, preceded by
/// one tool-result message per tool call resolved while the agent worked.
pub struct TurnExecutor<'a> {
    agent: &'a Agent,
    cancel: Option<&'a CancellationToken>,
}

impl<'a> TurnExecutor<'a> {
    pub fn new(agent: &'a Agent) -> Self {
        Self {
            agent,
            cancel: None,
        }
    }

    /// Stop at the next tool-resolution boundary, or abandon a pending
    /// completion call, once `token` is cancelled.
    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run the turn and return the agent's final message (also appended to `log`).
    #[instrument(skip_all, fields(agent = %self.agent.id()))]
    pub async fn execute(&self, log: &mut MessageLog) -> Result<Message> {
        let agent = self.agent;
        let mut rounds = 0;

        loop {
            self.check_cancelled()?;
            debug!("Requesting completion (tool round {})", rounds);

            match self.request_completion(log).await? {
                Completion::FinalAnswer { content } => {
                    let content = self.finalize(content)?;
                    let message = Message::assistant(agent.id(), content);
                    log.append(message.clone());
                    info!("Agent {} finished its turn after {} tool round(s)", agent.id(), rounds);
                    return Ok(message);
                }
                Completion::ToolRequests(calls) if calls.is_empty() => {
                    // An empty request list carries no work; treat it as an empty answer
                    let content = self.finalize(String::new())?;
                    let message = Message::assistant(agent.id(), content);
                    log.append(message.clone());
                    return Ok(message);
                }
                Completion::ToolRequests(calls) => {
                    if rounds >= agent.max_tool_iterations() {
                        warn!(
                            "Agent {} still requesting tools after {} round(s)",
                            agent.id(),
                            rounds
                        );
                        return Err(RoundtableError::ToolLoopExceeded {
                            agent: agent.id().to_string(),
                            iterations: rounds,
                        });
                    }
                    rounds += 1;

                    for call in calls {
                        self.check_cancelled()?;
                        info!("Agent {} calling tool: {}", agent.id(), call);
                        let outcome = agent.tools().resolve(&call.name, &call.arguments).await;
                        if let Err(ref e) = outcome {
                            debug!("Tool call {} returned error: {}", call.id, e);
                        }
                        log.append(Message::tool_result(agent.id(), call, outcome));
                    }
                }
            }
        }
    }

    async fn request_completion(&self, log: &MessageLog) -> Result<Completion> {
        let agent = self.agent;
        let request = CompletionRequest {
            agent: agent.id(),
            instructions: agent.instructions(),
            messages: log.messages(),
            tools: agent.tools().specs(),
            output_schema: agent.output_schema(),
        };

        let call = async {
            match agent.completion_timeout() {
                Some(limit) => {
                    match tokio::time::timeout(limit, agent.model().complete(request)).await {
                        Ok(result) => result,
                        Err(_) => Err(RoundtableError::CompletionTimeout {
                            agent: agent.id().to_string(),
                            timeout: limit,
                        }),
                    }
                }
                None => agent.model().complete(request).await,
            }
        };

        match self.cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => Err(RoundtableError::Cancelled),
                result = call => result,
            },
            None => call.await,
        }
    }

    /// Apply the output schema, if any, to a final answer.
    fn finalize(&self, content: String) -> Result<Content> {
        match self.agent.output_schema() {
            Some(schema) => validate(schema, &content)
                .map(Content::Structured)
                .map_err(|detail| RoundtableError::SchemaViolation {
                    agent: self.agent.id().to_string(),
                    detail,
                }),
            None => Ok(Content::Text(content)),
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        match self.cancel {
            Some(token) if token.is_cancelled() => Err(RoundtableError::Cancelled),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Role, Speaker, ToolCall};
    use crate::schema::OutputSchema;
    use crate::testing::{ScriptedModel, Step};
    use crate::tool::{ParamType, ParameterSchema, ToolErrorKind, ToolSpec};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn double() -> ToolSpec {
        ToolSpec::from_fn(
            "double",
            "Double an integer",
            ParameterSchema::new().required("n", ParamType::Integer, "Value to double"),
            |args| Ok(json!(args.i64("n").unwrap_or_default() * 2)),
        )
        .unwrap()
    }

    fn task_log() -> MessageLog {
        let mut log = MessageLog::new();
        log.append(Message::user("What is 21 doubled?"));
        log
    }

    #[tokio::test]
    async fn test_tool_result_precedes_final_answer() {
        let model = ScriptedModel::shared(vec![
            Completion::tool_request(ToolCall::new("double", json!({"n": 21}))),
            Completion::final_answer("42"),
        ]);
        let agent = Agent::builder("math", model.clone()).tool(double()).build().unwrap();

        let mut log = task_log();
        let message = TurnExecutor::new(&agent).execute(&mut log).await.unwrap();

        assert_eq!(message.text(), "42");
        assert_eq!(log.len(), 3);
        assert_eq!(log.messages()[1].role, Role::ToolResult);
        assert_eq!(log.messages()[1].content, Content::Structured(json!(42)));
        assert_eq!(log.messages()[2].role, Role::Assistant);
        assert_eq!(log.messages()[2].speaker, Speaker::Agent("math".to_string()));

        // The second completion saw the tool result
        let seen = model.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].tool_names, vec!["double".to_string()]);
        assert_eq!(seen[1].messages.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_logged_not_fatal() {
        let model = ScriptedModel::shared(vec![
            Completion::tool_request(ToolCall::new("double", json!({"n": "abc"}))),
            Completion::final_answer("I could not double that."),
        ]);
        let agent = Agent::builder("math", model).tool(double()).build().unwrap();

        let mut log = task_log();
        TurnExecutor::new(&agent).execute(&mut log).await.unwrap();

        match &log.messages()[1].content {
            Content::ToolError(err) => assert_eq!(err.kind, ToolErrorKind::InvalidArguments),
            other => panic!("Expected tool error, got {:?}", other),
        }
        assert_eq!(log.messages()[2].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_multiple_requests_resolved_in_order() {
        let model = ScriptedModel::shared(vec![
            Completion::ToolRequests(vec![
                ToolCall::with_id("c1", "double", json!({"n": 1})),
                ToolCall::with_id("c2", "double", json!({"n": 2})),
                ToolCall::with_id("c3", "double", json!({"n": 3})),
            ]),
            Completion::final_answer("2, 4, 6"),
        ]);
        let agent = Agent::builder("math", model).tool(double()).build().unwrap();

        let mut log = task_log();
        TurnExecutor::new(&agent).execute(&mut log).await.unwrap();

        let ids: Vec<&str> = log
            .by_role(Role::ToolResult)
            .filter_map(|m| m.tool_call.as_ref().map(|c| c.id.as_str()))
            .collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
        let values: Vec<String> = log.by_role(Role::ToolResult).map(|m| m.text()).collect();
        assert_eq!(values, vec!["2", "4", "6"]);
    }

    #[tokio::test]
    async fn test_tool_loop_exceeded_after_cap() {
        let model = ScriptedModel::repeating(Completion::tool_request(ToolCall::new(
            "double",
            json!({"n": 1}),
        )));
        let agent = Agent::builder("looper", model.clone())
            .tool(double())
            .max_tool_iterations(1)
            .build()
            .unwrap();

        let mut log = task_log();
        let err = TurnExecutor::new(&agent).execute(&mut log).await.unwrap_err();

        match err {
            RoundtableError::ToolLoopExceeded { agent, iterations } => {
                assert_eq!(agent, "looper");
                assert_eq!(iterations, 1);
            }
            other => panic!("Expected ToolLoopExceeded, got {:?}", other),
        }
        assert_eq!(log.by_role(Role::ToolResult).count(), 1);
        assert_eq!(log.by_role(Role::Assistant).count(), 0);
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_round_trips_never_exceed_cap() {
        for cap in 1..=4 {
            let model = ScriptedModel::repeating(Completion::tool_request(ToolCall::new(
                "double",
                json!({"n": 1}),
            )));
            let agent = Agent::builder("looper", model)
                .tool(double())
                .max_tool_iterations(cap)
                .build()
                .unwrap();

            let mut log = task_log();
            assert!(TurnExecutor::new(&agent).execute(&mut log).await.is_err());
            assert_eq!(log.by_role(Role::ToolResult).count(), cap);
        }
    }

    #[tokio::test]
    async fn test_structured_output_validated() {
        let schema = OutputSchema::new(
            "post",
            json!({
                "type": "object",
                "properties": {
                    "platform": {"type": "string"},
                    "content": {"type": "string"}
                },
                "required": ["platform", "content"]
            }),
        )
        .unwrap();

        let model = ScriptedModel::shared(vec![Completion::final_answer(
            r#"{"platform": "LinkedIn", "content": "New video out"}"#,
        )]);
        let agent = Agent::builder("writer", model.clone())
            .output_schema(schema.clone())
            .build()
            .unwrap();
        let mut log = task_log();
        let message = TurnExecutor::new(&agent).execute(&mut log).await.unwrap();
        assert_eq!(message.content, Content::Structured(json!({"platform": "LinkedIn", "content": "New video out"})));
        assert!(model.seen()[0].has_output_schema);

        let model = ScriptedModel::shared(vec![Completion::final_answer("Just some prose")]);
        let agent = Agent::builder("writer", model).output_schema(schema).build().unwrap();
        let mut log = task_log();
        let err = TurnExecutor::new(&agent).execute(&mut log).await.unwrap_err();
        assert_eq!(err.kind(), "SchemaViolationError");
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_provider_error_fails_turn() {
        let model = Arc::new(ScriptedModel::new(vec![Step::Fail("rate limited".to_string())]));
        let agent = Agent::builder("a", model).build().unwrap();
        let mut log = task_log();
        let err = TurnExecutor::new(&agent).execute(&mut log).await.unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_completion_timeout() {
        let model = Arc::new(ScriptedModel::new(vec![Step::Hang]));
        let agent = Agent::builder("slow", model)
            .completion_timeout(Duration::from_millis(20))
            .build()
            .unwrap();
        let mut log = task_log();
        let err = TurnExecutor::new(&agent).execute(&mut log).await.unwrap_err();
        assert_eq!(err.kind(), "CompletionTimeout");
    }

    #[tokio::test]
    async fn test_cancellation_abandons_pending_completion() {
        let model = Arc::new(ScriptedModel::new(vec![Step::Hang]));
        let agent = Agent::builder("slow", model).build().unwrap();
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let mut log = task_log();
        let err = TurnExecutor::new(&agent)
            .with_cancellation(&token)
            .execute(&mut log)
            .await
            .unwrap_err();
        assert!(matches!(err, RoundtableError::Cancelled));
        assert_eq!(log.len(), 1);
    }
}
