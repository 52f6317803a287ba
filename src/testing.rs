//! Scripted completion model for exercising agents and teams without a network.

use crate::agent::{Completion, CompletionModel, CompletionRequest};
use crate::error::{Result, RoundtableError};
use crate::message::Message;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted response.
pub(crate) enum Step {
    Reply(Completion),
    Fail(String),
    /// Never resolves; used to exercise timeouts and cancellation.
    Hang,
}

/// What the model was shown on one call.
#[derive(Debug, Clone)]
pub(crate) struct SeenRequest {
    pub agent: String,
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
    pub has_output_schema: bool,
}

pub(crate) struct ScriptedModel {
    script: Mutex<VecDeque<Step>>,
    repeat: Option<Completion>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl ScriptedModel {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            repeat: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Replies with `completions` in order, then fails.
    pub fn shared(completions: Vec<Completion>) -> Arc<Self> {
        Arc::new(Self::new(completions.into_iter().map(Step::Reply).collect()))
    }

    /// Replies with `completion` forever.
    pub fn repeating(completion: Completion) -> Arc<Self> {
        Arc::new(Self {
            repeat: Some(completion),
            ..Self::new(Vec::new())
        })
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion> {
        self.seen.lock().unwrap().push(SeenRequest {
            agent: request.agent.to_string(),
            messages: request.messages.to_vec(),
            tool_names: request.tools.iter().map(|t| t.name().to_string()).collect(),
            has_output_schema: request.output_schema.is_some(),
        });

        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(completion)) => Ok(completion),
            Some(Step::Fail(detail)) => Err(RoundtableError::Provider(detail)),
            Some(Step::Hang) => {
                futures::future::pending::<()>().await;
                Err(RoundtableError::Provider("unreachable".to_string()))
            }
            None => self
                .repeat
                .clone()
                .ok_or_else(|| RoundtableError::Provider("script exhausted".to_string())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
