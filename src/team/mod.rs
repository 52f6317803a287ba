//! Round-robin team scheduling.
//!
//! A [`Team`] owns the message log of one session and hands out turns to its
//! participants in a fixed order until the turn budget is spent.

use crate::agent::{Agent, TurnExecutor};
use crate::error::{Result, RoundtableError, RunFailure};
use crate::message::{Content, Message, MessageLog, Transcript};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamState {
    Running,
    Terminated,
}

/// Outcome of a run that used its whole turn budget.
#[derive(Debug, Clone)]
pub struct TaskResult {
    /// One message per turn, in turn order.
    pub messages: Vec<Message>,
    /// The full session log, including the task and tool results.
    pub transcript: Transcript,
    pub turns: usize,
}

/// Ordered participants taking turns on a shared message log.
pub struct Team {
    name: String,
    participants: Vec<Arc<Agent>>,
    max_turns: usize,
    current_turn: usize,
    log: MessageLog,
    state: TeamState,
    cancel: CancellationToken,
}

impl Team {
    pub fn new(participants: Vec<Arc<Agent>>, max_turns: usize) -> Result<Self> {
        if participants.is_empty() {
            return Err(RoundtableError::Configuration(
                "A team needs at least one participant".to_string(),
            ));
        }
        if max_turns < 1 {
            return Err(RoundtableError::Configuration(
                "max_turns must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            name: "team".to_string(),
            participants,
            max_turns,
            current_turn: 0,
            log: MessageLog::new(),
            state: TeamState::Running,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Cancel runs of this team through `token`.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancel = token;
    }

    /// Token that cancels the current run when triggered.
    ///
    /// A run stopped by cancellation leaves a fresh token in place so the
    /// team can run again; fetch the token anew for each run.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn participants(&self) -> &[Arc<Agent>] {
        &self.participants
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn current_turn(&self) -> usize {
        self.current_turn
    }

    pub fn state(&self) -> TeamState {
        self.state
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// The participant whose turn is next.
    pub fn active_agent(&self) -> &Arc<Agent> {
        &self.participants[self.current_turn % self.participants.len()]
    }

    /// Clear the log and turn counter so the team can run again.
    pub fn reset(&mut self) {
        self.current_turn = 0;
        self.log.clear();
        self.state = TeamState::Running;
    }

    /// Start a run on `task` and yield each turn's message as it completes.
    ///
    /// The stream ends after `max_turns` turns or right after the first
    /// failure. Tool results stay in [`log`](Self::log) but are not yielded.
    pub fn run(
        &mut self,
        task: impl Into<Content>,
    ) -> BoxStream<'_, std::result::Result<Message, RunFailure>> {
        self.reset();
        self.log.append(Message::user(task));
        info!(
            "Team {} starting: {} participant(s), {} turn(s)",
            self.name,
            self.participants.len(),
            self.max_turns
        );

        stream::unfold(self, |team| async move {
            let item = team.step().await?;
            Some((item, team))
        })
        .boxed()
    }

    /// Run to the end and collect the turn messages.
    pub async fn run_to_completion(
        &mut self,
        task: impl Into<Content>,
    ) -> std::result::Result<TaskResult, RunFailure> {
        let mut messages = Vec::with_capacity(self.max_turns);
        {
            let mut turns = self.run(task);
            while let Some(item) = turns.next().await {
                messages.push(item?);
            }
        }

        Ok(TaskResult {
            turns: messages.len(),
            messages,
            transcript: self.log.to_transcript(),
        })
    }

    /// Execute one turn. Returns `None` once the team has terminated.
    #[instrument(skip(self), fields(team = %self.name, turn = self.current_turn))]
    async fn step(&mut self) -> Option<std::result::Result<Message, RunFailure>> {
        if self.state == TeamState::Terminated {
            return None;
        }

        let turn = self.current_turn;
        let agent = Arc::clone(self.active_agent());
        let outcome = if self.cancel.is_cancelled() {
            Err(RoundtableError::Cancelled)
        } else {
            TurnExecutor::new(&agent)
                .with_cancellation(&self.cancel)
                .execute(&mut self.log)
                .await
        };

        match outcome {
            Ok(message) => {
                self.current_turn += 1;
                if self.current_turn >= self.max_turns {
                    self.state = TeamState::Terminated;
                    info!("Team {} finished after {} turn(s)", self.name, self.current_turn);
                }
                Some(Ok(message))
            }
            Err(error) => {
                self.state = TeamState::Terminated;
                warn!("Turn {} ({}) failed: {}", turn, agent.id(), error);
                if matches!(error, RoundtableError::Cancelled) {
                    self.cancel = CancellationToken::new();
                }
                Some(Err(RunFailure {
                    error,
                    agent: agent.id().to_string(),
                    turn,
                    transcript: self.log.to_transcript(),
                }))
            }
        }
    }
}

impl std::fmt::Debug for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Team")
            .field("name", &self.name)
            .field(
                "participants",
                &self.participants.iter().map(|a| a.id()).collect::<Vec<_>>(),
            )
            .field("max_turns", &self.max_turns)
            .field("current_turn", &self.current_turn)
            .field("state", &self.state)
            .finish()
    }
}
