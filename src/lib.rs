//! Roundtable - turn-based multi-agent conversations
//!
//! A small orchestration core for teams of LLM agents that take turns on a
//! shared, append-only conversation log.
//!
//! # Overview
//!
//! - Agents are immutable configuration (instructions, tools, optional output
//!   schema) bound to a completion model.
//! - During its turn an agent may call tools any number of times, up to a cap,
//!   before giving one final answer.
//! - A team schedules its agents round-robin for a fixed number of turns and
//!   streams each turn's message as soon as it is ready.
//!
//! # Architecture
//!
//! - `message` - Messages, the message log and transcripts
//! - `tool` - Tool specs, argument schemas and the tool registry
//! - `schema` - Output schema validation
//! - `agent` - Agents, the completion model contract and turn execution
//! - `team` - Round-robin team scheduling
//! - `config` - Settings and team descriptions
//! - `openai` - OpenAI-compatible client construction
//!
//! # Example
//!
//! ```rust,no_run
//! use roundtable::agent::{Agent, OpenAIChatModel};
//! use roundtable::team::Team;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let model = Arc::new(OpenAIChatModel::new("gpt-4o-mini")?);
//!     let writer = Agent::builder("writer", model.clone())
//!         .instructions("Draft a short announcement.")
//!         .build()?;
//!     let editor = Agent::builder("editor", model)
//!         .instructions("Tighten the previous draft.")
//!         .build()?;
//!
//!     let mut team = Team::new(vec![Arc::new(writer), Arc::new(editor)], 2)?;
//!     let result = team.run_to_completion("Announce our new release").await?;
//!     for message in result.messages {
//!         println!("{}: {}", message.speaker, message.text());
//!     }
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod message;
pub mod openai;
pub mod schema;
pub mod team;
pub mod tool;

#[cfg(test)]
mod testing;

pub use error::{Result, RoundtableError, RunFailure};
