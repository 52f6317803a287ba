//! Run command implementation.

use crate::agent::{CompletionModel, OpenAIChatModel};
use crate::cli::output::truncate;
use crate::cli::{preflight, Output};
use crate::config::{Settings, TeamConfig};
use crate::error::RunFailure;
use crate::message::Role;
use crate::team::Team;
use crate::tool::builtin;
use anyhow::{anyhow, Context, Result};
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Run the run command.
pub async fn run_team(
    team_path: &Path,
    task: Option<String>,
    transcript: Option<String>,
    model: Option<String>,
    max_turns: Option<usize>,
    settings: Settings,
) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check_api_key(&settings.provider) {
        Output::error(&format!("{}", e));
        Output::info("Run 'roundtable doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mut config = TeamConfig::load(team_path)
        .with_context(|| format!("Failed to load team from {}", team_path.display()))?;
    if let Some(turns) = max_turns {
        config.max_turns = turns;
    }
    let task = task
        .or_else(|| config.task.clone())
        .ok_or_else(|| anyhow!("No task given and team '{}' has no default task", config.name))?;

    let catalog = builtin::registry()?;
    let mut team = config.build(&settings, &catalog, |name| {
        let name = model.as_deref().unwrap_or(name);
        debug!("Creating chat model {}", name);
        let chat: Arc<dyn CompletionModel> =
            Arc::new(OpenAIChatModel::from_settings(&settings.provider, name)?);
        Ok(chat)
    })?;

    // Ctrl-C stops the run at the next boundary and keeps the partial log
    let token = team.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    Output::header(&format!(
        "Team '{}' ({} agent(s), {} turn(s))",
        team.name(),
        team.participants().len(),
        team.max_turns()
    ));

    let started = Instant::now();
    let (turns, failure) = stream_turns(&mut team, &task).await;

    print_tool_calls(&team);

    let transcript_path = transcript.map(|p| settings.transcript_path(&p));
    if let Some(ref path) = transcript_path {
        team.log()
            .to_transcript()
            .save(path)
            .with_context(|| format!("Failed to write transcript to {}", path.display()))?;
    }

    match failure {
        None => {
            Output::success(&format!(
                "Team '{}' finished {} turn(s) in {:.1}s",
                team.name(),
                turns,
                started.elapsed().as_secs_f64()
            ));
            if let Some(path) = transcript_path {
                Output::info(&format!("Transcript written to {}", path.display()));
            }
            Ok(())
        }
        Some(failure) => {
            Output::error(&format!("Run failed: {}", failure.kind()));
            Output::kv("agent", &failure.agent);
            Output::kv("turn", &failure.turn.to_string());
            Output::kv("error", &failure.error.to_string());
            Output::kv("messages logged", &failure.transcript.len().to_string());
            if let Some(path) = transcript_path {
                Output::info(&format!("Partial transcript written to {}", path.display()));
            }
            Err(failure.into())
        }
    }
}

/// Print each turn as it completes. Returns the completed turn count and the
/// failure that stopped the run, if any.
async fn stream_turns(team: &mut Team, task: &str) -> (usize, Option<RunFailure>) {
    let order: Vec<String> = team.participants().iter().map(|a| a.id().to_string()).collect();
    let max_turns = team.max_turns();
    let mut turns = 0;

    let mut stream = team.run(task);
    Output::message(&crate::message::Message::user(task));

    while turns < max_turns {
        let spinner = Output::spinner(&format!(
            "Turn {}/{}: {} is working...",
            turns + 1,
            max_turns,
            order[turns % order.len()]
        ));
        let item = stream.next().await;
        spinner.finish_and_clear();

        match item {
            Some(Ok(message)) => {
                Output::message(&message);
                turns += 1;
            }
            Some(Err(failure)) => return (turns, Some(failure)),
            None => break,
        }
    }

    (turns, None)
}

fn print_tool_calls(team: &Team) {
    let calls: Vec<_> = team.log().by_role(Role::ToolResult).collect();
    if calls.is_empty() {
        return;
    }

    Output::header(&format!("Tool calls ({})", calls.len()));
    for message in calls {
        let call = message
            .tool_call
            .as_ref()
            .map(|c| c.to_string())
            .unwrap_or_default();
        let status = if message.content.is_tool_error() { "failed" } else { "ok" };
        Output::list_item(&format!(
            "{} {} [{}]",
            message.requested_by.as_deref().unwrap_or("?"),
            truncate(&call, 60),
            status
        ));
    }
}
