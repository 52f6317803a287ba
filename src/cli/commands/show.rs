//! Show command implementation.

use crate::cli::Output;
use crate::message::{Role, Transcript};
use anyhow::{Context, Result};
use std::path::Path;

/// Print a saved transcript.
pub fn run_show(path: &Path) -> Result<()> {
    let transcript = Transcript::load(path)
        .with_context(|| format!("Failed to read transcript {}", path.display()))?;

    Output::header(&format!(
        "Transcript from {} ({} messages)",
        transcript.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        transcript.len()
    ));
    for message in &transcript.messages {
        Output::message(message);
    }

    let turns = transcript
        .messages
        .iter()
        .filter(|m| m.role == Role::Assistant)
        .count();
    println!();
    Output::info(&format!("{} turn(s) recorded", turns));
    Ok(())
}
