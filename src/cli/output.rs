//! CLI output formatting utilities.

use crate::message::{Content, Message, Speaker};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a conversation message with a speaker header.
    pub fn message(message: &Message) {
        match (&message.speaker, &message.tool_call) {
            (Speaker::Tool, Some(call)) => {
                let requester = message.requested_by.as_deref().unwrap_or("?");
                let marker = if message.content.is_tool_error() {
                    style("x").red()
                } else {
                    style("~").dim()
                };
                println!(
                    "  {} {} {}",
                    marker,
                    style(format!("{} -> {}", requester, truncate(&call.to_string(), 80))).dim(),
                    style(truncate(&message.text(), 120)).dim()
                );
            }
            (speaker, _) => {
                let header = match speaker {
                    Speaker::User => style("user".to_string()).yellow().bold(),
                    other => style(other.to_string()).cyan().bold(),
                };
                println!("\n{}", header);
                match message.content {
                    Content::Structured(ref value) => println!(
                        "{}",
                        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
                    ),
                    _ => println!("{}", message.text()),
                }
            }
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate to `max_len` characters on one line, with ellipsis.
pub fn truncate(s: &str, max_len: usize) -> String {
    let flat = s.replace('\n', " ");
    if flat.chars().count() <= max_len {
        flat
    } else {
        let cut: String = flat.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("two\nlines", 20), "two lines");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate("ååååå", 4), "å...");
    }
}
