//! Append-only message log and its persisted transcript form.

use super::{Message, Role};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ordered record of a session. Entries are never reordered or removed;
/// the whole log is discarded only when a session is torn down.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its position.
    pub fn append(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Messages with the given role, in log order.
    pub fn by_role(&self, role: Role) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |m| m.role == role)
    }

    /// Snapshot the log as a transcript.
    pub fn to_transcript(&self) -> Transcript {
        Transcript {
            created_at: Utc::now(),
            messages: self.messages.clone(),
        }
    }

    /// Drop every entry. Only used when a session is torn down and restarted.
    pub(crate) fn clear(&mut self) {
        self.messages.clear();
    }
}

impl From<Transcript> for MessageLog {
    fn from(transcript: Transcript) -> Self {
        Self {
            messages: transcript.messages,
        }
    }
}

/// Serializable form of a message log, for rendering or persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self {
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }
}

impl Transcript {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the transcript as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Content, Speaker, ToolCall};
    use crate::tool::{ToolError, ToolErrorKind};
    use serde_json::json;

    fn sample_log() -> MessageLog {
        let mut log = MessageLog::new();
        log.append(Message::user("Find papers on agents"));
        log.append(Message::tool_result(
            "researcher",
            ToolCall::new("search", json!({"query": "agents"})),
            Ok(json!([{"title": "AutoGen"}])),
        ));
        log.append(Message::tool_result(
            "researcher",
            ToolCall::new("search", json!({"query": 7})),
            Err(ToolError::new(ToolErrorKind::InvalidArguments, "query must be a string")),
        ));
        log.append(Message::assistant("researcher", "Found one paper"));
        log.append(Message::assistant(
            "summarizer",
            Content::Structured(json!({"summary": "AutoGen"})),
        ));
        log
    }

    #[test]
    fn test_append_preserves_order() {
        let log = sample_log();
        assert_eq!(log.len(), 5);
        assert_eq!(log.messages()[0].speaker, Speaker::User);
        assert_eq!(log.by_role(Role::ToolResult).count(), 2);
        assert_eq!(log.last().unwrap().speaker, Speaker::Agent("summarizer".to_string()));
    }

    #[test]
    fn test_transcript_file_round_trip() {
        let log = sample_log();
        let transcript = log.to_transcript();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs").join("transcript.json");
        transcript.save(&path).unwrap();

        let loaded = Transcript::load(&path).unwrap();
        assert_eq!(loaded, transcript);

        let rebuilt = MessageLog::from(loaded);
        assert_eq!(rebuilt.messages(), log.messages());
    }

    #[test]
    fn test_transcript_preserves_float_results() {
        let mut log = MessageLog::new();
        for value in [1.079907802215119e-66, 0.1 + 0.2, 2.2250738585072014e-308, -1.7976931348623157e308] {
            log.append(Message::tool_result(
                "math",
                ToolCall::new("calculator", json!({"operation": "add"})),
                Ok(json!(value)),
            ));
        }
        log.append(Message::assistant("math", Content::Structured(json!({"ratio": 0.30000000000000004}))));

        let transcript = log.to_transcript();
        let reloaded = Transcript::from_json(&transcript.to_json().unwrap()).unwrap();
        assert_eq!(reloaded, transcript);
        assert_eq!(
            reloaded.messages[0].content,
            Content::Structured(json!(1.079907802215119e-66))
        );
    }
}
