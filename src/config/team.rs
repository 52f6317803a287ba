//! Team descriptions loaded from TOML.
//!
//! ```toml
//! name = "research"
//! max_turns = 2
//!
//! [[agents]]
//! id = "researcher"
//! instructions = "Find relevant facts."
//! tools = ["current_time"]
//!
//! [[agents]]
//! id = "writer"
//! instructions = "Write a short post."
//! output_schema_name = "post"
//! [agents.output_schema]
//! type = "object"
//! required = ["content"]
//! properties.content.type = "string"
//! ```

use super::Settings;
use crate::agent::{Agent, CompletionModel};
use crate::error::{Result, RoundtableError};
use crate::schema::OutputSchema;
use crate::team::Team;
use crate::tool::ToolRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

fn default_max_turns() -> usize {
    2
}

/// A team of agents and its turn budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamConfig {
    pub name: String,
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Task used when none is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

/// One participant of a [`TeamConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Model name; falls back to `[provider] model`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Names of built-in tools this agent may call.
    #[serde(default)]
    pub tools: Vec<String>,
    /// JSON Schema the final answer must satisfy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tool_iterations: Option<usize>,
}

impl TeamConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Build the team.
    ///
    /// `model_for` is called once per distinct model name; agents naming the
    /// same model share one instance. Tool names are resolved against
    /// `catalog`.
    pub fn build<F>(&self, settings: &Settings, catalog: &ToolRegistry, mut model_for: F) -> Result<Team>
    where
        F: FnMut(&str) -> Result<Arc<dyn CompletionModel>>,
    {
        if self.agents.is_empty() {
            return Err(RoundtableError::Configuration(format!(
                "Team '{}' has no agents",
                self.name
            )));
        }

        let defaults = &settings.defaults;
        let mut models: HashMap<String, Arc<dyn CompletionModel>> = HashMap::new();
        let mut seen = HashSet::new();
        let mut participants = Vec::with_capacity(self.agents.len());

        for config in &self.agents {
            if !seen.insert(config.id.as_str()) {
                return Err(RoundtableError::Configuration(format!(
                    "Duplicate agent id '{}' in team '{}'",
                    config.id, self.name
                )));
            }

            let model_name = config.model.as_deref().unwrap_or(&settings.provider.model);
            let model = match models.get(model_name) {
                Some(model) => Arc::clone(model),
                None => {
                    let model = model_for(model_name)?;
                    models.insert(model_name.to_string(), Arc::clone(&model));
                    model
                }
            };

            let mut tools = match defaults.tool_timeout() {
                Some(timeout) => ToolRegistry::new().with_default_timeout(timeout),
                None => ToolRegistry::new(),
            };
            for name in &config.tools {
                let spec = catalog.get(name).ok_or_else(|| {
                    RoundtableError::Configuration(format!(
                        "Agent '{}' uses unknown tool '{}' (available: {})",
                        config.id,
                        name,
                        catalog.names().join(", ")
                    ))
                })?;
                tools.register(spec.clone())?;
            }

            let mut builder = Agent::builder(config.id.as_str(), model)
                .description(&config.description)
                .tools(Arc::new(tools))
                .max_tool_iterations(
                    config.max_tool_iterations.unwrap_or(defaults.max_tool_iterations),
                );
            if let Some(ref instructions) = config.instructions {
                builder = builder.instructions(instructions);
            }
            if let Some(ref schema) = config.output_schema {
                let name = config
                    .output_schema_name
                    .clone()
                    .unwrap_or_else(|| format!("{}_output", config.id));
                builder = builder.output_schema(OutputSchema::new(name, schema.clone())?);
            }
            if let Some(timeout) = defaults.completion_timeout() {
                builder = builder.completion_timeout(timeout);
            }

            let agent = builder.build()?;
            debug!("Configured agent {:?}", agent);
            participants.push(Arc::new(agent));
        }

        Ok(Team::new(participants, self.max_turns)?.with_name(&self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;
    use crate::tool::builtin;

    const TEAM: &str = r#"
name = "social"
max_turns = 4
task = "Announce the new video"

[[agents]]
id = "researcher"
description = "Collects facts"
instructions = "Find facts."
tools = ["current_time", "calculator"]
max_tool_iterations = 3

[[agents]]
id = "writer"
model = "gpt-4o"
instructions = "Write a post."
output_schema_name = "post"

[agents.output_schema]
type = "object"
required = ["platform", "content"]

[agents.output_schema.properties.platform]
type = "string"

[agents.output_schema.properties.content]
type = "string"
"#;

    fn scripted(_: &str) -> Result<Arc<dyn CompletionModel>> {
        Ok(ScriptedModel::shared(vec![]))
    }

    #[test]
    fn test_parse_and_build() {
        let config = TeamConfig::from_toml(TEAM).unwrap();
        assert_eq!(config.task.as_deref(), Some("Announce the new video"));

        let mut requested = Vec::new();
        let team = config
            .build(&Settings::default(), &builtin::registry().unwrap(), |name| {
                requested.push(name.to_string());
                scripted(name)
            })
            .unwrap();

        assert_eq!(team.name(), "social");
        assert_eq!(team.max_turns(), 4);
        let researcher = &team.participants()[0];
        assert_eq!(researcher.tools().names(), ["current_time", "calculator"]);
        assert_eq!(researcher.max_tool_iterations(), 3);
        let writer = &team.participants()[1];
        assert_eq!(writer.output_schema().map(|s| s.name()), Some("post"));
        assert_eq!(writer.max_tool_iterations(), 10);
        assert_eq!(requested, vec!["gpt-4o-mini", "gpt-4o"]);
    }

    #[test]
    fn test_models_shared_by_name() {
        let config = TeamConfig::from_toml(
            r#"
name = "pair"
[[agents]]
id = "a"
[[agents]]
id = "b"
"#,
        )
        .unwrap();
        let mut calls = 0;
        let team = config
            .build(&Settings::default(), &ToolRegistry::new(), |name| {
                calls += 1;
                scripted(name)
            })
            .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(team.max_turns(), 2);
        assert!(Arc::ptr_eq(
            team.participants()[0].model(),
            team.participants()[1].model()
        ));
    }

    #[test]
    fn test_build_errors() {
        let catalog = builtin::registry().unwrap();
        let cases = [
            ("name = \"empty\"", "no agents"),
            (
                "name = \"t\"\n[[agents]]\nid = \"a\"\n[[agents]]\nid = \"a\"",
                "Duplicate agent id",
            ),
            (
                "name = \"t\"\n[[agents]]\nid = \"a\"\ntools = [\"web_search\"]",
                "unknown tool 'web_search'",
            ),
            (
                "name = \"t\"\n[[agents]]\nid = \"a\"\noutput_schema = { type = 12 }",
                "schema",
            ),
            ("name = \"t\"\nmax_turns = 0\n[[agents]]\nid = \"a\"", "max_turns"),
        ];

        for (toml, expected) in cases {
            let config = TeamConfig::from_toml(toml).unwrap();
            let err = config
                .build(&Settings::default(), &catalog, scripted)
                .unwrap_err();
            assert_eq!(err.kind(), "ConfigurationError", "{}", toml);
            assert!(err.to_string().contains(expected), "{}: {}", toml, err);
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("team.toml");
        std::fs::write(&path, TEAM).unwrap();
        let config = TeamConfig::load(&path).unwrap();
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.agents[1].model.as_deref(), Some("gpt-4o"));
    }
}
