//! Configuration module for Roundtable.
//!
//! Application settings (provider, per-agent defaults) and team descriptions.

mod settings;
mod team;

pub use settings::{AgentDefaults, GeneralSettings, ProviderSettings, Settings};
pub use team::{AgentConfig, TeamConfig};
