//! CLI command implementations.

mod config;
mod doctor;
mod run;
mod show;
mod tools;

pub use config::run_config;
pub use doctor::run_doctor;
pub use run::run_team;
pub use show::run_show;
pub use tools::run_tools;
