//! Entity sea-orm для локального хранилища LLM Shell.

pub mod command_logs;
pub mod enums;
pub mod keypairs;
pub mod server_groups;
pub mod servers;
pub mod settings;

pub use enums::{AuthType, CommandSource, RiskLevel};
