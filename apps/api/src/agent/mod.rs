pub mod context;
pub mod handlers;
pub mod keywords;
pub mod orchestrator;
pub mod overlap;
pub mod prompts;
pub mod sentiment;
pub mod tone;

pub use orchestrator::{Agent, AgentError};
