pub mod output;
pub mod ticket;

pub use output::{AgentOutput, AgentOutputDraft, Tone};
pub use ticket::{ContextEntry, Phase, Sentiment, TicketState, ValidationError};
