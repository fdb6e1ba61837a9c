// Shared prompt fragments used by every caller of the LLM client.

/// Appended to user messages that expect the ticket reply schema back.
pub const TICKET_REPLY_SCHEMA_INSTRUCTION: &str = "Output ONLY valid JSON (no markdown, no code blocks).\n\
    Structure: {\"summary\": \"...\", \"reasoning\": \"...\", \"next_step\": \"...\", \
    \"user_learning_tip\": \"...\" or null}";
