use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::llm_client::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub llm_model: String,
    pub llm_max_output_tokens: u32,
    pub llm_max_retries: u32,
    pub llm_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
    /// JSON object of `ticket_id → ticket` loaded into the store at startup.
    pub tickets_seed_path: Option<PathBuf>,
    /// JSON object of `category → [keywords]` replacing those default lists.
    pub sentiment_keywords_path: Option<PathBuf>,
    /// Plain-text file replacing the built-in system prompt.
    pub system_prompt_path: Option<PathBuf>,
    pub enforce_no_repetition: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            anthropic_api_key: var("ANTHROPIC_API_KEY").with_context(|| {
                "Required environment variable 'ANTHROPIC_API_KEY' is not set".to_string()
            })?,
            llm_model: var("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            llm_max_output_tokens: parse_or(
                "LLM_MAX_OUTPUT_TOKENS",
                var("LLM_MAX_OUTPUT_TOKENS"),
                DEFAULT_MAX_TOKENS,
            )?,
            llm_max_retries: parse_or("LLM_MAX_RETRIES", var("LLM_MAX_RETRIES"), 3)?,
            llm_timeout_secs: parse_or("LLM_TIMEOUT_SECS", var("LLM_TIMEOUT_SECS"), 120)?,
            port: parse_or("PORT", var("PORT"), 8080)?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            tickets_seed_path: var("TICKETS_SEED_PATH").map(PathBuf::from),
            sentiment_keywords_path: var("SENTIMENT_KEYWORDS_PATH").map(PathBuf::from),
            system_prompt_path: var("SYSTEM_PROMPT_PATH").map(PathBuf::from),
            enforce_no_repetition: match var("ENFORCE_NO_REPETITION") {
                Some(raw) => parse_flag("ENFORCE_NO_REPETITION", &raw)?,
                None => false,
            },
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("{key} must be true or false, got '{raw}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("ANTHROPIC_API_KEY", "sk-test")]).unwrap();
        assert_eq!(config.llm_model, DEFAULT_MODEL);
        assert_eq!(config.llm_max_output_tokens, 1024);
        assert_eq!(config.llm_max_retries, 3);
        assert_eq!(config.llm_timeout_secs, 120);
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
        assert!(config.tickets_seed_path.is_none());
        assert!(config.sentiment_keywords_path.is_none());
        assert!(config.system_prompt_path.is_none());
        assert!(!config.enforce_no_repetition);
    }

    #[test]
    fn test_missing_api_key_is_named() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));

        let err = config_from(&[("ANTHROPIC_API_KEY", "   ")]).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("LLM_MODEL", "claude-haiku-4-5"),
            ("LLM_MAX_OUTPUT_TOKENS", "512"),
            ("PORT", "9090"),
            ("TICKETS_SEED_PATH", "data/tickets.json"),
            ("ENFORCE_NO_REPETITION", "true"),
        ])
        .unwrap();
        assert_eq!(config.llm_model, "claude-haiku-4-5");
        assert_eq!(config.llm_max_output_tokens, 512);
        assert_eq!(config.port, 9090);
        assert_eq!(
            config.tickets_seed_path,
            Some(PathBuf::from("data/tickets.json"))
        );
        assert!(config.enforce_no_repetition);
    }

    #[test]
    fn test_malformed_values_name_the_variable() {
        let err = config_from(&[("ANTHROPIC_API_KEY", "sk-test"), ("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        let err = config_from(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("ENFORCE_NO_REPETITION", "sometimes"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("ENFORCE_NO_REPETITION"));
    }
}
