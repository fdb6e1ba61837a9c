//! Sentiment keyword tables: trigger substrings per sentiment category.
//!
//! Tables are plain immutable values handed to the agent at construction.
//! Tuning happens by building a new table (`with_keyword`, `without_keyword`,
//! `with_overrides`), never by mutating one that is already in use.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::models::Sentiment;

const FRUSTRATED_KEYWORDS: &[&str] = &[
    "frustrat",
    "angry",
    "mad",
    "upset",
    "ugh",
    "argh",
    "annoyed",
    "tired",
    "exasperat",
    "fed up",
    "enough",
    "seriously",
    "ridiculous",
    "unbelievable",
    "impossible",
    "broken",
    "doesn't work",
    "still not working",
    "been trying all",
];

const SATISFIED_KEYWORDS: &[&str] = &[
    "thanks",
    "thank you",
    "awesome",
    "great",
    "excellent",
    "perfect",
    "worked",
    "fixed",
    "solved",
    "finally",
    "yes",
    "yay",
    "fantastic",
    "amazing",
    "appreciated",
    "helpful",
    "exactly",
];

const CONFUSED_KEYWORDS: &[&str] = &[
    "confus",
    "don't understand",
    "what",
    "huh",
    "mean",
    "unclear",
    "lost",
    "explain",
    "again",
    "sorry",
    "confused",
    "not sure",
    "didn't catch",
    "lost you",
    "slow down",
];

/// Categories that carry keywords, in detection priority order.
pub const DETECTION_ORDER: [Sentiment; 3] = [
    Sentiment::Frustrated,
    Sentiment::Satisfied,
    Sentiment::Confused,
];

#[derive(Debug, Error, PartialEq)]
pub enum KeywordError {
    #[error("Sentiment '{0}' has no keyword table (available: frustrated, satisfied, confused)")]
    UnknownCategory(Sentiment),

    #[error("Keyword must not be empty")]
    EmptyKeyword,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordTables {
    tables: BTreeMap<Sentiment, BTreeSet<String>>,
}

impl Default for KeywordTables {
    fn default() -> Self {
        let table = |words: &[&str]| -> BTreeSet<String> {
            words.iter().map(|w| w.to_string()).collect()
        };
        let mut tables = BTreeMap::new();
        tables.insert(Sentiment::Frustrated, table(FRUSTRATED_KEYWORDS));
        tables.insert(Sentiment::Satisfied, table(SATISFIED_KEYWORDS));
        tables.insert(Sentiment::Confused, table(CONFUSED_KEYWORDS));
        Self { tables }
    }
}

impl KeywordTables {
    pub fn keywords(&self, sentiment: Sentiment) -> Result<&BTreeSet<String>, KeywordError> {
        self.tables
            .get(&sentiment)
            .ok_or(KeywordError::UnknownCategory(sentiment))
    }

    /// True if any keyword for `sentiment` is a substring of `text_lower`.
    /// The caller lower-cases the text once for all categories.
    pub fn matches(&self, sentiment: Sentiment, text_lower: &str) -> bool {
        self.tables
            .get(&sentiment)
            .is_some_and(|words| words.iter().any(|w| text_lower.contains(w.as_str())))
    }

    pub fn with_keyword(mut self, sentiment: Sentiment, keyword: &str) -> Result<Self, KeywordError> {
        let keyword = normalize(keyword)?;
        self.tables
            .get_mut(&sentiment)
            .ok_or(KeywordError::UnknownCategory(sentiment))?
            .insert(keyword);
        Ok(self)
    }

    pub fn without_keyword(
        mut self,
        sentiment: Sentiment,
        keyword: &str,
    ) -> Result<Self, KeywordError> {
        let keyword = keyword.trim().to_lowercase();
        self.tables
            .get_mut(&sentiment)
            .ok_or(KeywordError::UnknownCategory(sentiment))?
            .remove(&keyword);
        Ok(self)
    }

    /// Replaces whole categories. Categories not named keep their current set.
    pub fn with_overrides(
        mut self,
        overrides: BTreeMap<Sentiment, Vec<String>>,
    ) -> Result<Self, KeywordError> {
        for (sentiment, words) in overrides {
            if !self.tables.contains_key(&sentiment) {
                return Err(KeywordError::UnknownCategory(sentiment));
            }
            let set = words
                .iter()
                .map(|w| normalize(w))
                .collect::<Result<BTreeSet<_>, _>>()?;
            self.tables.insert(sentiment, set);
        }
        Ok(self)
    }

    /// Builds tables from the defaults plus a JSON override file
    /// (`{"frustrated": ["..."], ...}`).
    pub fn from_override_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read keyword file {}", path.display()))?;
        let named: BTreeMap<String, Vec<String>> = serde_json::from_str(&raw)
            .with_context(|| format!("Keyword file {} is not valid JSON", path.display()))?;

        let mut overrides = BTreeMap::new();
        for (name, words) in named {
            let sentiment: Sentiment = name
                .parse()
                .with_context(|| format!("Keyword file {}", path.display()))?;
            overrides.insert(sentiment, words);
        }
        Ok(Self::default().with_overrides(overrides)?)
    }

    pub fn all_keywords(&self) -> BTreeSet<&str> {
        self.tables
            .values()
            .flat_map(|words| words.iter().map(String::as_str))
            .collect()
    }
}

fn normalize(keyword: &str) -> Result<String, KeywordError> {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return Err(KeywordError::EmptyKeyword);
    }
    Ok(keyword)
}
