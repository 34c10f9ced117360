//! Domain models shared across the Trifold crates
//!
//! The shapes here are the single source of truth for both storage
//! backends and the HTTP API: whatever the SQLite store or the JSON
//! archive holds serializes to exactly these structures.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// One of the three AI providers a query fans out to.
///
/// The identifier strings ("openai", "anthropic", "gemini") are stable:
/// they appear in API payloads, the settings table, and stored history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "gemini")]
    Gemini,
}

impl Provider {
    /// Fixed provider lineup, in display order
    pub const ALL: [Provider; 3] = [Provider::OpenAi, Provider::Anthropic, Provider::Gemini];

    /// Stable identifier used in API payloads and storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Gemini => "gemini",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            "gemini" => Ok(Provider::Gemini),
            other => Err(Error::InvalidInput(format!("unknown provider '{}'", other))),
        }
    }
}

/// One of the five categories a response can be rated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingCategory {
    Accuracy,
    Relevance,
    Completeness,
    Concise,
    Unbiased,
}

impl RatingCategory {
    /// All rating categories, in display order
    pub const ALL: [RatingCategory; 5] = [
        RatingCategory::Accuracy,
        RatingCategory::Relevance,
        RatingCategory::Completeness,
        RatingCategory::Concise,
        RatingCategory::Unbiased,
    ];

    /// Stable identifier; also the rating column name in the
    /// responses table
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingCategory::Accuracy => "accuracy",
            RatingCategory::Relevance => "relevance",
            RatingCategory::Completeness => "completeness",
            RatingCategory::Concise => "concise",
            RatingCategory::Unbiased => "unbiased",
        }
    }
}

impl fmt::Display for RatingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RatingCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accuracy" => Ok(RatingCategory::Accuracy),
            "relevance" => Ok(RatingCategory::Relevance),
            "completeness" => Ok(RatingCategory::Completeness),
            "concise" => Ok(RatingCategory::Concise),
            "unbiased" => Ok(RatingCategory::Unbiased),
            other => Err(Error::InvalidInput(format!(
                "unknown rating category '{}'",
                other
            ))),
        }
    }
}

/// Per-response user rating.
///
/// Each category is tri-state: `Some(true)` thumbs-up, `Some(false)`
/// thumbs-down, `None` not yet rated. A fresh response starts with all
/// five unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    #[serde(default)]
    pub accuracy: Option<bool>,
    #[serde(default)]
    pub relevance: Option<bool>,
    #[serde(default)]
    pub completeness: Option<bool>,
    #[serde(default)]
    pub concise: Option<bool>,
    #[serde(default)]
    pub unbiased: Option<bool>,
}

impl Rating {
    /// Value of one category
    pub fn get(&self, category: RatingCategory) -> Option<bool> {
        match category {
            RatingCategory::Accuracy => self.accuracy,
            RatingCategory::Relevance => self.relevance,
            RatingCategory::Completeness => self.completeness,
            RatingCategory::Concise => self.concise,
            RatingCategory::Unbiased => self.unbiased,
        }
    }

    /// Set one category; `None` returns it to unknown
    pub fn set(&mut self, category: RatingCategory, value: Option<bool>) {
        match category {
            RatingCategory::Accuracy => self.accuracy = value,
            RatingCategory::Relevance => self.relevance = value,
            RatingCategory::Completeness => self.completeness = value,
            RatingCategory::Concise => self.concise = value,
            RatingCategory::Unbiased => self.unbiased = value,
        }
    }
}

/// One provider's answer to a query.
///
/// Exactly one of `text` and `error` carries the outcome: a successful
/// request has non-empty text and no error, a failed one has empty
/// text and an error message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    pub provider: Provider,
    /// Concrete model name the provider was asked with
    pub model: String,
    #[serde(default)]
    pub text: String,
    /// Wall-clock request duration in milliseconds
    #[serde(default)]
    pub latency_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub rating: Rating,
}

/// One history entry: a query plus the responses it produced.
///
/// `responses` holds at most one entry per provider, in the fixed
/// provider order when produced by the fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub query: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub responses: Vec<AiResponse>,
}

impl HistoryItem {
    /// New unsaved item with a fresh id and timestamp
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            query: query.into(),
            created_at: Utc::now(),
            responses: Vec::new(),
        }
    }
}

/// Which store holds history: the SQLite database or the JSON archive
/// file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Database,
    Archive,
}

impl StorageBackend {
    /// Stable identifier used in API payloads and the settings table
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Database => "database",
            StorageBackend::Archive => "archive",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "database" => Ok(StorageBackend::Database),
            "archive" => Ok(StorageBackend::Archive),
            other => Err(Error::InvalidInput(format!(
                "unknown storage backend '{}'",
                other
            ))),
        }
    }
}
