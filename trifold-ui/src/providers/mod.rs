//! AI provider clients
//!
//! One module per provider wire format (OpenAI, Anthropic, Gemini)
//! plus `ProviderSet`, which owns the shared HTTP client and fans a
//! query out to all three at once.

pub mod anthropic;
pub mod gemini;
pub mod openai;

use std::time::{Duration, Instant};

use thiserror::Error;
use trifold_common::config::{ProviderConfig, ProvidersConfig};
use trifold_common::model::{AiResponse, Provider, Rating};

const USER_AGENT: &str = concat!("Trifold/", env!("CARGO_PKG_VERSION"));

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";

const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Environment variable carrying each provider's API key
fn env_key_var(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenAi => "OPENAI_API_KEY",
        Provider::Anthropic => "ANTHROPIC_API_KEY",
        Provider::Gemini => "GEMINI_API_KEY",
    }
}

/// Provider client errors
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status from the provider
    #[error("API error (status {0}): {1}")]
    Api(u16, String),

    /// Response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Provider answered but produced no text
    #[error("{0} returned an empty response")]
    EmptyResponse(Provider),

    /// No API key in the environment or config file
    #[error("No API key configured for {0}")]
    MissingKey(Provider),

    /// Provider rejected the API key
    #[error("API key rejected by {0}")]
    InvalidKey(Provider),
}

/// Resolved connection settings for one provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
}

impl ProviderSettings {
    /// Merge config file values with compiled defaults. API keys from
    /// the environment win over TOML.
    fn resolve(provider: Provider, config: &ProviderConfig) -> Self {
        let (default_model, default_base) = match provider {
            Provider::OpenAi => (OPENAI_DEFAULT_MODEL, OPENAI_BASE_URL),
            Provider::Anthropic => (ANTHROPIC_DEFAULT_MODEL, ANTHROPIC_BASE_URL),
            Provider::Gemini => (GEMINI_DEFAULT_MODEL, GEMINI_BASE_URL),
        };

        let api_key = std::env::var(env_key_var(provider))
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| config.api_key.clone());

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base.to_string());

        Self {
            model: config
                .model
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub(crate) fn key(&self, provider: Provider) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .ok_or(ProviderError::MissingKey(provider))
    }
}

/// The three provider clients behind one HTTP client.
pub struct ProviderSet {
    http: reqwest::Client,
    openai: ProviderSettings,
    anthropic: ProviderSettings,
    gemini: ProviderSettings,
    max_tokens: u32,
}

impl ProviderSet {
    /// Build the shared HTTP client and resolve per-provider settings.
    ///
    /// `timeout` bounds each provider request end to end.
    pub fn new(config: &ProvidersConfig, timeout: Duration) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            http,
            openai: ProviderSettings::resolve(Provider::OpenAi, &config.openai),
            anthropic: ProviderSettings::resolve(Provider::Anthropic, &config.anthropic),
            gemini: ProviderSettings::resolve(Provider::Gemini, &config.gemini),
            max_tokens: config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        })
    }

    /// Resolved settings for one provider
    pub fn settings(&self, provider: Provider) -> &ProviderSettings {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Anthropic => &self.anthropic,
            Provider::Gemini => &self.gemini,
        }
    }

    /// Send one query to one provider and return the response text.
    pub async fn ask(&self, provider: Provider, query: &str) -> Result<String, ProviderError> {
        let settings = self.settings(provider);
        match provider {
            Provider::OpenAi => openai::ask(&self.http, settings, query, self.max_tokens).await,
            Provider::Anthropic => {
                anthropic::ask(&self.http, settings, query, self.max_tokens).await
            }
            Provider::Gemini => gemini::ask(&self.http, settings, query, self.max_tokens).await,
        }
    }

    /// Send one query to all three providers concurrently.
    ///
    /// Always returns three entries in the fixed provider order.
    /// Individual failures become per-entry error text so one slow or
    /// broken provider never hides the others.
    pub async fn ask_all(&self, query: &str) -> Vec<AiResponse> {
        let (openai, anthropic, gemini) = tokio::join!(
            self.ask_traced(Provider::OpenAi, query),
            self.ask_traced(Provider::Anthropic, query),
            self.ask_traced(Provider::Gemini, query),
        );
        vec![openai, anthropic, gemini]
    }

    /// One ask with latency measurement, errors folded into the result
    async fn ask_traced(&self, provider: Provider, query: &str) -> AiResponse {
        let model = self.settings(provider).model.clone();
        let started = Instant::now();
        let result = self.ask(provider, query).await;
        let latency_ms = started.elapsed().as_millis() as i64;

        match result {
            Ok(text) => {
                tracing::info!(provider = %provider, latency_ms, "Provider responded");
                AiResponse {
                    provider,
                    model,
                    text,
                    latency_ms,
                    error: None,
                    rating: Rating::default(),
                }
            }
            Err(e) => {
                tracing::warn!(provider = %provider, latency_ms, "Provider request failed: {}", e);
                AiResponse {
                    provider,
                    model,
                    text: String::new(),
                    latency_ms,
                    error: Some(e.to_string()),
                    rating: Rating::default(),
                }
            }
        }
    }
}
