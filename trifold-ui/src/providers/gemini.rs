//! Gemini generateContent client
//!
//! POST {base_url}/v1beta/models/{model}:generateContent with the
//! x-goog-api-key header. The answer text is the first text part of
//! the first candidate. This API uses camelCase field names.

use serde::{Deserialize, Serialize};
use trifold_common::model::Provider;

use super::{ProviderError, ProviderSettings};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Send one query to the Gemini generateContent endpoint
pub(super) async fn ask(
    http: &reqwest::Client,
    settings: &ProviderSettings,
    query: &str,
    max_tokens: u32,
) -> Result<String, ProviderError> {
    let api_key = settings.key(Provider::Gemini)?;
    let url = format!(
        "{}/v1beta/models/{}:generateContent",
        settings.base_url, settings.model
    );

    let request = GenerateRequest {
        contents: vec![Content {
            parts: vec![Part { text: query }],
        }],
        generation_config: GenerationConfig {
            max_output_tokens: max_tokens,
        },
    };

    tracing::debug!(model = %settings.model, "Querying Gemini generateContent");

    let response = http
        .post(&url)
        .header("x-goog-api-key", api_key)
        .json(&request)
        .send()
        .await
        .map_err(|e| ProviderError::Network(e.to_string()))?;

    let status = response.status();
    if status == 401 || status == 403 {
        return Err(ProviderError::InvalidKey(Provider::Gemini));
    }
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api(status.as_u16(), error_text));
    }

    let generate_response: GenerateResponse = response
        .json()
        .await
        .map_err(|e| ProviderError::Parse(e.to_string()))?;

    generate_response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .filter(|text| !text.is_empty())
        .ok_or(ProviderError::EmptyResponse(Provider::Gemini))
}
