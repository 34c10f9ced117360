//! Anthropic Messages API client
//!
//! POST {base_url}/v1/messages with x-api-key and anthropic-version
//! headers. The answer text is the first text block of the content
//! array; tool-use and other block types are skipped.

use serde::{Deserialize, Serialize};
use trifold_common::model::Provider;

use super::{ProviderError, ProviderSettings};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    // Mandatory for this API, unlike the other two providers
    max_tokens: u32,
    messages: Vec<MessageParam<'a>>,
}

#[derive(Debug, Serialize)]
struct MessageParam<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// Send one query to the Anthropic messages endpoint
pub(super) async fn ask(
    http: &reqwest::Client,
    settings: &ProviderSettings,
    query: &str,
    max_tokens: u32,
) -> Result<String, ProviderError> {
    let api_key = settings.key(Provider::Anthropic)?;
    let url = format!("{}/v1/messages", settings.base_url);

    let request = MessagesRequest {
        model: &settings.model,
        max_tokens,
        messages: vec![MessageParam {
            role: "user",
            content: query,
        }],
    };

    tracing::debug!(model = %settings.model, "Querying Anthropic messages endpoint");

    let response = http
        .post(&url)
        .header("x-api-key", api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(&request)
        .send()
        .await
        .map_err(|e| ProviderError::Network(e.to_string()))?;

    let status = response.status();
    if status == 401 || status == 403 {
        return Err(ProviderError::InvalidKey(Provider::Anthropic));
    }
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api(status.as_u16(), error_text));
    }

    let messages_response: MessagesResponse = response
        .json()
        .await
        .map_err(|e| ProviderError::Parse(e.to_string()))?;

    messages_response
        .content
        .into_iter()
        .find(|block| block.block_type == "text")
        .and_then(|block| block.text)
        .filter(|text| !text.is_empty())
        .ok_or(ProviderError::EmptyResponse(Provider::Anthropic))
}
