//! OpenAI chat completion client
//!
//! POST {base_url}/chat/completions with bearer authentication. The
//! answer text is the first choice's message content.

use serde::{Deserialize, Serialize};
use trifold_common::model::Provider;

use super::{ProviderError, ProviderSettings};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Send one query to the OpenAI chat completion endpoint
pub(super) async fn ask(
    http: &reqwest::Client,
    settings: &ProviderSettings,
    query: &str,
    max_tokens: u32,
) -> Result<String, ProviderError> {
    let api_key = settings.key(Provider::OpenAi)?;
    let url = format!("{}/chat/completions", settings.base_url);

    let request = ChatRequest {
        model: &settings.model,
        messages: vec![ChatMessage {
            role: "user",
            content: query,
        }],
        max_tokens,
    };

    tracing::debug!(model = %settings.model, "Querying OpenAI chat completion");

    let response = http
        .post(&url)
        .bearer_auth(api_key)
        .json(&request)
        .send()
        .await
        .map_err(|e| ProviderError::Network(e.to_string()))?;

    let status = response.status();
    if status == 401 || status == 403 {
        return Err(ProviderError::InvalidKey(Provider::OpenAi));
    }
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api(status.as_u16(), error_text));
    }

    let chat_response: ChatResponse = response
        .json()
        .await
        .map_err(|e| ProviderError::Parse(e.to_string()))?;

    chat_response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.is_empty())
        .ok_or(ProviderError::EmptyResponse(Provider::OpenAi))
}
