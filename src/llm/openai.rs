use opentelemetry::KeyValue;
use serde_json::{Value, json};

use super::{CompletionError, CompletionMode, CompletionProvider};
use crate::telemetry::metrics::GEN_AI_ERROR_COUNT;

const TEMPERATURE: f64 = 0.7;
const TOP_P: f64 = 0.95;

/// Adapter for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatCompletionProvider {
    pub fn new(base_url: &str, api_key: Option<String>, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl CompletionProvider for ChatCompletionProvider {
    #[tracing::instrument(
        name = "gen_ai.chat",
        skip_all,
        fields(
            gen_ai.request.model = %self.model,
            gen_ai.request.mode = mode.as_str(),
        )
    )]
    async fn complete(
        &self,
        system: &str,
        user: &str,
        mode: CompletionMode,
    ) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": TEMPERATURE,
            "top_p": TOP_P,
        });

        let mut request = self.client.post(&url).timeout(mode.timeout()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let result = self.send(request).await;

        if let Err(err) = &result {
            GEN_AI_ERROR_COUNT.add(
                1,
                &[
                    KeyValue::new("gen_ai.request.model", self.model.clone()),
                    KeyValue::new("error.type", error_type(err)),
                ],
            );
        }

        result
    }
}

impl ChatCompletionProvider {
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, CompletionError> {
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.text().await.map_err(transport_error)?;
        let payload: Value = serde_json::from_str(&raw).map_err(|_| CompletionError::Malformed {
            payload: Value::String(raw.clone()),
        })?;

        extract_content(&payload)
    }
}

fn transport_error(err: reqwest::Error) -> CompletionError {
    if err.is_connect() || err.is_timeout() {
        CompletionError::Unreachable(err.to_string())
    } else {
        CompletionError::Api {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            body: err.to_string(),
        }
    }
}

/// Locate the first candidate's message content. Anything short of a string
/// there is a shape error carrying the full payload.
fn extract_content(payload: &Value) -> Result<String, CompletionError> {
    payload
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| CompletionError::Malformed {
            payload: payload.clone(),
        })
}

fn error_type(err: &CompletionError) -> &'static str {
    match err {
        CompletionError::Unreachable(_) => "unreachable",
        CompletionError::Api { .. } => "api_error",
        CompletionError::Malformed { .. } => "malformed_response",
    }
}
