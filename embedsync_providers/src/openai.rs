use async_trait::async_trait;
use embedsync_core::{ChatMessage, ChatParams, LLMProvider, LLMResponse, Usage};
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

/// Client for an OpenAI-compatible chat and embeddings API.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    /// Convert f64 to f32 for embedding values
    /// Precision loss is acceptable for ML embeddings
    #[expect(clippy::cast_possible_truncation, reason = "ML embeddings use f32")]
    const fn f64_to_f32(x: f64) -> f32 {
        x as f32
    }

    pub fn new(api_key: String) -> Self {
        info!("Creating OpenAiProvider");
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn post(&self, path: &str, body: &serde_json::Value) -> anyhow::Result<serde_json::Value> {
        let response = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;
        Ok(response)
    }
}

fn token_count(usage: &serde_json::Map<String, serde_json::Value>, key: &str) -> u32 {
    u32::try_from(usage.get(key).and_then(serde_json::Value::as_u64).unwrap_or(0)).unwrap_or(0)
}

#[async_trait]
impl LLMProvider for OpenAiProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        params: &ChatParams,
    ) -> anyhow::Result<LLMResponse> {
        let request = json!({
            "model": params.model,
            "messages": messages,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        });

        debug!("Sending chat request: model={}", params.model);
        let response = self.post("chat/completions", &request).await?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing content"))?
            .trim()
            .to_string();

        let usage = response["usage"].as_object().map(|u| Usage {
            prompt_tokens: token_count(u, "prompt_tokens"),
            completion_tokens: token_count(u, "completion_tokens"),
            total_tokens: token_count(u, "total_tokens"),
        });

        Ok(LLMResponse { content, usage })
    }

    async fn embed(&self, text: &str, model: &str) -> anyhow::Result<Vec<f32>> {
        let response = self
            .post(
                "embeddings",
                &json!({
                    "model": model,
                    "input": text,
                    "encoding_format": "float",
                }),
            )
            .await?;

        let embedding = response["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing embedding"))?
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(Self::f64_to_f32)
                    .ok_or_else(|| anyhow::anyhow!("Invalid embedding value"))
            })
            .collect::<Result<Vec<f32>, _>>()?;

        Ok(embedding)
    }
}
