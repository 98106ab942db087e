use super::CompletionProvider;
use crate::model::Completion;
use crate::prompt::concat_prompts;
use async_trait::async_trait;
use serde_json::json;
use std::time::Instant;

// Served through a self-hosted inference endpoint, unauthenticated in this
// deployment.
const HUGGINGFACE_MODELS: &[&str] = &["tiiuae/falcon-7b-instruct"];

pub struct HuggingFaceProvider {
    endpoint: Option<String>,
    client: reqwest::Client,
}

impl HuggingFaceProvider {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("LLM_API_ENDPOINT").ok())
    }

    async fn request(
        &self,
        model: &str,
        system_prompt: &str,
        input_prompt: &str,
    ) -> anyhow::Result<String> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("LLM_API_ENDPOINT is not set"))?;

        let body = json!({
            "model": model,
            "prompt": concat_prompts(system_prompt, input_prompt),
        });

        let resp = self.client.post(endpoint).json(&body).send().await?;
        let data: serde_json::Value = resp.json().await?;
        tracing::debug!(event = "provider_response", provider = "huggingface", %data);

        let text = data
            .get("completion")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("inference response missing `completion` field"))?;
        Ok(text.to_string())
    }
}

#[async_trait]
impl CompletionProvider for HuggingFaceProvider {
    async fn complete(&self, model: &str, system_prompt: &str, input_prompt: &str) -> Completion {
        let start = Instant::now();
        match self.request(model, system_prompt, input_prompt).await {
            Ok(text) => Completion::ok(text, start.elapsed().as_millis() as u64),
            Err(e) => Completion::failed(e.to_string()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "huggingface"
    }

    fn models(&self) -> Vec<String> {
        HUGGINGFACE_MODELS.iter().map(|m| m.to_string()).collect()
    }
}
