use super::CompletionProvider;
use crate::model::Completion;
use crate::prompt::concat_prompts;
use async_trait::async_trait;
use serde_json::json;
use std::time::Instant;

const GENERATE_URL: &str = "https://api.cohere.ai/v1/generate";
const MAX_TOKENS: u32 = 150;

const COHERE_MODELS: &[&str] = &[
    "cohere/command",
    "cohere/command-light",
    "cohere/base",
    "cohere/base-light",
];

pub struct CohereProvider {
    api_key: Option<String>,
    client: reqwest::Client,
}

impl CohereProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("COHERE_API_KEY").ok())
    }

    async fn request(
        &self,
        model: &str,
        system_prompt: &str,
        input_prompt: &str,
    ) -> anyhow::Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("COHERE_API_KEY is not set"))?;

        let body = json!({
            "model": model.trim_start_matches("cohere/"),
            "prompt": concat_prompts(system_prompt, input_prompt),
            "max_tokens": MAX_TOKENS,
            "truncate": "END",
            "temperature": 0,
        });

        let resp = self
            .client
            .post(GENERATE_URL)
            .header("Accept", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await?;

        let data: serde_json::Value = resp.json().await?;
        tracing::debug!(event = "provider_response", provider = "cohere", %data);

        // error bodies come back without a `generations` array; surface them
        // whole
        match data.pointer("/generations/0/text").and_then(|v| v.as_str()) {
            Some(text) => Ok(text.to_string()),
            None => anyhow::bail!("{}", serde_json::to_string(&data)?),
        }
    }
}

#[async_trait]
impl CompletionProvider for CohereProvider {
    async fn complete(&self, model: &str, system_prompt: &str, input_prompt: &str) -> Completion {
        let start = Instant::now();
        match self.request(model, system_prompt, input_prompt).await {
            Ok(text) => Completion::ok(text, start.elapsed().as_millis() as u64),
            Err(e) => Completion::failed(e.to_string()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "cohere"
    }

    fn models(&self) -> Vec<String> {
        COHERE_MODELS.iter().map(|m| m.to_string()).collect()
    }
}
