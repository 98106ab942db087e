use super::CompletionProvider;
use crate::model::Completion;
use crate::prompt::concat_prompts;
use async_trait::async_trait;
use serde_json::json;
use std::time::Instant;

const API_BASE: &str = "https://api.openai.com/v1";
const TEMPERATURE: f32 = 0.0;
const MAX_TOKENS: u32 = 150;

// Single-prompt completion models; everything else goes through the chat
// endpoint.
const LEGACY_MODELS: &[&str] = &[
    "openai/text-ada-001",
    "openai/text-babbage-001",
    "openai/text-curie-001",
    "openai/text-davinci-002",
    "openai/text-davinci-003",
];

const CHAT_MODELS: &[&str] = &[
    "openai/gpt-3.5-turbo",
    "openai/gpt-3.5-turbo-0301",
    "openai/gpt-4",
    "openai/gpt-4-0314",
    "openai/gpt-4-32k",
    "openai/gpt-4-32k-0314",
];

pub struct OpenAiProvider {
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("OPENAI_API_KEY").ok())
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
            .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY is not set"))?;
        let vendor_model = model.trim_start_matches("openai/");

        let (url, body) = if is_legacy(model) {
            (
                format!("{}/completions", API_BASE),
                json!({
                    "model": vendor_model,
                    "prompt": concat_prompts(system_prompt, input_prompt),
                    "temperature": TEMPERATURE,
                    "max_tokens": MAX_TOKENS,
                }),
            )
        } else {
            (
                format!("{}/chat/completions", API_BASE),
                json!({
                    "model": vendor_model,
                    "messages": chat_messages(model, system_prompt, input_prompt),
                    "temperature": TEMPERATURE,
                    "max_tokens": MAX_TOKENS,
                }),
            )
        };

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("{}", reduce_error_body(status, &body));
        }

        let data: serde_json::Value = resp.json().await?;
        tracing::debug!(event = "provider_response", provider = "openai", %data);

        let pointer = if is_legacy(model) {
            "/choices/0/text"
        } else {
            "/choices/0/message/content"
        };
        let text = data
            .pointer(pointer)
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("OpenAI response missing completion text"))?;
        Ok(text.to_string())
    }
}

fn is_legacy(model: &str) -> bool {
    LEGACY_MODELS.contains(&model)
}

// gpt-3.5-turbo tends to ignore `system` messages, so its system prompt is
// sent with the `user` role instead.
fn chat_messages(model: &str, system_prompt: &str, input_prompt: &str) -> serde_json::Value {
    let system_role = if model.contains("gpt-3.5-turbo") {
        "user"
    } else {
        "system"
    };
    json!([
        { "role": system_role, "content": system_prompt },
        { "role": "user", "content": input_prompt },
    ])
}

fn reduce_error_body(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(data) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = data.pointer("/error/message").and_then(|v| v.as_str()) {
            return msg.to_string();
        }
        if let Some(code) = data.pointer("/error/code").and_then(|v| v.as_str()) {
            return code.to_string();
        }
    }
    format!("OpenAI API error ({}): {}", status, body)
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, model: &str, system_prompt: &str, input_prompt: &str) -> Completion {
        let start = Instant::now();
        match self.request(model, system_prompt, input_prompt).await {
            Ok(text) => Completion::ok(text, start.elapsed().as_millis() as u64),
            Err(e) => Completion::failed(e.to_string()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn models(&self) -> Vec<String> {
        CHAT_MODELS
            .iter()
            .chain(LEGACY_MODELS)
            .map(|m| m.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_models_are_detected() {
        assert!(is_legacy("openai/text-davinci-003"));
        assert!(!is_legacy("openai/gpt-4"));
        assert!(!is_legacy("openai/gpt-3.5-turbo"));
    }

    #[test]
    fn turbo_system_role_is_downgraded() {
        let messages = chat_messages("openai/gpt-3.5-turbo", "sys", "inp");
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "sys");
        assert_eq!(messages[1]["role"], "user");

        let messages = chat_messages("openai/gpt-4", "sys", "inp");
        assert_eq!(messages[0]["role"], "system");
    }

    #[test]
    fn error_bodies_reduce_to_a_message() {
        let status = reqwest::StatusCode::TOO_MANY_REQUESTS;
        assert_eq!(
            reduce_error_body(status, r#"{"error": {"message": "rate limited"}}"#),
            "rate limited"
        );
        assert_eq!(
            reduce_error_body(status, r#"{"error": {"code": "rate_limit_exceeded"}}"#),
            "rate_limit_exceeded"
        );
        assert!(reduce_error_body(status, "not json").contains("OpenAI API error"));
    }

    #[tokio::test]
    async fn missing_key_becomes_a_completion_error() {
        let provider = OpenAiProvider::new(None);
        let completion = provider.complete("openai/gpt-4", "sys", "inp").await;
        assert!(completion.text.is_none());
        assert_eq!(completion.error.as_deref(), Some("OPENAI_API_KEY is not set"));
        assert!(completion.duration_ms.is_none());
    }
}
