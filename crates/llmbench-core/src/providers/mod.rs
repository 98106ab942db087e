use crate::model::Completion;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod cohere;
pub mod huggingface;
pub mod openai;

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends a rendered prompt pair to the vendor endpoint. Infallible by
    /// contract: transport and API errors are folded into
    /// `Completion::error` so callers never need error handling around
    /// provider calls.
    async fn complete(&self, model: &str, system_prompt: &str, input_prompt: &str) -> Completion;

    fn provider_name(&self) -> &'static str;

    /// Model identifiers this provider serves, vendor-prefixed.
    fn models(&self) -> Vec<String>;
}

/// Model identifier -> provider instance, built once at process startup.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    by_model: BTreeMap<String, Arc<dyn CompletionProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn CompletionProvider>) {
        for model in provider.models() {
            self.by_model.insert(model, provider.clone());
        }
    }

    pub fn lookup(&self, model: &str) -> Option<Arc<dyn CompletionProvider>> {
        self.by_model.get(model).cloned()
    }

    pub fn available_models(&self) -> Vec<String> {
        self.by_model.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider {
        name: &'static str,
        model_ids: &'static [&'static str],
    }

    #[async_trait]
    impl CompletionProvider for FixedProvider {
        async fn complete(&self, _model: &str, _system: &str, _input: &str) -> Completion {
            Completion::ok("ok".to_string(), 1)
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }

        fn models(&self) -> Vec<String> {
            self.model_ids.iter().map(|m| m.to_string()).collect()
        }
    }

    #[test]
    fn registry_maps_models_to_providers() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(FixedProvider {
            name: "a",
            model_ids: &["a/one", "a/two"],
        }));
        registry.register(Arc::new(FixedProvider {
            name: "b",
            model_ids: &["b/one"],
        }));

        assert_eq!(registry.lookup("a/two").unwrap().provider_name(), "a");
        assert_eq!(registry.lookup("b/one").unwrap().provider_name(), "b");
        assert!(registry.lookup("c/one").is_none());
        assert_eq!(registry.available_models(), ["a/one", "a/two", "b/one"]);
    }
}
