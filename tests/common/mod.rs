use std::sync::Arc;

use adaptive_learning_backend::services::llm_provider::{LLMError, TextGenerator};
use adaptive_learning_backend::services::preference_classifier::PreferenceClassifier;
use adaptive_learning_backend::state::{AppState, RuntimeConfig};
use axum::Router;
use futures::future::BoxFuture;
use parking_lot::Mutex;

/// Text model double: answers with a fixed reply and records every prompt.
pub struct FixedModel {
    reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FixedModel {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        })
    }
}

impl TextGenerator for FixedModel {
    fn generate(&self, prompt: String) -> BoxFuture<'_, Result<String, LLMError>> {
        self.prompts.lock().push(prompt);
        let reply = self.reply.clone();
        Box::pin(async move { reply.ok_or(LLMError::NotConfigured("LLM_API_KEY")) })
    }
}

pub fn create_test_app(model: Arc<FixedModel>) -> Router {
    let state = AppState::new(PreferenceClassifier::new(model), RuntimeConfig::default());
    adaptive_learning_backend::build_app(state)
}

pub fn create_mock_app() -> Router {
    let state = AppState::new(
        PreferenceClassifier::new(FixedModel::failing()),
        RuntimeConfig::new(true, true),
    );
    adaptive_learning_backend::build_app(state)
}

pub fn create_disabled_app(model: Arc<FixedModel>) -> Router {
    let state = AppState::new(PreferenceClassifier::new(model), RuntimeConfig::new(false, false));
    adaptive_learning_backend::build_app(state)
}
