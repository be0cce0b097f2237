use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::services::llm_provider::LLMProvider;
use crate::services::preference_classifier::PreferenceClassifier;

#[derive(Debug)]
pub struct RuntimeConfig {
    pub llm_enabled: AtomicBool,
    pub llm_mock: AtomicBool,
}

impl RuntimeConfig {
    pub fn new(llm_enabled: bool, llm_mock: bool) -> Self {
        Self {
            llm_enabled: AtomicBool::new(llm_enabled),
            llm_mock: AtomicBool::new(llm_mock),
        }
    }

    pub fn is_llm_enabled(&self) -> bool {
        self.llm_enabled.load(Ordering::Relaxed)
    }

    pub fn is_llm_mock(&self) -> bool {
        self.llm_mock.load(Ordering::Relaxed)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(true, false)
    }
}

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    classifier: Arc<PreferenceClassifier>,
    runtime: Arc<RuntimeConfig>,
}

impl AppState {
    pub fn new(classifier: PreferenceClassifier, runtime: RuntimeConfig) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            classifier: Arc::new(classifier),
            runtime: Arc::new(runtime),
        }
    }

    pub fn from_env(llm_enabled: bool, llm_mock: bool) -> Self {
        let classifier = PreferenceClassifier::new(Arc::new(LLMProvider::from_env()));
        Self::new(classifier, RuntimeConfig::new(llm_enabled, llm_mock))
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    /// Classifier honouring the current runtime mock switch.
    pub fn classifier(&self) -> PreferenceClassifier {
        (*self.classifier).clone().with_mock(self.runtime.is_llm_mock())
    }

    pub fn runtime(&self) -> Arc<RuntimeConfig> {
        Arc::clone(&self.runtime)
    }
}
