pub mod llm_provider;
pub mod preference_classifier;
