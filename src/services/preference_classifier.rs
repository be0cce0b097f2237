use std::sync::Arc;

use tracing::{debug, warn};

use crate::content::{most_frequent, ContentType};
use crate::services::llm_provider::{LLMError, TextGenerator};

/// Infers a learner's favourite content type from their interaction history
/// by asking an external text model.
#[derive(Clone)]
pub struct PreferenceClassifier {
    generator: Arc<dyn TextGenerator>,
    mock: bool,
}

impl PreferenceClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator, mock: false }
    }

    /// Answers locally from label counts instead of calling the model.
    pub fn with_mock(mut self, mock: bool) -> Self {
        self.mock = mock;
        self
    }

    pub fn is_available(&self) -> bool {
        self.mock || self.generator.is_available()
    }

    /// Returns the model's reply verbatim. The reply is expected to be one of
    /// `audio`, `written` or `visual` but is not checked here.
    pub async fn classify(&self, interactions: &[ContentType]) -> Result<String, LLMError> {
        if self.mock {
            let favourite = most_frequent(interactions);
            debug!(count = interactions.len(), %favourite, "mock preference classification");
            return Ok(favourite.to_string());
        }

        let prompt = build_prompt(interactions);
        match self.generator.generate(prompt).await {
            Ok(text) => {
                debug!(count = interactions.len(), reply = %text, "preference classified");
                Ok(text)
            }
            Err(err) => {
                warn!(error = %err, count = interactions.len(), "preference classification failed");
                Err(err)
            }
        }
    }
}

pub fn build_prompt(interactions: &[ContentType]) -> String {
    let joined = interactions
        .iter()
        .map(ContentType::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "User interacted with the following content types: {joined}.\n\
         Determine the user's favorite type and give a score out of 100 for each type.\n\
         Respond with exactly one word (audio, written or visual) only, \
         with no punctuation and no explanation."
    )
}
