use std::time::Duration;

use futures::future::BoxFuture;
use serde::Serialize;

use super::RecorderError;
use crate::content::ContentType;

pub const CLASSIFY_PATH: &str = "/api/student/survey";

/// Transport to the preference classifier.
pub trait ClassifierClient: Send + Sync {
    fn classify(&self, interactions: Vec<ContentType>) -> BoxFuture<'_, Result<String, RecorderError>>;
}

#[derive(Debug, Serialize)]
pub struct ClassifyRequest<'a> {
    pub interactions: &'a [ContentType],
}

#[derive(Clone)]
pub struct HttpClassifierClient {
    client: reqwest::Client,
    url: String,
}

impl HttpClassifierClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            url: format!("{}{CLASSIFY_PATH}", base_url.trim().trim_end_matches('/')),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ClassifierClient for HttpClassifierClient {
    fn classify(&self, interactions: Vec<ContentType>) -> BoxFuture<'_, Result<String, RecorderError>> {
        Box::pin(async move {
            let resp = self
                .client
                .post(&self.url)
                .json(&ClassifyRequest { interactions: &interactions })
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                return Err(RecorderError::HttpStatus(status));
            }

            let body = resp.text().await?;
            Ok(decode_reply(&body))
        })
    }
}

/// The endpoint answers with a JSON string; fall back to the raw body.
fn decode_reply(body: &str) -> String {
    serde_json::from_str::<String>(body).unwrap_or_else(|_| body.to_string())
}
