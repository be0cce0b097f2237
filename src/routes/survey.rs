use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{error, warn};

use crate::content::ContentType;
use crate::response::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InteractionBatch {
    pub interactions: Vec<ContentType>,
}

/// `POST /api/student/survey`: the body is the model's reply as a JSON string.
pub async fn classify_interactions(
    State(state): State<AppState>,
    Json(batch): Json<InteractionBatch>,
) -> Response {
    if !state.runtime().is_llm_enabled() {
        warn!(count = batch.interactions.len(), "preference classification disabled");
        return AppError::internal("preference classification disabled").into_response();
    }

    let classifier = state.classifier();

    match classifier.classify(&batch.interactions).await {
        Ok(text) => Json(text).into_response(),
        Err(err) => {
            error!(error = %err, "preference classifier error");
            AppError::internal(err.to_string()).into_response()
        }
    }
}
