//! Chat handler: one question in, one answer with provenance out

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use answerforge_common::{
    errors::{AppError, Result},
    metrics::RequestMetrics,
    resolver::SourceTag,
};

/// Chat request
#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    /// Missing is treated like empty and rejected by the resolver
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub question: String,
}

/// Chat response
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    /// Human-readable tier label
    pub source: String,
    pub provenance: Provenance,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct Provenance {
    pub tier: SourceTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_confidence: Option<f64>,
}

/// Answer a question
pub async fn chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>> {
    let metrics = RequestMetrics::start("POST", "/chat");

    let result = answer(&state, payload).await;
    let status = match &result {
        Ok(_) => 200,
        Err(e) => e.status_code().as_u16(),
    };
    metrics.finish(status);

    result.map(Json)
}

async fn answer(
    state: &AppState,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<ChatResponse> {
    let Json(request) = payload.map_err(|e| AppError::invalid_input(e.body_text()))?;

    request
        .validate()
        .map_err(|e| AppError::invalid_input(e.to_string()))?;

    let result = state.resolver.resolve(&request.question).await?;

    Ok(ChatResponse {
        source: result.source_label(),
        provenance: Provenance {
            tier: result.source(),
            confidence: result.confidence(),
            local_confidence: result.local_confidence(),
        },
        answer: result.into_answer(),
        status: "success".to_string(),
    })
}
