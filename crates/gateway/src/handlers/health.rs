//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;
use crate::AppState;

#[derive(Serialize)]
pub struct IndexResponse {
    pub message: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub faq: FaqCheck,
    pub local_model: TierCheck,
    pub remote: TierCheck,
}

#[derive(Serialize)]
pub struct FaqCheck {
    pub status: String,
    pub records: usize,
    pub matcher: String,
}

#[derive(Serialize)]
pub struct TierCheck {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Service banner
pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "AnswerForge chatbot API is running!".to_string(),
        status: "success".to_string(),
    })
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// Readiness probe - reports the state of every tier.
///
/// The FAQ store and remote credential are checked at startup, so a
/// running gateway is always ready; the local tier may be disabled.
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let resolver = &state.resolver;

    let local_model = match resolver.local_model() {
        Some(model) => TierCheck {
            status: "enabled".to_string(),
            model: Some(model.to_string()),
        },
        None => TierCheck {
            status: "disabled".to_string(),
            model: None,
        },
    };

    Json(ReadyResponse {
        status: "ready".to_string(),
        version: answerforge_common::VERSION.to_string(),
        checks: HealthChecks {
            faq: FaqCheck {
                status: "up".to_string(),
                records: resolver.faq().len(),
                matcher: resolver.faq().matcher_name().to_string(),
            },
            local_model,
            remote: TierCheck {
                status: "configured".to_string(),
                model: Some(resolver.remote_model().to_string()),
            },
        },
    })
}
