//! Route handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::AppState;
use super::error::ApiError;
use super::retry::with_single_retry;
use crate::resilience::BreakerSnapshot;
use crate::telemetry;
use crate::types::RagRequest;
use crate::{AskError, Result};

/// `POST /api/rag`
///
/// Body: `{query, conversationId?, generation?}`. Answers `200` with the
/// normalized response, or an [`ApiError`] envelope.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RagRequest>, JsonRejection>,
) -> Response {
    let response = match answer(&state, payload).await {
        Ok(response) => response,
        Err(err) => {
            match &err {
                AskError::Validation { .. } => debug!(error = %err, "rejected request"),
                AskError::CircuitOpen { .. } => warn!(error = %err, "provider circuit open"),
                _ => warn!(error = %err, "rag request failed"),
            }
            ApiError::from(err).into_response()
        }
    };
    metrics::counter!(telemetry::HTTP_RESPONSES_TOTAL,
        "code" => response.status().as_u16().to_string(),
    )
    .increment(1);
    response
}

async fn answer(
    state: &AppState,
    payload: std::result::Result<Json<RagRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(|rejection| {
        debug!(%rejection, "unparseable body");
        AskError::bad_request("Invalid input")
    })?;
    request.validate()?;

    let client = &state.client;
    let limit = state.policy.request_timeout;
    let answer =
        with_single_retry(&state.policy, || client.ask_with_timeout(&request, limit)).await?;
    info!(
        sources = answer.sources.len(),
        continued = request.conversation_id.is_some(),
        "answered"
    );

    let mut response = Json(answer.as_ref()).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    provider: String,
    breaker: BreakerSnapshot,
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        provider: state.client.provider_name().to_string(),
        breaker: state.client.breaker().snapshot(),
    })
}
