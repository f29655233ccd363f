//! `/v1/models` — the model catalog.
//!
//! Serves the locally-configured logical names in the OpenAI list shape
//! by default. When `[models_endpoint].passthrough` names a model, the
//! request is mirrored from that model's upstream `/models` endpoint
//! instead, going through the same session pool and user-id header
//! injection as the chat path (but with no body to mutate).

use axum::body::Body;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use mg_sessions::from_reqwest;

use crate::api::error::ApiError;
use crate::headers::{build_forward_headers, filter_response_headers};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ModelList {
    object: &'static str,
    data: Vec<ModelItem>,
}

#[derive(Debug, Serialize)]
struct ModelItem {
    id: String,
    object: &'static str,
    created: i64,
    owned_by: &'static str,
}

pub async fn list_models(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match &state.config.models_endpoint.passthrough {
        Some(model) => passthrough(&state, model, &headers)
            .await
            .unwrap_or_else(IntoResponse::into_response),
        None => local_catalog(&state).into_response(),
    }
}

fn local_catalog(state: &AppState) -> Json<ModelList> {
    let created = chrono::Utc::now().timestamp();
    let data = state
        .models
        .names()
        .into_iter()
        .map(|id| ModelItem {
            id,
            object: "model",
            created,
            owned_by: "memgate",
        })
        .collect();

    Json(ModelList {
        object: "list",
        data,
    })
}

async fn passthrough(
    state: &AppState,
    model: &str,
    headers: &HeaderMap,
) -> Result<Response, ApiError> {
    // Validation guarantees the passthrough model exists.
    let entry = state
        .models
        .get(model)
        .ok_or_else(|| ApiError::model_not_found(model))?;

    let resolved = state.resolver.resolve(headers);
    let fwd_headers = build_forward_headers(
        headers,
        entry.api_key.as_deref(),
        &state.config.routing.user_id_header,
        &resolved.user_id,
    )
    .map_err(|e| ApiError::internal(state.config.server.debug, e.to_string()))?;

    let session = state
        .pool
        .get(entry.base_url())
        .map_err(|e| ApiError::internal(state.config.server.debug, e.to_string()))?;

    let resp = session
        .client()
        .get(session.url("/models"))
        .headers(fwd_headers)
        .send()
        .await
        .map_err(|e| {
            ApiError::from_upstream_error(&from_reqwest(e), state.config.server.debug)
        })?;

    let status = resp.status();
    let resp_headers = filter_response_headers(resp.headers());
    let bytes = resp.bytes().await.map_err(|e| {
        ApiError::from_upstream_error(&from_reqwest(e), state.config.server.debug)
    })?;

    Ok((status, resp_headers, Body::from(bytes)).into_response())
}
