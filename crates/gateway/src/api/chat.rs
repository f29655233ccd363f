//! `/v1/chat/completions` — the proxy path.
//!
//! Per request: read the body once, validate Content-Length, parse out
//! `model` / `messages` / `stream`, resolve the memory-routing user id,
//! optionally inject retrieved context, then forward over the upstream's
//! persistent session and mirror the response back. Streaming responses
//! are pumped chunk-by-chunk, byte-for-byte; nothing is buffered to
//! completion. Upstream non-2xx responses pass through verbatim.

use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use mg_domain::chat::ChatBody;
use mg_domain::error::Error;
use mg_domain::trace::TraceEvent;
use mg_sessions::from_reqwest;

use crate::api::error::ApiError;
use crate::headers::{build_forward_headers, filter_response_headers};
use crate::state::AppState;

/// Upper bound on buffered request bodies.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

pub async fn chat_completions(State(state): State<AppState>, req: Request) -> Response {
    proxy_chat(state, req)
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

async fn proxy_chat(state: AppState, req: Request) -> Result<Response, ApiError> {
    let (parts, body) = req.into_parts();

    // 1. Read the body fully. It is consumed here and never re-read.
    let body_bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| ApiError::request_too_large(MAX_BODY_BYTES))?;

    // 2. A Content-Length that disagrees with the bytes actually read
    //    means a broken client or a mutating intermediary; reject rather
    //    than silently corrupt the upstream call.
    validate_content_length(&parts.headers, body_bytes.len())?;

    // 3. Parse just enough JSON; unknown fields stay in the raw document.
    let chat = ChatBody::parse(&body_bytes).map_err(|e| match e {
        Error::Json(e) => ApiError::invalid_request("invalid_json", e.to_string()),
        other => ApiError::invalid_request("missing_field", other.to_string()),
    })?;

    // 4. Logical model lookup.
    let entry = state
        .models
        .get(&chat.model)
        .ok_or_else(|| ApiError::model_not_found(&chat.model))?;

    // 5. Memory-routing identity.
    let resolved = state.resolver.resolve(&parts.headers);

    let trace_id = uuid::Uuid::new_v4();
    tracing::debug!(
        trace_id = %trace_id,
        model = %chat.model,
        user_id = %resolved.user_id,
        stream = chat.stream,
        "proxying chat completion"
    );

    // 6. Optional context injection — degraded to a no-op on any failure
    //    inside the retriever.
    let messages = match &state.retriever {
        Some(retriever) => {
            retriever
                .maybe_inject(chat.messages.clone(), &resolved.user_id, &entry.config)
                .await
        }
        None => chat.messages.clone(),
    };

    // 7. Rebuild the forwarded body only when something changed; reuse the
    //    original bytes otherwise.
    let changed = messages != chat.messages || entry.upstream_model() != chat.model;
    let forward_body: Bytes = if changed {
        chat.rebuild(entry.upstream_model(), &messages)
            .map_err(|e| ApiError::internal(state.config.server.debug, e.to_string()))?
            .into()
    } else {
        body_bytes.clone()
    };

    // 8. Forwarded header set.
    let fwd_headers = build_forward_headers(
        &parts.headers,
        entry.api_key.as_deref(),
        &state.config.routing.user_id_header,
        &resolved.user_id,
    )
    .map_err(|e| ApiError::internal(state.config.server.debug, e.to_string()))?;

    // 9. Persistent session for this upstream.
    let session = state
        .pool
        .get(entry.base_url())
        .map_err(|e| ApiError::internal(state.config.server.debug, e.to_string()))?;

    // 10. Forward. No retries: a partial stream cannot be retried
    //     correctly, so failures surface to the client as-is.
    let url = session.url(forward_path(parts.uri.path()));
    let started = Instant::now();
    let result = session
        .client()
        .request(parts.method.clone(), url)
        .headers(fwd_headers)
        .body(forward_body)
        .send()
        .await;

    let upstream = match result {
        Ok(resp) => resp,
        Err(e) => {
            TraceEvent::UpstreamRequest {
                model: chat.model.clone(),
                base_url: entry.base_url().to_owned(),
                status: 0,
                duration_ms: started.elapsed().as_millis() as u64,
                streaming: chat.stream,
            }
            .emit();
            let e = from_reqwest(e);
            tracing::warn!(
                trace_id = %trace_id,
                model = %chat.model,
                error = %e,
                "upstream request failed"
            );
            return Err(ApiError::from_upstream_error(&e, state.config.server.debug));
        }
    };

    let status = upstream.status();
    let streaming = chat.stream || is_event_stream(upstream.headers());

    TraceEvent::UpstreamRequest {
        model: chat.model.clone(),
        base_url: entry.base_url().to_owned(),
        status: status.as_u16(),
        duration_ms: started.elapsed().as_millis() as u64,
        streaming,
    }
    .emit();

    // 11. Mirror the response. Status and headers go back verbatim (minus
    //     hop-by-hop) for 2xx and non-2xx alike.
    let resp_headers = filter_response_headers(upstream.headers());

    if streaming {
        // Byte pump: each upstream chunk is forwarded as it arrives, and
        // the client disconnecting drops the stream, which cancels the
        // upstream request.
        let body = Body::from_stream(upstream.bytes_stream());
        Ok((status, resp_headers, body).into_response())
    } else {
        let bytes = upstream.bytes().await.map_err(|e| {
            ApiError::from_upstream_error(&from_reqwest(e), state.config.server.debug)
        })?;
        Ok((status, resp_headers, Body::from(bytes)).into_response())
    }
}

/// Map the inbound path to the upstream path.
///
/// Configured base URLs already carry the API prefix
/// (`https://api.example.com/v1`), so the inbound `/v1` is dropped:
/// `/v1/chat/completions` forwards to `<base>/chat/completions`.
fn forward_path(path: &str) -> &str {
    path.strip_prefix("/v1").unwrap_or(path)
}

fn is_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/event-stream"))
}

/// Reject when a client-declared Content-Length disagrees with the bytes
/// read. An unparseable declaration counts as a mismatch.
fn validate_content_length(headers: &HeaderMap, actual: usize) -> Result<(), ApiError> {
    let Some(declared) = headers.get(CONTENT_LENGTH) else {
        return Ok(());
    };
    let declared = declared
        .to_str()
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| {
            ApiError::invalid_request(
                "content_length_mismatch",
                "Content-Length header is not a valid integer",
            )
        })?;

    if declared != actual as u64 {
        return Err(ApiError::content_length_mismatch(declared, actual));
    }
    Ok(())
}
