//! `/memory-routing/info` — the resolver's test oracle.
//!
//! Reports which user id *would* be assigned to a request without
//! forwarding anything: no upstream call, no body consumption, no side
//! effects.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use serde::Serialize;

use mg_sessions::{MatchKind, PatternMatch};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RoutingInfo {
    pub user_id: String,
    pub matched: MatchKind,
    pub matched_pattern: Option<PatternMatch>,
    pub custom_header_present: bool,
    pub is_default: bool,
}

pub async fn info(State(state): State<AppState>, headers: HeaderMap) -> Json<RoutingInfo> {
    let resolved = state.resolver.resolve(&headers);

    Json(RoutingInfo {
        is_default: resolved.matched == MatchKind::Default,
        user_id: resolved.user_id,
        matched: resolved.matched,
        matched_pattern: resolved.pattern,
        custom_header_present: resolved.custom_header_present,
    })
}
