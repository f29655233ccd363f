//! Header surgery for the proxy path.
//!
//! Hop-by-hop headers (RFC 7230 §6.1) apply to a single transport
//! connection and must not cross the proxy in either direction. On top of
//! that, the forward path drops `Host` (reqwest derives it from the
//! upstream URL), `Content-Length` (recomputed from the forwarded body),
//! and `Cookie` (the upstream session's jar owns cookie state — a client
//! Cookie header would suppress jar injection and break clearance-cookie
//! accumulation).

use axum::http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};

use mg_domain::error::{Error, Result};

const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Build the header set for the forwarded upstream request.
///
/// Copies every client header except hop-by-hop, `Host`, `Content-Length`,
/// and `Cookie`; replaces `Authorization` with the model credential when
/// one is configured (otherwise the client's value passes through); and
/// sets `user_id_header` to the resolved id, overriding any client value.
pub fn build_forward_headers(
    client: &HeaderMap,
    credential: Option<&str>,
    user_id_header: &str,
    user_id: &str,
) -> Result<HeaderMap> {
    let mut out = HeaderMap::with_capacity(client.len() + 2);

    for (name, value) in client {
        if is_hop_by_hop(name) {
            continue;
        }
        match name.as_str() {
            "host" | "content-length" | "cookie" => continue,
            _ => {}
        }
        out.append(name.clone(), value.clone());
    }

    if let Some(key) = credential {
        let mut val = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| Error::Config(format!("invalid upstream credential: {e}")))?;
        val.set_sensitive(true);
        out.insert(AUTHORIZATION, val);
    }

    let id_name = HeaderName::from_bytes(user_id_header.as_bytes())
        .map_err(|e| Error::Config(format!("invalid user id header name: {e}")))?;
    let id_value = HeaderValue::from_str(user_id)
        .map_err(|e| Error::Other(format!("resolved user id is not header-safe: {e}")))?;
    out.insert(id_name, id_value);

    Ok(out)
}

/// Filter an upstream response's headers for the reply to the client.
///
/// Hop-by-hop headers are dropped; `Content-Length` is dropped and left
/// for the server to recompute from the actual body. `Content-Type` is
/// preserved — it is how clients distinguish streaming from JSON.
pub fn filter_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if is_hop_by_hop(name) || name.as_str() == "content-length" {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}
