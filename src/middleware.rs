use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, HeaderName, Method, header, request::Parts},
};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tower_http::cors::{Any, CorsLayer};

use crate::{models::UNKNOWN_IP, state::AppState};

/// Caller address. The socket peer unless `trust_proxy` is set, in which
/// case the right-most `X-Forwarded-For` hop (the one our proxy appended),
/// then `X-Real-IP`. Falls back to "unknown".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        let ip = if state.config.trust_proxy {
            forwarded_ip(&parts.headers)
                .or_else(|| header_value(&parts.headers, "x-real-ip"))
                .or(peer)
        } else {
            peer
        };

        Ok(ClientIp(ip.unwrap_or_else(|| UNKNOWN_IP.to_string())))
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// Clients can prepend anything; only the last hop is written by the proxy.
fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    header_value(headers, "x-forwarded-for")?
        .rsplit(',')
        .map(str::trim)
        .find(|hop| !hop.is_empty())
        .map(str::to_string)
}

// Public API: any origin, no credentials.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-api-key"),
            HeaderName::from_static("x-amz-date"),
            HeaderName::from_static("x-amz-security-token"),
        ])
        .max_age(Duration::from_secs(3600))
}
