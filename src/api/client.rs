//! Client identification for rate limiting.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};

use crate::api::handlers::AppState;

/// Identifier used when no address is available.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Best-effort identity of the caller.
///
/// The socket peer address, unless the state trusts `X-Forwarded-For`, in
/// which case a parseable first hop takes precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

/// First `X-Forwarded-For` hop, if it is an IP address.
fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Resolves the caller identity from request parts.
pub fn resolve_client_id(parts: &Parts, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        if let Some(ip) = forwarded_for(&parts.headers) {
            return ip.to_string();
        }
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for ClientId {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(ClientId(resolve_client_id(parts, state.trust_forwarded_for)))
    }
}
