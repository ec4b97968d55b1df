use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use std::convert::Infallible;
use std::net::SocketAddr;

pub const UNKNOWN_CLIENT: &str = "unknown";

/// Rate-limit bucket for the caller.
///
/// Uses the first address in `x-forwarded-for`, then `x-real-ip`, then the
/// peer address of the connection. Clients with none of these share the
/// `"unknown"` bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKey(pub String);

impl ClientKey {
    pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let forwarded = header_value(headers, "x-forwarded-for")
            .and_then(|v| v.split(',').next().map(str::trim).map(str::to_string))
            .filter(|v| !v.is_empty());

        let key = forwarded
            .or_else(|| header_value(headers, "x-real-ip"))
            .or_else(|| peer.map(|addr| addr.ip().to_string()))
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

        ClientKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for ClientKey
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(ClientKey::resolve(&parts.headers, peer))
    }
}
