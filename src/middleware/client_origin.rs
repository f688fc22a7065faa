// Request origin extraction
// Sessions are bound to this address and netblock authorization checks it

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use ipnetwork::IpNetwork;
use std::net::{IpAddr, SocketAddr};

use crate::app::AppState;
use crate::app_config::AppConfig;
use crate::utils::service_error::ServiceError;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Network origin of the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOrigin(pub IpAddr);

fn is_trusted(proxies: &[IpNetwork], ip: IpAddr) -> bool {
    proxies.iter().any(|block| block.contains(ip))
}

/// Walk `X-Forwarded-For` from the nearest hop outwards and return the first
/// address that is not one of our proxies.
///
/// Clients control everything left of the last proxy, so only hops appended by
/// trusted proxies are believed. An unparseable hop stops the walk.
pub fn forwarded_for(headers: &HeaderMap, proxies: &[IpNetwork]) -> Option<IpAddr> {
    let mut hops: Vec<&str> = Vec::new();
    for value in headers.get_all(FORWARDED_FOR) {
        hops.extend(value.to_str().ok()?.split(','));
    }

    let mut last_trusted = None;
    for hop in hops.iter().rev() {
        let ip: IpAddr = hop.trim().parse().ok()?;
        if !is_trusted(proxies, ip) {
            return Some(ip);
        }
        last_trusted = Some(ip);
    }

    last_trusted
}

/// Resolve the request origin from the connected peer and, when the peer is a
/// trusted proxy, its forwarding header
pub fn resolve_origin(config: &AppConfig, peer: IpAddr, headers: &HeaderMap) -> IpAddr {
    if !config.trust_forwarded_for || !is_trusted(&config.trusted_proxies, peer) {
        return peer;
    }

    forwarded_for(headers, &config.trusted_proxies).unwrap_or(peer)
}

impl FromRequestParts<AppState> for ClientOrigin {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or_else(|| {
                tracing::error!("No connect info on request; serve with connect info enabled");
                ServiceError::InternalError
            })?;

        Ok(ClientOrigin(resolve_origin(&state.config, peer, &parts.headers)))
    }
}
