//! Rate limiting for the login and signup endpoints.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Proxy headers consulted for the client address, most trusted first.
const CLIENT_IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-real-ip", "fly-client-ip"];

/// Keys requests by client IP as reported by the fronting proxy.
///
/// `X-Forwarded-For` is checked after `CF-Connecting-IP` and uses the first
/// address in the chain. Without proxy headers the peer address from
/// [`ConnectInfo`] is used, and requests with no address at all share the
/// unspecified-address bucket.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();
        let header_ip = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        };

        let ip = header_ip(CLIENT_IP_HEADERS[0])
            .or_else(|| header_ip("x-forwarded-for"))
            .or_else(|| CLIENT_IP_HEADERS[1..].iter().find_map(|name| header_ip(name)))
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        Ok(ip)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// About ten requests per minute per IP: one token every 6 seconds, burst of 5.
///
/// Returns `None` if governor refuses the configuration.
#[must_use]
pub fn auth_rate_limiter() -> Option<RateLimiterLayer> {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(6)
        .burst_size(5)
        .finish()?;
    Some(GovernorLayer::new(Arc::new(config)))
}
