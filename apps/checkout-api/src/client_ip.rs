//! Client IP extraction for the per-IP rate limit.
//!
//! Lookup order:
//! 1. `CF-Connecting-IP` (Cloudflare)
//! 2. first entry of `X-Forwarded-For`
//! 3. `X-Real-IP`
//! 4. the TCP peer address
//! 5. `"local"`

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;

/// Best-effort client address, used only as a rate-limit key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(ClientIp(resolve(&parts.headers, peer)))
    }
}

/// Applies the lookup order to a request's headers and peer address.
pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    };

    header_ip("cf-connecting-ip")
        .or_else(|| header_ip("x-forwarded-for"))
        .or_else(|| header_ip("x-real-ip"))
        .or_else(|| peer.map(|addr| addr.ip()))
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "local".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_header_precedence() {
        let h = headers(&[
            ("x-real-ip", "10.0.0.3"),
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("cf-connecting-ip", "198.51.100.2"),
        ]);
        assert_eq!(resolve(&h, None), "198.51.100.2");

        let h = headers(&[("x-real-ip", "10.0.0.3"), ("x-forwarded-for", "203.0.113.7, 10.0.0.1")]);
        assert_eq!(resolve(&h, None), "203.0.113.7");

        let h = headers(&[("x-real-ip", "10.0.0.3")]);
        assert_eq!(resolve(&h, None), "10.0.0.3");
    }

    #[test]
    fn test_fallbacks() {
        let peer: SocketAddr = "192.0.2.10:51234".parse().unwrap();
        assert_eq!(resolve(&HeaderMap::new(), Some(peer)), "192.0.2.10");
        assert_eq!(resolve(&HeaderMap::new(), None), "local");

        // Garbage headers are skipped, not trusted
        let h = headers(&[("x-forwarded-for", "not-an-ip")]);
        assert_eq!(resolve(&h, Some(peer)), "192.0.2.10");
    }
}
