use crate::core::error::AccountError;
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::net::SocketAddr;

pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Address a request is identified by.
///
/// The first entry of `X-Forwarded-For` wins; without that header the direct
/// peer address is used. Unix socket connections carry no peer address, so
/// behind such a listener the proxy header is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = AccountError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        resolve_client_ip(&parts.headers, peer)
            .map(ClientIp)
            .ok_or(AccountError::UnknownClient)
    }
}

pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<String>) -> Option<String> {
    match headers.get(FORWARDED_FOR) {
        Some(value) => {
            let value = String::from_utf8_lossy(value.as_bytes());
            let first = value.split(',').next().unwrap_or("").trim();
            Some(first.to_string())
        }
        None => peer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_first_forwarded_entry_wins() {
        let headers = headers_with("203.0.113.7, 10.0.0.1, 10.0.0.2");
        let ip = resolve_client_ip(&headers, Some("127.0.0.1".to_string()));
        assert_eq!(ip.as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_forwarded_entry_is_trimmed() {
        let headers = headers_with("   2001:db8::1   ");
        let ip = resolve_client_ip(&headers, None);
        assert_eq!(ip.as_deref(), Some("2001:db8::1"));
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let ip = resolve_client_ip(&HeaderMap::new(), Some("192.168.1.20".to_string()));
        assert_eq!(ip.as_deref(), Some("192.168.1.20"));
    }

    #[test]
    fn test_no_header_and_no_peer() {
        assert_eq!(resolve_client_ip(&HeaderMap::new(), None), None);
    }

    #[tokio::test]
    async fn test_extractor_uses_connect_info() {
        let mut request = Request::builder().uri("/login").body(()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([198, 51, 100, 4], 40000))));
        let (mut parts, _) = request.into_parts();

        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ip, "198.51.100.4");
    }

    #[tokio::test]
    async fn test_extractor_rejects_anonymous_connection() {
        let request = Request::builder().uri("/login").body(()).unwrap();
        let (mut parts, _) = request.into_parts();

        let result = ClientIp::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AccountError::UnknownClient)));
    }
}
