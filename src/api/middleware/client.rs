//! Caller identity and request-key extractors

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::api::types::ApiError;

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Best-effort caller address
///
/// First entry of `x-forwarded-for`, else `x-real-ip`, else `"unknown"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(client_ip_from_headers(&parts.headers)))
    }
}

fn client_ip_from_headers(headers: &HeaderMap) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    header_value("x-forwarded-for")
        .and_then(|list| list.split(',').next().map(|ip| ip.trim().to_string()))
        .filter(|ip| !ip.is_empty())
        .or_else(|| header_value("x-real-ip").map(|ip| ip.trim().to_string()))
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Optional `Idempotency-Key` header
#[derive(Debug, Clone, Default)]
pub struct IdempotencyKey(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for IdempotencyKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(IDEMPOTENCY_KEY_HEADER) else {
            return Ok(IdempotencyKey(None));
        };

        let key = value
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid Idempotency-Key header encoding"))?
            .trim();

        Ok(IdempotencyKey(
            (!key.is_empty()).then(|| key.to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, value.parse().unwrap());
        }
        headers
    }

    #[test]
    fn test_forwarded_for_uses_first_entry() {
        let h = headers(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "10.0.0.2"),
        ]);
        assert_eq!(client_ip_from_headers(&h), "203.0.113.7");
    }

    #[test]
    fn test_real_ip_fallback() {
        let h = headers(&[("x-real-ip", "198.51.100.4")]);
        assert_eq!(client_ip_from_headers(&h), "198.51.100.4");
    }

    #[test]
    fn test_unknown_when_no_headers() {
        assert_eq!(client_ip_from_headers(&HeaderMap::new()), "unknown");
    }

    #[tokio::test]
    async fn test_idempotency_key_is_trimmed_and_optional() {
        let request = axum::http::Request::builder()
            .header("Idempotency-Key", "  abc123 ")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        let IdempotencyKey(key) = IdempotencyKey::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(key.as_deref(), Some("abc123"));

        let request = axum::http::Request::builder().body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        let IdempotencyKey(key) = IdempotencyKey::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(key, None);
    }
}
