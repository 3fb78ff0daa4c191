//! API key authentication extractor

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::api_key::AuthenticatedKey;

/// Extractor that requires a valid, active API key
///
/// The key is read from either:
/// - Authorization header: `Bearer <api_key>`
/// - X-API-Key header: `<api_key>`
///
/// Missing, unknown and inactive keys all produce the same 401.
#[derive(Debug, Clone)]
pub struct RequireApiKey(pub AuthenticatedKey);

impl FromRequestParts<AppState> for RequireApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = extract_api_key_from_headers(&parts.headers);

        let key = state.orchestrator.authenticate(presented.as_deref()).await?;
        debug!(key_id = %key.id, "API key accepted");

        Ok(RequireApiKey(key))
    }
}

fn extract_api_key_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    bearer.or_else(|| {
        headers
            .get("x-api-key")
            .and_then(|value| value.to_str().ok())
            .map(|key| key.trim().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer blog_test".parse().unwrap());

        assert_eq!(
            extract_api_key_from_headers(&headers).as_deref(),
            Some("blog_test")
        );
    }

    #[test]
    fn test_extract_x_api_key() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", " blog_other ".parse().unwrap());

        assert_eq!(
            extract_api_key_from_headers(&headers).as_deref(),
            Some("blog_other")
        );
    }

    #[test]
    fn test_bearer_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer blog_bearer".parse().unwrap());
        headers.insert("x-api-key", "blog_header".parse().unwrap());

        assert_eq!(
            extract_api_key_from_headers(&headers).as_deref(),
            Some("blog_bearer")
        );
    }

    #[test]
    fn test_other_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());

        assert_eq!(extract_api_key_from_headers(&headers), None);
        assert_eq!(extract_api_key_from_headers(&HeaderMap::new()), None);
    }
}
