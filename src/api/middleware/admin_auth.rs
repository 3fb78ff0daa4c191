//! Admin authentication (HTTP Basic)

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, warn};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::infrastructure::api_key::constant_time_compare;

const ADMIN_REALM: &str = "Basic realm=\"Admin Area\"";

/// Configured admin credentials
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    username: String,
    password: Option<String>,
    /// Whether a missing password leaves the admin surface open
    open_without_password: bool,
}

impl AdminCredentials {
    pub fn new(
        username: impl Into<String>,
        password: Option<String>,
        open_without_password: bool,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.filter(|p| !p.is_empty()),
            open_without_password,
        }
    }

    /// Check a Basic `Authorization` header value
    fn verify(&self, headers: &HeaderMap) -> AdminCheck {
        let Some(password) = &self.password else {
            return if self.open_without_password {
                AdminCheck::Allowed(self.username.clone())
            } else {
                AdminCheck::Locked
            };
        };

        let Some((user, pass)) = parse_basic(headers) else {
            return AdminCheck::Denied;
        };

        // Both comparisons always run.
        let user_ok = constant_time_compare(&user, &self.username);
        let pass_ok = constant_time_compare(&pass, password);

        if user_ok & pass_ok {
            AdminCheck::Allowed(user)
        } else {
            AdminCheck::Denied
        }
    }
}

enum AdminCheck {
    Allowed(String),
    Denied,
    Locked,
}

fn parse_basic(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;

    Some((user.to_string(), pass.to_string()))
}

/// Extractor that requires admin credentials; holds the admin username
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub String);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match state.admin.verify(&parts.headers) {
            AdminCheck::Allowed(user) => {
                debug!(admin = %user, "Admin access granted");
                Ok(RequireAdmin(user))
            }
            AdminCheck::Denied => Err(challenge("Authentication required")),
            AdminCheck::Locked => {
                warn!("Admin request rejected: no admin password configured");
                Err(challenge("Admin access is not configured"))
            }
        }
    }
}

fn challenge(message: &str) -> Response {
    let mut response = ApiError::unauthorized(message).into_response();
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(ADMIN_REALM));
    response
}
