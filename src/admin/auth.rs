//! Static-credential login and Bearer-token guard.

use axum::Json;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::AdminState;
use super::error::{AdminError, AdminResult};
use crate::config::AdminAuthConfig;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Proof that the request carried the admin token. Add it as a handler
/// argument to protect the route.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<AdminState> for RequireAdmin {
    type Rejection = AdminError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AdminState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(&parts.headers) {
            Some(token) if token == state.auth.token.expose_secret() => Ok(RequireAdmin),
            Some(_) => {
                warn!(path = %parts.uri.path(), "Rejected admin request with wrong token");
                Err(AdminError::Unauthorized)
            }
            None => Err(AdminError::Unauthorized),
        }
    }
}

/// Token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn credentials_match(auth: &AdminAuthConfig, login: &str, password: &str) -> bool {
    login == auth.login && password == auth.password.expose_secret()
}

/// POST /auth/login
pub(super) async fn login(
    State(state): State<AdminState>,
    Json(body): Json<LoginRequest>,
) -> AdminResult<Json<LoginResponse>> {
    if !credentials_match(&state.auth, &body.login, &body.password) {
        warn!(login = %body.login, "Admin login failed");
        return Err(AdminError::InvalidCredentials);
    }
    info!(login = %body.login, "Admin logged in");
    Ok(Json(LoginResponse {
        token: state.auth.token.expose_secret().to_string(),
    }))
}
