//! # Authentication Middleware
//!
//! Bearer token middleware that turns credentials into an [`Actor`].
//!
//! ## Token Format
//!
//! ```text
//! Bearer {role}:{user_id}:{secret}
//! ```
//!
//! `role` is `admin` or `user`; `secret` must equal the configured shared
//! secret. An optional `X-User-Name` header supplies the display name
//! recorded as `USER_NAME` on new entries.
//!
//! ## Caller
//!
//! Every authenticated request gets an [`Actor`] injected into the request
//! extensions. Handlers extract it through [`Caller`].

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ipr_core::{policy, Actor, Role};
use subtle::ConstantTimeEq;

use crate::error::{AppError, ErrorBody, ErrorDetail};

/// Header carrying the caller's display name.
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Identity used for every request while authentication is disabled.
pub const DEV_ACTOR_ID: &str = "dev";

// ── Caller ──────────────────────────────────────────────────────────────────

/// The authenticated [`Actor`], extracted from request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub Actor);

/// Extracts the actor that the auth middleware injected.
/// Returns 401 if none is present (middleware didn't run or failed).
#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .map(Caller)
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Constant-time comparison of bearer secrets.
///
/// When lengths differ, performs a dummy comparison so timing does not
/// depend on where the mismatch is.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token of the form `{role}:{user_id}:{secret}`.
pub fn parse_bearer_token(provided: &str, expected_secret: &str) -> Result<Actor, String> {
    let parts: Vec<&str> = provided.splitn(3, ':').collect();
    let [role_str, user_id, secret] = parts.as_slice() else {
        return Err("invalid token format, expected {role}:{user_id}:{secret}".into());
    };

    if !constant_time_token_eq(secret, expected_secret) {
        return Err("invalid bearer token".into());
    }

    let role: Role = role_str
        .parse()
        .map_err(|_| format!("unknown role: {role_str}"))?;

    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err("user_id must not be empty".into());
    }

    Ok(Actor::new(user_id, role))
}

/// Attach the display name from `X-User-Name`, if present and non-blank.
fn with_display_name(actor: Actor, request: &Request) -> Actor {
    let name = request
        .headers()
        .get(USER_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(policy::sanitize)
        .filter(|n| !n.is_empty());
    match name {
        Some(name) => actor.with_name(name),
        None => actor,
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Validate the Bearer token and inject the resulting [`Actor`].
///
/// When `AuthConfig.token` is `None`, every request runs as an admin
/// (auth disabled / development mode).
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected_token = request.extensions().get::<AuthConfig>().cloned();

    let actor = match expected_token {
        Some(AuthConfig {
            token: Some(ref expected),
        }) => {
            let auth_header = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());

            match auth_header {
                Some(header_value) if header_value.starts_with("Bearer ") => {
                    match parse_bearer_token(&header_value[7..], expected) {
                        Ok(actor) => actor,
                        Err(msg) => {
                            tracing::warn!(reason = %msg, "authentication failed: invalid bearer token");
                            return unauthorized_response(&msg);
                        }
                    }
                }
                Some(_) => {
                    tracing::warn!("authentication failed: non-Bearer authorization scheme");
                    return unauthorized_response("authorization header must use Bearer scheme");
                }
                None => {
                    tracing::warn!("authentication failed: missing authorization header");
                    return unauthorized_response("missing authorization header");
                }
            }
        }
        _ => Actor::new(DEV_ACTOR_ID, Role::Admin),
    };

    let actor = with_display_name(actor, &request);
    request.extensions_mut().insert(actor);
    next.run(request).await
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
