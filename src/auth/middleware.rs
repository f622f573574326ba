//! Per-request authentication and the route gates built on it.
//!
//! [`authenticate`] runs for every request and never rejects: it only decides
//! which [`Identity`] the request carries. The `require_*` gates are layered
//! onto route groups and reject before the handler runs.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, warn};

use super::{password::verify_password_blocking, repo_types::User};
use crate::{error::AppError, state::AppState};

/// Who the current request acts as. Recomputed from scratch on every request.
#[derive(Debug, Clone, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    User(User),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Anonymous,
    Authenticated,
    AuthenticatedAdmin,
}

impl Identity {
    pub fn level(&self) -> AccessLevel {
        match self {
            Identity::Anonymous => AccessLevel::Anonymous,
            Identity::User(u) if u.is_admin => AccessLevel::AuthenticatedAdmin,
            Identity::User(_) => AccessLevel::Authenticated,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::User(u) => Some(u),
            Identity::Anonymous => None,
        }
    }
}

fn access_level(req: &Request) -> AccessLevel {
    req.extensions()
        .get::<Identity>()
        .map(Identity::level)
        .unwrap_or(AccessLevel::Anonymous)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub async fn resolve_identity(state: &AppState, headers: &HeaderMap) -> Identity {
    let Some(token) = bearer_token(headers) else {
        return Identity::Anonymous;
    };

    let user_id = match state.jwt.verify(token) {
        Ok(id) => id,
        Err(e) => {
            debug!(error = %e, "bearer token rejected");
            return Identity::Anonymous;
        }
    };

    match state.users.find_by_id(user_id).await {
        Ok(Some(user)) => Identity::User(user),
        Ok(None) => {
            warn!(user_id, "token subject no longer exists");
            Identity::Anonymous
        }
        Err(e) => {
            warn!(error = %e, user_id, "user lookup failed during authentication");
            Identity::Anonymous
        }
    }
}

pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let identity = resolve_identity(&state, req.headers()).await;
    req.extensions_mut().insert(identity);
    next.run(req).await
}

pub async fn require_authenticated_user(req: Request, next: Next) -> Result<Response, AppError> {
    match access_level(&req) {
        AccessLevel::Anonymous => Err(AppError::Unauthorized),
        _ => Ok(next.run(req).await),
    }
}

/// Re-checks authentication itself, so it is safe without
/// [`require_authenticated_user`] in front of it.
pub async fn require_admin_user(req: Request, next: Next) -> Result<Response, AppError> {
    match access_level(&req) {
        AccessLevel::Anonymous => Err(AppError::Unauthorized),
        AccessLevel::Authenticated => Err(AppError::Forbidden),
        AccessLevel::AuthenticatedAdmin => Ok(next.run(req).await),
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

pub fn parse_basic_auth(headers: &HeaderMap) -> Option<BasicCredentials> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Static credential check, independent of the bearer-token identity.
pub async fn require_basic_authentication(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(creds) = parse_basic_auth(req.headers()) else {
        return Err(AppError::BasicAuthRequired);
    };

    let cfg = &state.config.basic_auth;
    let Some(hash) = cfg.hashed_password.clone() else {
        warn!("basic auth attempted but BASIC_AUTH_HASHED_PASSWORD is not configured");
        return Err(AppError::BasicAuthRequired);
    };

    if creds.username != cfg.username {
        debug!("basic auth username mismatch");
        return Err(AppError::BasicAuthRequired);
    }

    if !verify_password_blocking(creds.password, hash).await? {
        debug!("basic auth password mismatch");
        return Err(AppError::BasicAuthRequired);
    }

    Ok(next.run(req).await)
}
