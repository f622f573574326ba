use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{config::AppConfig, state::AppState};

pub const TOKEN_TTL: Duration = Duration::hours(24);

/// Deliberately opaque: callers only learn accept or reject.
#[derive(Debug, Error)]
#[error("invalid or expired token")]
pub struct InvalidToken;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub aud: Vec<String>,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    /// Service base URL, used as both issuer and audience.
    base_url: String,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn new(secret: &str, base_url: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            base_url: base_url.to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt.secret, &config.base_url)
    }

    pub fn issue(&self, user_id: i64) -> anyhow::Result<IssuedToken> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    pub fn issue_at(&self, user_id: i64, now: OffsetDateTime) -> anyhow::Result<IssuedToken> {
        let expires_at = now + TOKEN_TTL;
        let claims = Claims {
            sub: user_id.to_string(),
            iss: self.base_url.clone(),
            aud: vec![self.base_url.clone()],
            iat: now.unix_timestamp(),
            nbf: now.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id, "jwt signed");
        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<i64, InvalidToken> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Checks signature, issuer, audience and the `nbf..=exp` window against `now`.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<i64, InvalidToken> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(std::slice::from_ref(&self.base_url));
        validation.set_audience(std::slice::from_ref(&self.base_url));
        validation.set_required_spec_claims(&["sub", "iss", "aud", "nbf", "exp"]);
        // the time window is checked below against the caller's clock
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| {
                debug!(error = %e, "jwt rejected");
                InvalidToken
            })?
            .claims;

        let now = now.unix_timestamp();
        if now > claims.exp || now < claims.nbf {
            debug!(sub = %claims.sub, "jwt outside validity window");
            return Err(InvalidToken);
        }

        claims.sub.parse::<i64>().map_err(|_| InvalidToken)
    }
}
