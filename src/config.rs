use std::{str::FromStr, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => bail!("unknown APP_ENV {other:?}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
}

/// Static credential pair guarding the basic-auth routes.
#[derive(Debug, Clone, Deserialize)]
pub struct BasicAuthConfig {
    pub username: String,
    /// Argon2 PHC string. `None` rejects every basic-auth attempt.
    pub hashed_password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Public URL of this service; used as JWT issuer and audience.
    pub base_url: String,
    pub env: Environment,
    pub jwt: JwtConfig,
    pub basic_auth: BasicAuthConfig,
    pub pokeapi: UpstreamConfig,
    pub store_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;

        let secret = lookup("JWT_SECRET").context("JWT_SECRET is not set")?;
        if secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        let env = match lookup("APP_ENV") {
            Some(v) => v.parse()?,
            None => Environment::Development,
        };

        let basic_auth = BasicAuthConfig {
            username: lookup("BASIC_AUTH_USERNAME").unwrap_or_else(|| "admin".into()),
            hashed_password: lookup("BASIC_AUTH_HASHED_PASSWORD").filter(|v| !v.is_empty()),
        };

        let pokeapi = UpstreamConfig {
            base_url: lookup("POKEAPI_BASE_URL")
                .unwrap_or_else(|| "https://pokeapi.co/api/v2".into())
                .trim_end_matches('/')
                .to_string(),
            timeout: secs(&lookup, "UPSTREAM_TIMEOUT_SECS", 5)?,
        };

        Ok(Self {
            database_url,
            base_url: lookup("BASE_URL").unwrap_or_else(|| "http://localhost:4444".into()),
            env,
            jwt: JwtConfig { secret },
            basic_auth,
            pokeapi,
            store_timeout: secs(&lookup, "STORE_TIMEOUT_SECS", 3)?,
        })
    }

    pub fn is_development(&self) -> bool {
        self.env == Environment::Development
    }
}

fn secs<F>(lookup: &F, key: &str, default: u64) -> anyhow::Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let value = match lookup(key) {
        Some(v) => v
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds"))?,
        None => default,
    };
    Ok(Duration::from_secs(value))
}
