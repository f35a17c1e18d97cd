use std::net::SocketAddr;

use anyhow::Context;
use axum::http::HeaderValue;

use crate::auth::extractors::TokenTransport;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub ttl_days: i64,
    /// Seconds between expired-session sweeps; `0` turns the sweeper off.
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub token_transport: TokenTransport,
    pub session: SessionConfig,
    pub request_timeout_secs: u64,
    /// Single origin allowed by CORS, credentials included.
    pub trusted_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let token_transport = match lookup("TOKEN_TRANSPORT") {
            Some(v) => v.parse::<TokenTransport>()?,
            None => TokenTransport::Bearer,
        };

        let trusted_url = lookup("TRUSTED_URL").unwrap_or_else(|| "http://localhost:3000".into());
        HeaderValue::from_str(&trusted_url).context("TRUSTED_URL is not a valid origin")?;

        Ok(Self {
            database_url,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10),
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "APP_PORT", 8080),
            token_transport,
            session: SessionConfig {
                ttl_days: parse_or(&lookup, "SESSION_TTL_DAYS", 14),
                sweep_interval_secs: parse_or(&lookup, "SESSION_SWEEP_INTERVAL_SECS", 60 * 60),
            },
            request_timeout_secs: parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30),
            trusted_url,
        })
    }

    pub fn session_ttl(&self) -> time::Duration {
        time::Duration::days(self.session.ttl_days)
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
