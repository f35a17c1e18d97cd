use std::str::FromStr;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use uuid::Uuid;

use crate::error::AppError;

pub const SESSION_COOKIE: &str = "session_id";
pub static SESSION_HEADER: HeaderName = HeaderName::from_static("session-id");

/// Where the session token travels. Chosen once per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTransport {
    /// `Authorization: Bearer <token>` in, `session-id` response header out.
    Bearer,
    /// `session_id` cookie both ways.
    Cookie,
}

impl FromStr for TokenTransport {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bearer" | "header" => Ok(Self::Bearer),
            "cookie" => Ok(Self::Cookie),
            other => anyhow::bail!("unknown token transport {other:?} (expected bearer or cookie)"),
        }
    }
}

impl TokenTransport {
    /// Raw session token carried by the request, if any.
    pub fn extract(&self, headers: &HeaderMap) -> Option<String> {
        let token = match self {
            Self::Bearer => {
                let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
                value
                    .strip_prefix("Bearer ")
                    .or_else(|| value.strip_prefix("bearer "))?
                    .trim()
                    .to_string()
            }
            Self::Cookie => CookieJar::from_headers(headers)
                .get(SESSION_COOKIE)?
                .value()
                .to_string(),
        };
        (!token.is_empty()).then_some(token)
    }

    /// Response headers handing `token` to the client.
    pub fn issue(&self, token: &str) -> Result<HeaderMap, AppError> {
        let mut headers = HeaderMap::new();
        match self {
            Self::Bearer => {
                headers.insert(SESSION_HEADER.clone(), header_value(token)?);
            }
            Self::Cookie => {
                let cookie = Cookie::build((SESSION_COOKIE, token.to_string()))
                    .http_only(true)
                    .path("/")
                    .build();
                headers.insert(header::SET_COOKIE, header_value(&cookie.to_string())?);
            }
        }
        Ok(headers)
    }

    /// Response headers telling the client to drop its token.
    pub fn clear(&self) -> Result<HeaderMap, AppError> {
        let mut headers = HeaderMap::new();
        if let Self::Cookie = self {
            let mut cookie = Cookie::build((SESSION_COOKIE, ""))
                .http_only(true)
                .path("/")
                .build();
            cookie.make_removal();
            headers.insert(header::SET_COOKIE, header_value(&cookie.to_string())?);
        }
        Ok(headers)
    }
}

fn header_value(s: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(s).map_err(|e| AppError::Storage(e.into()))
}

/// Resolved per-request identity, attached by the request gate.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub token: Option<String>,
    pub user_id: Option<Uuid>,
}

fn identity(parts: &Parts) -> Identity {
    parts.extensions.get::<Identity>().cloned().unwrap_or_default()
}

/// Authenticated user; rejects with 401 when the request has no live session.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity(parts)
            .user_id
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Identity for endpoints that also serve anonymous callers.
pub struct MaybeUser(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(identity(parts).user_id))
    }
}

/// The raw token the request carried, live or not.
pub struct SessionToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity(parts)
            .token
            .map(SessionToken)
            .ok_or(AppError::Unauthorized)
    }
}
