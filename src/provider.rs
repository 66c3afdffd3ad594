use async_trait::async_trait;
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha512};
use tracing::debug;

use crate::{
    auth::{RequestContext, PULSE_AUTH_COOKIE},
    error::ProviderError,
    models::session::Session,
};

/// Upstream "get session" capability.
///
/// `Ok(None)` means no session exists for the request; `Err` means the lookup
/// itself failed. Callers decide how to treat the two.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn get_session(&self, ctx: &RequestContext) -> Result<Option<Session>, ProviderError>;
}

/// Outcome of one upstream lookup.
#[derive(Debug)]
pub enum Lookup {
    Found(Session),
    NotFound,
    Error(ProviderError),
}

impl From<Result<Option<Session>, ProviderError>> for Lookup {
    fn from(result: Result<Option<Session>, ProviderError>) -> Self {
        match result {
            Ok(Some(session)) => Lookup::Found(session),
            Ok(None) => Lookup::NotFound,
            Err(err) => Lookup::Error(err),
        }
    }
}

/// Provider for setups with no upstream auth at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSessionProvider;

#[async_trait]
impl SessionProvider for NoSessionProvider {
    async fn get_session(&self, _ctx: &RequestContext) -> Result<Option<Session>, ProviderError> {
        Ok(None)
    }
}

pub fn cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(&digest[..])
}

/// Sessions sealed into the `pulse-auth-token` cookie with an encrypted,
/// authenticated value.
#[derive(Clone)]
pub struct SealedCookieProvider {
    key: Key,
}

impl SealedCookieProvider {
    pub fn new(key: Key) -> Self {
        Self { key }
    }

    pub fn from_secret(secret: &str) -> Self {
        Self::new(cookie_key(secret))
    }

    /// Builds the cookie that carries `session`.
    pub fn seal(&self, session: &Session) -> Result<Cookie<'static>, ProviderError> {
        let value = serde_json::to_string(session)?;
        let mut jar = cookie::CookieJar::new();
        jar.private_mut(&self.key).add(
            Cookie::build((PULSE_AUTH_COOKIE, value))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build(),
        );
        jar.get(PULSE_AUTH_COOKIE)
            .cloned()
            .ok_or_else(|| ProviderError::Unavailable("sealed cookie missing from jar".into()))
    }

    pub fn lookup_at(
        &self,
        ctx: &RequestContext,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, ProviderError> {
        let present = ctx
            .cookies()
            .get(PULSE_AUTH_COOKIE)
            .is_some_and(|cookie| !cookie.value().is_empty());
        if !present {
            return Ok(None);
        }

        let jar = PrivateCookieJar::from_headers(ctx.headers(), self.key.clone());
        let cookie = jar.get(PULSE_AUTH_COOKIE).ok_or(ProviderError::Tampered)?;
        let session: Session = serde_json::from_str(cookie.value())?;

        if !session.is_authenticated() {
            return Ok(None);
        }
        if session.is_expired_at(now) {
            debug!("sealed session expired at {:?}", session.expires());
            return Ok(None);
        }
        Ok(Some(session))
    }
}

#[async_trait]
impl SessionProvider for SealedCookieProvider {
    async fn get_session(&self, ctx: &RequestContext) -> Result<Option<Session>, ProviderError> {
        self.lookup_at(ctx, Utc::now())
    }
}
