use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Serialize;

use crate::error::AppError;

pub const PULSE_AUTH_COOKIE: &str = "pulse-auth-token";
pub const NEXT_AUTH_COOKIE: &str = "next-auth.session-token";
pub const SECURE_NEXT_AUTH_COOKIE: &str = "__Secure-next-auth.session-token";

/// Every cookie that can carry a session; logout clears all of them.
pub const AUTH_COOKIES: [&str; 3] = [PULSE_AUTH_COOKIE, NEXT_AUTH_COOKIE, SECURE_NEXT_AUTH_COOKIE];

pub const DEMO_CALLER_USER_ID: &str = "demo-user";
pub const DEMO_CALLER_ORGANIZATION_ID: &str = "demo-org";

/// What the session machinery gets to see of an inbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    headers: HeaderMap,
}

impl RequestContext {
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn cookies(&self) -> CookieJar {
        CookieJar::from_headers(&self.headers)
    }

    /// Names of the cookies that carry a non-empty value.
    pub fn cookie_names(&self) -> Vec<String> {
        self.cookies()
            .iter()
            .filter(|cookie| !cookie.value().is_empty())
            .map(|cookie| cookie.name().to_owned())
            .collect()
    }

    pub fn bearer_token(&self) -> Option<String> {
        self.headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_owned)
    }

    /// Cookie token first, then the `Authorization` header.
    pub fn caller_token(&self) -> Option<String> {
        self.cookies()
            .get(PULSE_AUTH_COOKIE)
            .map(|cookie| cookie.value().to_owned())
            .filter(|token| !token.is_empty())
            .or_else(|| self.bearer_token())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::new(parts.headers.clone()))
    }
}

/// Identity attached to guarded API requests by the API guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ApiCaller {
    Token {
        #[serde(skip)]
        token: String,
    },
    #[serde(rename_all = "camelCase")]
    Demo {
        user_id: String,
        organization_id: String,
    },
}

impl ApiCaller {
    pub fn demo() -> Self {
        ApiCaller::Demo {
            user_id: DEMO_CALLER_USER_ID.into(),
            organization_id: DEMO_CALLER_ORGANIZATION_ID.into(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ApiCaller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ApiCaller>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Emits a removal for every auth cookie, present on the request or not.
pub fn clear_auth_cookies(jar: CookieJar) -> CookieJar {
    AUTH_COOKIES
        .iter()
        .fold(jar, |jar, name| jar.add(removal_cookie(name)))
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, ""))
        .path("/")
        .secure(name.starts_with("__Secure-"))
        .build();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn context(cookie: Option<&str>, authorization: Option<&str>) -> RequestContext {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = cookie {
            headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        if let Some(auth) = authorization {
            headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        }
        RequestContext::new(headers)
    }

    #[test]
    fn lists_cookie_names() {
        let ctx = context(Some("theme=dark; next-auth.session-token=abc"), None);
        let mut names = ctx.cookie_names();
        names.sort();
        assert_eq!(names, vec!["next-auth.session-token", "theme"]);
    }

    #[test]
    fn empty_cookies_are_not_listed() {
        let ctx = context(Some("pulse-auth-token=; theme=dark"), None);
        assert_eq!(ctx.cookie_names(), vec!["theme"]);
    }

    #[test]
    fn caller_token_prefers_cookie_over_header() {
        let ctx = context(Some("pulse-auth-token=from-cookie"), Some("Bearer from-header"));
        assert_eq!(ctx.caller_token().as_deref(), Some("from-cookie"));

        let ctx = context(None, Some("Bearer from-header"));
        assert_eq!(ctx.caller_token().as_deref(), Some("from-header"));

        assert_eq!(context(None, Some("Basic abc")).caller_token(), None);
        assert_eq!(context(None, Some("Bearer   ")).caller_token(), None);
    }

    #[test]
    fn clearing_removes_every_auth_cookie_even_when_absent() {
        let jar = clear_auth_cookies(CookieJar::new());
        for name in AUTH_COOKIES {
            let cookie = jar.get(name).expect("removal cookie");
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.max_age().map(|age| age.whole_seconds()), Some(0));
            assert_eq!(cookie.path(), Some("/"));
        }
        assert_eq!(
            jar.get(SECURE_NEXT_AUTH_COOKIE).and_then(|c| c.secure()),
            Some(true)
        );
    }
}
