use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::{
    auth::{RequestContext, AUTH_COOKIES},
    config::{AppConfig, RuntimeMode},
    models::session::Session,
    provider::{Lookup, SessionProvider},
};

/// Process-wide switches that pick the fallback branch. Fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionPolicy {
    pub runtime_mode: RuntimeMode,
    pub demo_mode: bool,
    /// Any auth cookie on the request is enough for the demo session.
    pub legacy_cookie_session: bool,
}

impl SessionPolicy {
    pub fn demo_sessions_enabled(&self) -> bool {
        !self.runtime_mode.is_production() || self.demo_mode
    }
}

impl From<&AppConfig> for SessionPolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            runtime_mode: config.runtime_mode,
            demo_mode: config.demo_mode,
            legacy_cookie_session: config.legacy_cookie_session,
        }
    }
}

#[derive(Clone)]
pub struct SessionResolver {
    policy: SessionPolicy,
    provider: Arc<dyn SessionProvider>,
}

impl SessionResolver {
    pub fn new(policy: SessionPolicy, provider: Arc<dyn SessionProvider>) -> Self {
        Self { policy, provider }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub async fn resolve(&self, ctx: &RequestContext) -> Session {
        self.resolve_at(ctx, Utc::now()).await
    }

    pub async fn resolve_at(&self, ctx: &RequestContext, now: DateTime<Utc>) -> Session {
        let lookup = Lookup::from(self.provider.get_session(ctx).await);
        self.decide(lookup, &ctx.cookie_names(), now)
    }

    /// Branch table, first match wins:
    /// upstream session, legacy cookie rule, demo fallback, anonymous.
    /// A failed lookup is handled exactly like a missing session.
    pub fn decide(&self, lookup: Lookup, cookie_names: &[String], now: DateTime<Utc>) -> Session {
        match lookup {
            Lookup::Found(session) => return session,
            Lookup::NotFound => {}
            Lookup::Error(err) => {
                warn!("session lookup failed, falling back: {err}");
            }
        }

        if self.policy.legacy_cookie_session && has_auth_cookie(cookie_names) {
            debug!("auth cookie present, issuing demo session");
            return Session::demo(now);
        }

        if self.policy.demo_sessions_enabled() {
            return Session::demo(now);
        }

        Session::anonymous()
    }
}

fn has_auth_cookie(cookie_names: &[String]) -> bool {
    cookie_names
        .iter()
        .any(|name| AUTH_COOKIES.contains(&name.as_str()))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::{
        error::ProviderError,
        models::{
            session::DEMO_SESSION_TTL_MS,
            user::{SessionUser, DEMO_USER_EMAIL, DEMO_USER_ID},
        },
        provider::{NoSessionProvider, SealedCookieProvider},
    };

    enum Upstream {
        Returns(Session),
        Empty,
        Fails,
    }

    struct StubProvider {
        upstream: Upstream,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(upstream: Upstream) -> Arc<Self> {
            Arc::new(Self {
                upstream,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SessionProvider for StubProvider {
        async fn get_session(
            &self,
            _ctx: &RequestContext,
        ) -> Result<Option<Session>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.upstream {
                Upstream::Returns(session) => Ok(Some(session.clone())),
                Upstream::Empty => Ok(None),
                Upstream::Fails => Err(ProviderError::Unavailable("auth backend down".into())),
            }
        }
    }

    fn policy(runtime_mode: RuntimeMode, demo_mode: bool) -> SessionPolicy {
        SessionPolicy {
            runtime_mode,
            demo_mode,
            legacy_cookie_session: false,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 8, 30, 0).unwrap()
    }

    fn real_session() -> Session {
        Session::authenticated(
            SessionUser {
                id: "user-7".into(),
                name: None,
                email: "estimator@constructflow.test".into(),
                image: Some("https://img.test/u7.png".into()),
                organization_id: "org-3".into(),
            },
            now() + Duration::hours(4),
        )
    }

    #[tokio::test]
    async fn upstream_session_wins_in_every_mode() {
        for (mode, demo) in [
            (RuntimeMode::Production, false),
            (RuntimeMode::Production, true),
            (RuntimeMode::NonProduction, false),
        ] {
            let provider = StubProvider::new(Upstream::Returns(real_session()));
            let resolver = SessionResolver::new(policy(mode, demo), provider.clone());
            let session = resolver.resolve_at(&RequestContext::default(), now()).await;
            assert_eq!(session, real_session());
            assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn failing_upstream_in_development_yields_demo_session() {
        let resolver = SessionResolver::new(
            policy(RuntimeMode::NonProduction, false),
            StubProvider::new(Upstream::Fails),
        );
        let session = resolver.resolve_at(&RequestContext::default(), now()).await;

        let user = session.user().expect("demo user");
        assert_eq!(user.id, DEMO_USER_ID);
        assert_eq!(user.email, DEMO_USER_EMAIL);
        assert_eq!(
            session.expires(),
            Some(now() + Duration::milliseconds(DEMO_SESSION_TTL_MS))
        );
    }

    #[tokio::test]
    async fn failing_and_empty_upstream_are_treated_alike() {
        for mode in [RuntimeMode::Production, RuntimeMode::NonProduction] {
            let failing = SessionResolver::new(policy(mode, false), StubProvider::new(Upstream::Fails));
            let empty = SessionResolver::new(policy(mode, false), StubProvider::new(Upstream::Empty));
            let ctx = RequestContext::default();
            assert_eq!(
                failing.resolve_at(&ctx, now()).await,
                empty.resolve_at(&ctx, now()).await
            );
        }
    }

    #[tokio::test]
    async fn production_without_demo_flag_is_anonymous() {
        let resolver = SessionResolver::new(
            policy(RuntimeMode::Production, false),
            Arc::new(NoSessionProvider),
        );
        let session = resolver.resolve_at(&RequestContext::default(), now()).await;
        assert_eq!(session, Session::anonymous());
        assert_eq!(
            serde_json::to_value(&session).unwrap(),
            serde_json::json!({ "user": null, "expires": null })
        );
    }

    #[tokio::test]
    async fn demo_flag_overrides_production() {
        let resolver = SessionResolver::new(
            policy(RuntimeMode::Production, true),
            StubProvider::new(Upstream::Fails),
        );
        let session = resolver.resolve_at(&RequestContext::default(), now()).await;
        assert_eq!(session, Session::demo(now()));
    }

    #[tokio::test]
    async fn demo_expiry_is_recomputed_per_call() {
        let resolver = SessionResolver::new(
            policy(RuntimeMode::NonProduction, false),
            Arc::new(NoSessionProvider),
        );
        let ctx = RequestContext::default();
        let first = resolver.resolve_at(&ctx, now()).await;
        let second = resolver.resolve_at(&ctx, now() + Duration::seconds(5)).await;

        assert_eq!(first.user(), second.user());
        assert_eq!(
            second.expires().unwrap() - first.expires().unwrap(),
            Duration::seconds(5)
        );
    }

    #[tokio::test]
    async fn resolve_uses_wall_clock_for_demo_expiry() {
        let resolver = SessionResolver::new(
            policy(RuntimeMode::NonProduction, false),
            Arc::new(NoSessionProvider),
        );
        let before = Utc::now();
        let session = resolver.resolve(&RequestContext::default()).await;
        let after = Utc::now();

        let ttl = Duration::milliseconds(DEMO_SESSION_TTL_MS);
        let expires = session.expires().unwrap();
        assert!(expires >= before + ttl);
        assert!(expires <= after + ttl);
    }

    #[test]
    fn legacy_cookie_rule_is_opt_in() {
        let names = vec!["next-auth.session-token".to_string()];

        let strict = SessionResolver::new(
            policy(RuntimeMode::Production, false),
            Arc::new(NoSessionProvider),
        );
        assert_eq!(
            strict.decide(Lookup::NotFound, &names, now()),
            Session::anonymous()
        );

        let legacy = SessionResolver::new(
            SessionPolicy {
                legacy_cookie_session: true,
                ..policy(RuntimeMode::Production, false)
            },
            Arc::new(NoSessionProvider),
        );
        assert_eq!(
            legacy.decide(Lookup::NotFound, &names, now()),
            Session::demo(now())
        );
        assert_eq!(
            legacy.decide(Lookup::NotFound, &["theme".to_string()], now()),
            Session::anonymous()
        );
    }

    #[tokio::test]
    async fn legacy_cookie_rule_ignores_empty_cookie_values() {
        let resolver = SessionResolver::new(
            SessionPolicy {
                legacy_cookie_session: true,
                ..policy(RuntimeMode::Production, false)
            },
            Arc::new(NoSessionProvider),
        );
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            axum::http::HeaderValue::from_static("pulse-auth-token=; next-auth.session-token="),
        );
        let session = resolver
            .resolve_at(&RequestContext::new(headers), now())
            .await;
        assert_eq!(session, Session::anonymous());
    }

    #[tokio::test]
    async fn malformed_sealed_cookie_falls_back_to_anonymous_in_production() {
        let resolver = SessionResolver::new(
            policy(RuntimeMode::Production, false),
            Arc::new(SealedCookieProvider::from_secret("secret")),
        );
        let sealed = crate::provider::tests::seal_raw(
            "secret",
            r#"{"user":{"id":"u1","email":"a@b.test","organizationId":"o1"}}"#,
        );
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            axum::http::HeaderValue::from_str(&format!("pulse-auth-token={sealed}")).unwrap(),
        );
        let session = resolver
            .resolve_at(&RequestContext::new(headers), now())
            .await;
        assert_eq!(session, Session::anonymous());
    }
}
