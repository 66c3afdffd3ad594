use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::debug;

use crate::{
    auth::{ApiCaller, RequestContext},
    error::AppError,
    state::AppState,
};

/// API paths that carry their own authentication.
const UNGUARDED_PREFIXES: [&str; 2] = ["/api/auth/", "/api/simple-auth/"];

pub fn is_guarded(path: &str) -> bool {
    path.starts_with("/api/") && !UNGUARDED_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Attaches an [`ApiCaller`] to guarded API requests or rejects them.
pub async fn api_guard(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !is_guarded(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let ctx = RequestContext::new(request.headers().clone());
    let caller = match ctx.caller_token() {
        Some(token) => ApiCaller::Token { token },
        None if state.resolver.policy().demo_sessions_enabled() => ApiCaller::demo(),
        None => {
            debug!("rejecting {} without a token", request.uri().path());
            return Err(AppError::Unauthorized);
        }
    };

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

fn security_headers() -> [(HeaderName, HeaderValue); 5] {
    [
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block")),
        (
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ),
        (
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
        ),
    ]
}

/// Hardening headers sent on every response in production.
pub fn with_security_headers(router: Router) -> Router {
    security_headers()
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::overriding(name, value))
        })
}
