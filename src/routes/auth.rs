use axum::{
    body::Bytes,
    extract::State,
    http::Method,
    response::Redirect,
    routing::{any, get},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    auth::{self, RequestContext},
    models::session::Session,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session", get(session).post(session))
        .route("/logout", get(logout_redirect).post(logout))
        .route("/_log", any(client_log))
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// Always answers 200; lookup failures degrade to the demo or anonymous session.
async fn session(State(state): State<AppState>, ctx: RequestContext) -> Json<Session> {
    Json(state.resolver.resolve(&ctx).await)
}

async fn logout(jar: CookieJar) -> (CookieJar, Json<Ack>) {
    info!("session cleared");
    (auth::clear_auth_cookies(jar), Ack::ok())
}

async fn logout_redirect(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    info!("session cleared, redirecting to {}", state.config.login_path);
    (
        auth::clear_auth_cookies(jar),
        Redirect::temporary(&state.config.login_path),
    )
}

async fn client_log(State(state): State<AppState>, method: Method, body: Bytes) -> Json<Ack> {
    if method == Method::POST && !state.config.runtime_mode.is_production() {
        debug!("client auth log: {}", String::from_utf8_lossy(&body));
    }
    Ack::ok()
}
