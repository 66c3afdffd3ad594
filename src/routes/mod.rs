pub mod api;
pub mod auth;

use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

use crate::{
    middleware::{api_guard, with_security_headers},
    state::AppState,
};

pub fn create_router(state: AppState) -> Router {
    let production = state.config.runtime_mode.is_production();

    let router = Router::new()
        .nest("/api/auth", auth::router())
        .nest("/api", api::router())
        .layer(middleware::from_fn_with_state(state.clone(), api_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if production {
        with_security_headers(router)
    } else {
        router
    }
}
