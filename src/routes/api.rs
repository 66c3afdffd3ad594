use axum::{routing::get, Json, Router};

use crate::{auth::ApiCaller, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

async fn me(caller: ApiCaller) -> Json<ApiCaller> {
    Json(caller)
}
