use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// GET /api/health — liveness plus whether a panel is open.
pub async fn health(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "panel_open": app.panels.is_open().await,
    }))
}
