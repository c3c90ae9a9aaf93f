use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;

use crate::error::AppError;
use crate::panel::PANEL_HTML;
use crate::state::AppState;

/// POST /api/panel/open — create the panel, or reveal the one already open.
pub async fn open_panel(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let opened = app.panels.create_and_show().await?;
    Ok(Json(serde_json::json!({
        "id": opened.id,
        "created": opened.created,
    })))
}

/// POST /api/panel/message — a webview message for the router.
///
/// Handling is asynchronous; results arrive on the event stream.
pub async fn post_message(
    State(app): State<AppState>,
    Json(message): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    if !message.is_object() {
        return Err(AppError::bad_request("message must be a JSON object"));
    }
    if !app.web.deliver(message) {
        return Err(AppError::conflict("no panel is open"));
    }
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "accepted": true })),
    ))
}

/// POST /api/panel/close — dispose the panel.
pub async fn close_panel(State(app): State<AppState>) -> Json<serde_json::Value> {
    let closed = app.panels.close().await;
    Json(serde_json::json!({ "closed": closed }))
}

/// GET / — the panel page, as last rendered.
pub async fn panel_page(State(app): State<AppState>) -> Html<String> {
    Html(app.web.html().unwrap_or_else(|| PANEL_HTML.to_string()))
}
