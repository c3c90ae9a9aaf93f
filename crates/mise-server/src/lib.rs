pub mod context;
pub mod error;
pub mod handlers;
pub mod host;
pub mod panel;
pub mod protocol;
pub mod router;
pub mod routes;
pub mod secrets;
pub mod state;
pub mod web;

#[cfg(test)]
mod test_support;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router for the web panel host.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::panel::panel_page))
        .route("/api/health", get(routes::health::health))
        // Panel
        .route("/api/panel/open", post(routes::panel::open_panel))
        .route("/api/panel/message", post(routes::panel::post_message))
        .route("/api/panel/close", post(routes::panel::close_panel))
        .route("/api/panel/events", get(routes::events::panel_events))
        // Workspace
        .route("/api/config", get(routes::config::get_config))
        .route("/api/manifest", get(routes::manifest::get_manifest))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the panel server on `0.0.0.0:<port>`.
pub async fn serve(app_state: AppState, port: u16, open_browser: bool) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(app_state, listener, open_browser).await
}

/// Start the panel server on a pre-bound listener.
///
/// Lets the caller read the actual port first when binding port 0.
pub async fn serve_on(
    app_state: AppState,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(app_state);

    tracing::info!("mise panel listening on http://localhost:{actual_port}");

    if open_browser {
        let url = format!("http://localhost:{actual_port}");
        let _ = open::that(&url);
    }

    axum::serve(listener, app).await?;
    Ok(())
}
